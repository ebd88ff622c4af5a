use std::path::Path;
use std::time::{Duration, Instant};

use orbitview_common::{ColorBuffer, Mesh, MeshError, ShadingMode};
use orbitview_input::Action;
use orbitview_render::{CameraError, OrbitCamera, RenderError, Renderer, SoftwareRenderer};
use orbitview_schedule::{ScheduleDecision, ScheduleError, StepScheduler};

use crate::config::ViewerConfig;
use crate::log::TrainLog;
use crate::seed::{MeshSeeds, SeedSequence};
use crate::state::FrameState;
use crate::summary::ViewerSummary;
use crate::traits::{ExportError, MeshExporter, MeshSource, Presenter, SourceError, Trainer};

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("rejected mesh: {0}")]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}

/// What happened during one [`Viewer::frame`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Units of background work run, zero when training is off or failed.
    pub trained_units: u32,
    /// Scheduler outcome when background work ran.
    pub decision: Option<ScheduleDecision>,
    /// Whether a new image was rendered.
    pub rendered: bool,
}

/// The render loop coordinator.
///
/// Owns the camera, the display state, the scheduler and the current mesh.
/// All mutation goes through `&mut self`, so callers either stay on the loop
/// thread or hold a lock around the viewer.
#[derive(Debug)]
pub struct Viewer<R = SoftwareRenderer> {
    camera: OrbitCamera,
    state: FrameState,
    scheduler: StepScheduler,
    renderer: R,
    mesh: Option<Mesh>,
    seeds: Option<MeshSeeds>,
    seed_sequence: SeedSequence,
    log: TrainLog,
}

impl Viewer<SoftwareRenderer> {
    pub fn new(config: &ViewerConfig) -> Result<Self, ViewerError> {
        Self::with_renderer(config, SoftwareRenderer::new())
    }
}

impl<R> Viewer<R>
where
    R: Renderer<Output = ColorBuffer>,
{
    pub fn with_renderer(config: &ViewerConfig, renderer: R) -> Result<Self, ViewerError> {
        let camera = OrbitCamera::new(config.width, config.height, config.radius, config.fovy)?
            .with_clip(config.near, config.far)?;
        let scheduler = StepScheduler::new(config.scheduler)?;
        let mut state = FrameState::new(config.width, config.height, config.render_options());
        state.set_training(config.training);
        tracing::info!(
            width = config.width,
            height = config.height,
            mode = %config.shading,
            "viewer created"
        );
        Ok(Self {
            camera,
            state,
            scheduler,
            renderer,
            mesh: None,
            seeds: None,
            seed_sequence: SeedSequence::new(config.seed),
            log: TrainLog::new(),
        })
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn state(&self) -> &FrameState {
        &self.state
    }

    pub fn scheduler(&self) -> &StepScheduler {
        &self.scheduler
    }

    pub fn log(&self) -> &TrainLog {
        &self.log
    }

    /// The mesh currently displayed, if any.
    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    /// Seeds of the current mesh when it came from a [`MeshSource`].
    pub fn seeds(&self) -> Option<MeshSeeds> {
        self.seeds
    }

    pub fn color_buffer(&self) -> &ColorBuffer {
        self.state.color_buffer()
    }

    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    pub fn training_enabled(&self) -> bool {
        self.state.training_enabled()
    }

    pub fn summary(&self) -> ViewerSummary {
        ViewerSummary::capture(self)
    }

    // --- camera ---

    pub fn orbit(&mut self, dx: f32, dy: f32) -> bool {
        self.camera_changed(|c| c.orbit(dx, dy))
    }

    pub fn pan(&mut self, dx: f32, dy: f32) -> bool {
        self.camera_changed(|c| c.pan(dx, dy))
    }

    pub fn zoom(&mut self, delta: f32) -> bool {
        self.camera_changed(|c| c.scale(delta))
    }

    pub fn set_fovy(&mut self, fovy: f32) -> bool {
        self.camera_changed(|c| c.set_fovy(fovy))
    }

    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if !self.camera.set_viewport(width, height) {
            return false;
        }
        self.state.resize(width, height);
        true
    }

    fn camera_changed(&mut self, f: impl FnOnce(&mut OrbitCamera) -> bool) -> bool {
        let accepted = f(&mut self.camera);
        if accepted {
            self.state.mark_dirty();
        }
        accepted
    }

    // --- options ---

    pub fn set_mode(&mut self, mode: ShadingMode) {
        self.state.set_mode(mode);
    }

    pub fn set_light_theta(&mut self, theta: f32) -> bool {
        self.state.set_light_theta(theta)
    }

    pub fn set_light_phi(&mut self, phi: f32) -> bool {
        self.state.set_light_phi(phi)
    }

    pub fn set_ambient(&mut self, ratio: f32) -> bool {
        self.state.set_ambient(ratio)
    }

    pub fn set_training(&mut self, enabled: bool) {
        self.state.set_training(enabled);
    }

    pub fn toggle_training(&mut self) -> bool {
        self.state.toggle_training()
    }

    /// Apply a state-only action. Returns whether anything changed.
    ///
    /// [`Action::GenerateMesh`] and [`Action::ExportMesh`] need collaborators;
    /// use [`Viewer::handle`] for those.
    pub fn apply(&mut self, action: &Action) -> bool {
        let changed = match *action {
            Action::Orbit { dx, dy } => self.orbit(dx, dy),
            Action::Pan { dx, dy } => self.pan(dx, dy),
            Action::Zoom(delta) => self.zoom(delta),
            Action::SetShading(mode) => {
                self.set_mode(mode);
                true
            }
            Action::SetLightTheta(theta) => self.set_light_theta(theta),
            Action::SetLightPhi(phi) => self.set_light_phi(phi),
            Action::SetAmbient(ratio) => self.set_ambient(ratio),
            Action::SetFovy(fovy) => self.set_fovy(fovy),
            Action::ToggleTraining => {
                self.toggle_training();
                true
            }
            Action::Resize { width, height } => self.resize(width, height),
            Action::GenerateMesh | Action::ExportMesh(_) => {
                tracing::debug!(?action, "action needs a collaborator, ignored");
                false
            }
            Action::Noop => false,
        };
        if changed && action.is_camera() {
            tracing::trace!(?action, radius = self.camera.radius(), "camera updated");
        }
        changed
    }

    /// Apply any action, using `source` and `exporter` where needed.
    pub fn handle(
        &mut self,
        action: Action,
        source: &mut (impl MeshSource + ?Sized),
        exporter: &mut (impl MeshExporter + ?Sized),
    ) -> Result<bool, ViewerError> {
        match action {
            Action::GenerateMesh => self.generate(source).map(|_| true),
            Action::ExportMesh(path) => self.export(exporter, &path),
            other => Ok(self.apply(&other)),
        }
    }

    // --- mesh ---

    /// Install a mesh after validating it. The previous mesh is kept on error.
    pub fn load_mesh(&mut self, mesh: Mesh, seeds: Option<MeshSeeds>) -> Result<(), ViewerError> {
        mesh.validate()?;
        tracing::info!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "mesh loaded"
        );
        self.mesh = Some(mesh);
        self.seeds = seeds;
        self.state.mark_dirty();
        Ok(())
    }

    pub fn unload_mesh(&mut self) -> Option<Mesh> {
        self.seeds = None;
        self.mesh.take()
    }

    /// Draw fresh seeds and replace the mesh with what `source` makes of them.
    pub fn generate(&mut self, source: &mut (impl MeshSource + ?Sized)) -> Result<MeshSeeds, ViewerError> {
        let seeds = self.seed_sequence.next_seeds();
        let _span = tracing::info_span!("generate", %seeds).entered();
        let start = Instant::now();
        let mesh = source.produce_mesh(seeds)?;
        self.load_mesh(mesh, Some(seeds))?;
        let elapsed = start.elapsed();
        self.log.record_mesh(elapsed);
        tracing::info!(elapsed_s = elapsed.as_secs_f64(), "mesh generated");
        Ok(seeds)
    }

    /// Write the current mesh. `Ok(false)` when there is nothing to export.
    pub fn export(
        &self,
        exporter: &mut (impl MeshExporter + ?Sized),
        path: &Path,
    ) -> Result<bool, ViewerError> {
        let Some(mesh) = &self.mesh else {
            tracing::info!("no mesh to export");
            return Ok(false);
        };
        exporter.export(mesh, path)?;
        tracing::info!(path = %path.display(), "mesh exported");
        Ok(true)
    }

    // --- loop ---

    /// Render if dirty and a mesh is present. Returns whether a new image was made.
    ///
    /// A mesh that fails validation is unloaded and the previous image kept.
    pub fn render(&mut self) -> bool {
        if !self.state.is_dirty() {
            return false;
        }
        self.render_now()
    }

    /// Render regardless of the dirty flag, as long as a mesh is present.
    pub fn render_now(&mut self) -> bool {
        let Some(mesh) = &self.mesh else {
            return false;
        };
        let _span = tracing::info_span!("render", mode = %self.state.mode()).entered();
        let start = Instant::now();
        match self.renderer.render(&self.camera, mesh, self.state.options()) {
            Ok(buffer) => {
                self.state.store_frame(buffer);
                self.log.record_render(start.elapsed());
                true
            }
            Err(err) => {
                tracing::error!(%err, "render failed, unloading mesh");
                self.unload_mesh();
                false
            }
        }
    }

    /// One loop iteration: optional background work, render if dirty, present.
    pub fn frame(
        &mut self,
        trainer: &mut (impl Trainer + ?Sized),
        presenter: &mut (impl Presenter + ?Sized),
    ) -> FrameReport {
        let _span = tracing::info_span!("frame").entered();
        let mut report = FrameReport {
            trained_units: 0,
            decision: None,
            rendered: false,
        };

        if self.state.training_enabled() {
            let units = self.scheduler.unit_size();
            if let Some((elapsed, decision)) = self.train(trainer, units) {
                report.trained_units = units;
                report.decision = Some(decision);
                tracing::trace!(units, elapsed_ms = elapsed.as_secs_f64() * 1000.0, "trained");
            }
        }

        report.rendered = self.render();
        presenter.present(self.state.color_buffer());
        report
    }

    fn train(
        &mut self,
        trainer: &mut (impl Trainer + ?Sized),
        units: u32,
    ) -> Option<(Duration, ScheduleDecision)> {
        let _span = tracing::info_span!("train", units).entered();
        let start = Instant::now();
        let result = trainer.run(units, self.mesh.as_mut());
        let measured = start.elapsed();
        match result {
            Ok(work) => {
                let elapsed = work.elapsed.unwrap_or(measured);
                let decision = self.scheduler.observe_duration(units, elapsed);
                self.log.record_training(units, &work, elapsed);
                self.state.mark_dirty();
                Some((elapsed, decision))
            }
            Err(err) => {
                tracing::error!(%err, "background work failed, training disabled");
                self.state.set_training(false);
                None
            }
        }
    }
}
