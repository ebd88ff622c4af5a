use anyhow::Result;
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use orbitview_assets::ObjExporter;
use orbitview_common::{ColorBuffer, ShadingMode};
use orbitview_input::{Action, PointerButton, PointerMapper};
use orbitview_kernel::{Presenter, Viewer, ViewerConfig};
use orbitview_model::{FitConfig, ProceduralSource, ShapeFitter};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "orbitview-desktop", about = "Interactive orbit viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON viewer config
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    #[arg(long)]
    radius: Option<f32>,
    #[arg(long)]
    fovy: Option<f32>,

    /// Where "Save mesh" writes the OBJ bundle
    #[arg(long, default_value = "mesh.obj")]
    export_path: PathBuf,

    /// Seed of the shape the background fitter pulls toward
    #[arg(long, default_value = "1")]
    target: u64,
}

impl Cli {
    fn viewer_config(&self) -> Result<ViewerConfig> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load(path)?,
            None => ViewerConfig::default(),
        };
        config.width = self.width.unwrap_or(config.width);
        config.height = self.height.unwrap_or(config.height);
        config.radius = self.radius.unwrap_or(config.radius);
        config.fovy = self.fovy.unwrap_or(config.fovy);
        Ok(config)
    }
}

/// Application state.
struct AppState {
    viewer: Viewer,
    source: ProceduralSource,
    fitter: ShapeFitter,
    exporter: ObjExporter,
    export_path: String,
    texture: FrameTexture,
    show_controls: bool,
    pending: Vec<Action>,
}

impl AppState {
    fn new(ctx: EguiContext, viewer: Viewer, export_path: PathBuf, target: u64) -> Self {
        let mut state = Self {
            viewer,
            source: ProceduralSource::default(),
            fitter: ShapeFitter::new(target, FitConfig::default()),
            exporter: ObjExporter::new(),
            export_path: export_path.display().to_string(),
            texture: FrameTexture::new(ctx),
            show_controls: true,
            pending: vec![Action::GenerateMesh],
        };
        state.flush_actions();
        state
    }

    fn flush_actions(&mut self) {
        for action in std::mem::take(&mut self.pending) {
            if let Err(e) = self
                .viewer
                .handle(action, &mut self.source, &mut self.exporter)
            {
                tracing::error!("action failed: {e}");
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::KeyG => self.pending.push(Action::GenerateMesh),
            KeyCode::KeyT => self.pending.push(Action::ToggleTraining),
            KeyCode::KeyS => self
                .pending
                .push(Action::ExportMesh(PathBuf::from(&self.export_path))),
            KeyCode::Digit1 => self.pending.push(Action::SetShading(ShadingMode::Albedo)),
            KeyCode::Digit2 => self.pending.push(Action::SetShading(ShadingMode::Depth)),
            KeyCode::Digit3 => self.pending.push(Action::SetShading(ShadingMode::Normal)),
            KeyCode::Digit4 => self.pending.push(Action::SetShading(ShadingMode::Lambertian)),
            KeyCode::F1 => self.show_controls = !self.show_controls,
            _ => {}
        }
    }

    /// Run one viewer frame, then lay out the image and the controls.
    fn draw_ui(&mut self, ctx: &EguiContext) {
        self.flush_actions();

        self.viewer.frame(&mut self.fitter, &mut self.texture);

        self.draw_viewport(ctx);
        if self.show_controls {
            self.draw_controls(ctx);
        }
    }

    fn draw_viewport(&mut self, ctx: &EguiContext) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let Some(texture) = &self.texture.handle else {
                    ui.centered_and_justified(|ui| ui.label("No mesh. Press G to generate."));
                    return;
                };
                let size = texture.size_vec2() / ctx.pixels_per_point();
                let response = ui.add(
                    egui::Image::new((texture.id(), size)).sense(egui::Sense::click_and_drag()),
                );

                let ppp = ctx.pixels_per_point();
                let delta = response.drag_delta() * ppp;
                let delta = Vec2::new(delta.x, delta.y);
                for (egui_button, button) in [
                    (egui::PointerButton::Primary, PointerButton::Primary),
                    (egui::PointerButton::Secondary, PointerButton::Secondary),
                ] {
                    if response.dragged_by(egui_button) {
                        self.pending.push(PointerMapper::drag(button, delta));
                    }
                }

                if response.hovered() {
                    let steps = ui.input(|i| {
                        i.events
                            .iter()
                            .filter_map(|event| match event {
                                egui::Event::MouseWheel { unit, delta, .. } => Some(match unit {
                                    egui::MouseWheelUnit::Line => delta.y,
                                    egui::MouseWheelUnit::Point => delta.y / 50.0,
                                    egui::MouseWheelUnit::Page => delta.y * 10.0,
                                }),
                                _ => None,
                            })
                            .sum::<f32>()
                    });
                    self.pending.push(PointerMapper::wheel(steps));
                }
            });
    }

    fn draw_controls(&mut self, ctx: &EguiContext) {
        let summary = self.viewer.summary();
        let state = self.viewer.state();
        let mut mode = state.mode();
        let mut light = state.light();
        let mut ambient = state.ambient_ratio();
        let mut fovy = summary.fovy;
        let mut training = summary.training;

        egui::Window::new("Controls")
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.heading("Mesh");
                ui.horizontal(|ui| {
                    if ui.button("Generate (G)").clicked() {
                        self.pending.push(Action::GenerateMesh);
                    }
                    if ui.button("Save (S)").clicked() {
                        self.pending
                            .push(Action::ExportMesh(PathBuf::from(&self.export_path)));
                    }
                });
                ui.text_edit_singleline(&mut self.export_path);
                match (summary.faces, summary.seeds) {
                    (Some(faces), Some(seeds)) => ui.label(format!("{faces} faces, {seeds}")),
                    (Some(faces), None) => ui.label(format!("{faces} faces")),
                    (None, _) => ui.label("no mesh"),
                };

                ui.separator();
                ui.heading("Training");
                if ui.checkbox(&mut training, "Train (T)").changed() {
                    self.pending.push(Action::ToggleTraining);
                }
                let log = self.viewer.log();
                ui.monospace(log.progress_line());
                ui.monospace(format!("train: {}", log.train_time_line()));
                ui.monospace(format!("infer: {}", log.infer_time_line()));
                ui.label(format!("units per frame: {}", summary.unit_size));

                ui.separator();
                ui.heading("Shading");
                egui::ComboBox::from_label("Mode")
                    .selected_text(mode.as_str())
                    .show_ui(ui, |ui| {
                        for m in ShadingMode::ALL {
                            ui.selectable_value(&mut mode, m, m.as_str());
                        }
                    });
                if ui
                    .add(egui::Slider::new(&mut fovy, 1.0..=120.0).text("FoV"))
                    .changed()
                {
                    self.pending.push(Action::SetFovy(fovy));
                }
                if ui
                    .add(egui::Slider::new(&mut light.theta, 0.0..=180.0).text("Light θ"))
                    .changed()
                {
                    self.pending.push(Action::SetLightTheta(light.theta));
                }
                if ui
                    .add(egui::Slider::new(&mut light.phi, 0.0..=360.0).text("Light φ"))
                    .changed()
                {
                    self.pending.push(Action::SetLightPhi(light.phi));
                }
                if ui
                    .add(egui::Slider::new(&mut ambient, 0.0..=1.0).text("Ambient"))
                    .changed()
                {
                    self.pending.push(Action::SetAmbient(ambient));
                }

                ui.separator();
                ui.collapsing("Debug", |ui| {
                    ui.monospace(summary.to_string());
                });

                ui.separator();
                ui.small("LMB: Orbit | RMB: Pan | Wheel: Zoom | F1: Toggle controls");
            });

        if mode != summary.mode {
            self.pending.push(Action::SetShading(mode));
        }
    }
}

/// Presenter that mirrors the viewer's color buffer into an egui texture.
struct FrameTexture {
    ctx: EguiContext,
    handle: Option<egui::TextureHandle>,
    revision: u64,
}

impl FrameTexture {
    fn new(ctx: EguiContext) -> Self {
        Self {
            ctx,
            handle: None,
            revision: 0,
        }
    }
}

impl Presenter for FrameTexture {
    fn present(&mut self, buffer: &ColorBuffer) {
        // Revision 0 is the blank start buffer.
        if buffer.revision() == 0 || buffer.revision() == self.revision {
            return;
        }
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [buffer.width() as usize, buffer.height() as usize],
            &buffer.to_rgba8(),
        );
        match &mut self.handle {
            Some(handle) => handle.set(image, egui::TextureOptions::NEAREST),
            None => {
                self.handle = Some(
                    self.ctx
                        .load_texture("frame", image, egui::TextureOptions::NEAREST),
                );
            }
        }
        self.revision = buffer.revision();
    }
}

/// Everything that only exists once a window is up.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(egui_ctx: EguiContext, state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx,
        }
    }

    fn redraw(&mut self) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let state = &mut self.state;
        let full_output = self.egui_ctx.run(raw_input, |ctx| state.draw_ui(ctx));
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let camera = self.state.viewer.camera();
        let attrs = Window::default_attributes()
            .with_title("orbitview")
            .with_inner_size(LogicalSize::new(camera.width(), camera.height()));
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .expect("create surface");

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("find adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("orbitview_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .expect("create device");

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        // egui expects a non-sRGB target.
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        self.gpu = Some(Gpu {
            window,
            surface,
            device,
            queue,
            config,
            egui_winit,
            egui_renderer,
        });
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.config.width = new_size.width.max(1);
                    gpu.config.height = new_size.height.max(1);
                    gpu.surface.configure(&gpu.device, &gpu.config);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.state.handle_key(key);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("orbitview-desktop starting");

    let viewer = Viewer::new(&cli.viewer_config()?)?;
    let egui_ctx = EguiContext::default();
    let state = AppState::new(egui_ctx.clone(), viewer, cli.export_path, cli.target);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(egui_ctx, state);
    event_loop.run_app(&mut app)?;

    Ok(())
}
