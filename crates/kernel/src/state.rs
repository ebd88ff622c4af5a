use orbitview_common::{ColorBuffer, LightDirection, ShadingMode};
use orbitview_render::RenderOptions;

/// Display options, the last rendered image and the two loop flags.
///
/// `dirty` is set by every accepted option change and cleared only by
/// [`FrameState::store_frame`]. `training_enabled` changes only on request.
#[derive(Debug, Clone)]
pub struct FrameState {
    options: RenderOptions,
    dirty: bool,
    training_enabled: bool,
    color_buffer: ColorBuffer,
    revision: u64,
}

impl FrameState {
    pub fn new(width: u32, height: u32, options: RenderOptions) -> Self {
        Self {
            options,
            dirty: true,
            training_enabled: false,
            color_buffer: ColorBuffer::new(width, height),
            revision: 0,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn mode(&self) -> ShadingMode {
        self.options.mode
    }

    pub fn light(&self) -> LightDirection {
        self.options.light
    }

    pub fn ambient_ratio(&self) -> f32 {
        self.options.ambient_ratio
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn training_enabled(&self) -> bool {
        self.training_enabled
    }

    pub fn color_buffer(&self) -> &ColorBuffer {
        &self.color_buffer
    }

    /// Number of frames stored so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn set_mode(&mut self, mode: ShadingMode) {
        if mode != self.options.mode {
            tracing::debug!(from = %self.options.mode, to = %mode, "shading mode changed");
        }
        self.options.mode = mode;
        self.dirty = true;
    }

    /// Polar light angle in degrees. Non-finite values are rejected.
    pub fn set_light_theta(&mut self, theta: f32) -> bool {
        if !theta.is_finite() {
            tracing::warn!(theta, "rejected non-finite light theta");
            return false;
        }
        self.options.light.theta = theta;
        self.dirty = true;
        true
    }

    /// Light azimuth in degrees. Non-finite values are rejected.
    pub fn set_light_phi(&mut self, phi: f32) -> bool {
        if !phi.is_finite() {
            tracing::warn!(phi, "rejected non-finite light phi");
            return false;
        }
        self.options.light.phi = phi;
        self.dirty = true;
        true
    }

    /// Ambient ratio, clamped to [0, 1]. Non-finite values are rejected.
    pub fn set_ambient(&mut self, ratio: f32) -> bool {
        if !ratio.is_finite() {
            tracing::warn!(ratio, "rejected non-finite ambient ratio");
            return false;
        }
        self.options.ambient_ratio = ratio.clamp(0.0, 1.0);
        self.dirty = true;
        true
    }

    pub fn set_training(&mut self, enabled: bool) {
        if enabled != self.training_enabled {
            tracing::debug!(enabled, "training toggled");
        }
        self.training_enabled = enabled;
    }

    /// Flip training and return the new value.
    pub fn toggle_training(&mut self) -> bool {
        self.set_training(!self.training_enabled);
        self.training_enabled
    }

    /// Replace the image with a black one of the new size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.color_buffer = ColorBuffer::new(width, height);
        self.revision += 1;
        self.color_buffer.set_revision(self.revision);
        self.dirty = true;
    }

    /// Install a freshly rendered image and clear `dirty`.
    pub fn store_frame(&mut self, mut buffer: ColorBuffer) {
        self.revision += 1;
        buffer.set_revision(self.revision);
        self.color_buffer = buffer;
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn state() -> FrameState {
        FrameState::new(4, 4, RenderOptions::default())
    }

    #[test]
    fn starts_dirty_and_idle() {
        let s = state();
        assert!(s.is_dirty());
        assert!(!s.training_enabled());
        assert_eq!(s.color_buffer().width(), 4);
    }

    #[test]
    fn store_frame_clears_dirty_and_bumps_revision() {
        let mut s = state();
        s.store_frame(ColorBuffer::new(4, 4));
        assert!(!s.is_dirty());
        assert_eq!(s.revision(), 1);
        assert_eq!(s.color_buffer().revision(), 1);
    }

    #[test]
    fn option_changes_mark_dirty() {
        let mut s = state();
        s.store_frame(ColorBuffer::new(4, 4));
        s.set_mode(ShadingMode::Depth);
        assert!(s.is_dirty());
        assert_eq!(s.mode(), ShadingMode::Depth);

        s.store_frame(ColorBuffer::new(4, 4));
        assert!(s.set_light_theta(45.0));
        assert!(s.is_dirty());
    }

    #[test]
    fn ambient_is_clamped_and_nan_rejected() {
        let mut s = state();
        assert!(s.set_ambient(1.7));
        assert_eq!(s.ambient_ratio(), 1.0);
        assert!(s.set_ambient(-0.3));
        assert_eq!(s.ambient_ratio(), 0.0);
        assert!(!s.set_ambient(f32::NAN));
        assert_eq!(s.ambient_ratio(), 0.0);
    }

    #[test]
    fn non_finite_light_rejected() {
        let mut s = state();
        s.store_frame(ColorBuffer::new(4, 4));
        assert!(!s.set_light_phi(f32::INFINITY));
        assert!(!s.is_dirty());
        assert_eq!(s.light().phi, 0.0);
    }

    #[test]
    fn toggle_training_flips() {
        let mut s = state();
        assert!(s.toggle_training());
        assert!(!s.toggle_training());
    }

    #[test]
    fn resize_replaces_buffer() {
        let mut s = state();
        s.store_frame(ColorBuffer::filled(4, 4, Vec3::ONE));
        s.resize(8, 2);
        assert_eq!((s.color_buffer().width(), s.color_buffer().height()), (8, 2));
        assert!(s.is_dirty());
    }
}
