use glam::{Mat3, Mat4, Quat, Vec3, Vec4};

/// Degrees of rotation per unit of drag input.
pub const ORBIT_DEGREES_PER_UNIT: f32 = 0.05;
/// World units of pan per unit of drag input, before rotation into world space.
pub const PAN_SENSITIVITY: f32 = 0.0005;
/// Radius is multiplied by `ZOOM_BASE^-delta` per wheel step.
pub const ZOOM_BASE: f32 = 1.1;
/// Floor for the orbit radius.
pub const MIN_RADIUS: f32 = 1e-6;

/// Clip planes a new camera starts with.
pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 10.0;

/// Errors from camera construction and reconfiguration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CameraError {
    #[error("viewport must be at least 1x1, got {width}x{height}")]
    EmptyViewport { width: u32, height: u32 },
    #[error("radius must be finite and positive, got {0}")]
    InvalidRadius(f32),
    #[error("vertical field of view must lie in (0, 180) degrees, got {0}")]
    InvalidFovy(f32),
    #[error("clip planes must satisfy 0 < near < far, got near={near} far={far}")]
    InvalidClip { near: f32, far: f32 },
}

/// Camera orbiting a look-at point.
///
/// The eye sits `radius` along the camera's local +Z axis and looks down -Z.
/// Rotation is kept as a unit quaternion and renormalized after every
/// incremental update, so repeated drags never accumulate shear or scale.
///
/// Every mutator returns `true` when the state changed; callers use that to
/// mark cached renders stale. Non-finite input is rejected and returns `false`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    width: u32,
    height: u32,
    radius: f32,
    fovy: f32,
    near: f32,
    far: f32,
    center: Vec3,
    rotation: Quat,
}

impl OrbitCamera {
    /// Camera at the origin with identity rotation and default clip planes (0.1, 10).
    pub fn new(width: u32, height: u32, radius: f32, fovy: f32) -> Result<Self, CameraError> {
        check_viewport(width, height)?;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(CameraError::InvalidRadius(radius));
        }
        check_fovy(fovy)?;
        Ok(Self {
            width,
            height,
            radius,
            fovy,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            center: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        })
    }

    pub fn with_clip(mut self, near: f32, far: f32) -> Result<Self, CameraError> {
        check_clip(near, far)?;
        self.near = near;
        self.far = far;
        Ok(self)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Vertical field of view in degrees.
    pub fn fovy(&self) -> f32 {
        self.fovy
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn rotation_matrix(&self) -> Mat3 {
        Mat3::from_quat(self.rotation)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Rotate about world up by `dx` and about the current side axis by `dy`.
    ///
    /// The increments are pre-multiplied onto the old rotation and the side
    /// axis is read from the orientation before this update:
    /// `R' = R(up, -k·dx) · R(side, -k·dy) · R`.
    pub fn orbit(&mut self, dx: f32, dy: f32) -> bool {
        if !dx.is_finite() || !dy.is_finite() {
            tracing::warn!(dx, dy, "rejected non-finite orbit");
            return false;
        }
        let side = self.rotation_matrix().x_axis;
        let yaw = Quat::from_axis_angle(Vec3::Y, (-ORBIT_DEGREES_PER_UNIT * dx).to_radians());
        let pitch = Quat::from_axis_angle(side, (-ORBIT_DEGREES_PER_UNIT * dy).to_radians());
        let next = (yaw * pitch * self.rotation).normalize();
        if !next.is_finite() {
            return false;
        }
        self.rotation = next;
        true
    }

    /// Zoom: `radius *= 1.1^(-delta)`. Positive deltas move the eye closer.
    pub fn scale(&mut self, delta: f32) -> bool {
        if !delta.is_finite() {
            tracing::warn!(delta, "rejected non-finite zoom");
            return false;
        }
        let next = self.radius * ZOOM_BASE.powf(-delta);
        if !next.is_finite() {
            tracing::warn!(delta, radius = self.radius, "zoom would overflow radius");
            return false;
        }
        self.radius = next.max(MIN_RADIUS);
        true
    }

    /// Move the look-at point in camera-local axes (screen y grows downward).
    pub fn pan(&mut self, dx: f32, dy: f32) -> bool {
        self.pan3(dx, dy, 0.0)
    }

    pub fn pan3(&mut self, dx: f32, dy: f32, dz: f32) -> bool {
        if !dx.is_finite() || !dy.is_finite() || !dz.is_finite() {
            tracing::warn!(dx, dy, dz, "rejected non-finite pan");
            return false;
        }
        let offset = PAN_SENSITIVITY * (self.rotation_matrix() * Vec3::new(dx, -dy, dz));
        self.center += offset;
        true
    }

    pub fn set_fovy(&mut self, fovy: f32) -> bool {
        if check_fovy(fovy).is_err() {
            tracing::warn!(fovy, "rejected field of view");
            return false;
        }
        self.fovy = fovy;
        true
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) -> bool {
        if check_viewport(width, height).is_err() {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    pub fn set_clip(&mut self, near: f32, far: f32) -> bool {
        if check_clip(near, far).is_err() {
            return false;
        }
        self.near = near;
        self.far = far;
        true
    }

    /// Camera-to-world transform.
    ///
    /// Translate along local Z by the radius, rotate, then subtract the
    /// look-at point from the translation column, so rotation pivots about the
    /// target rather than the world origin.
    pub fn pose(&self) -> Mat4 {
        let mut pose =
            Mat4::from_quat(self.rotation) * Mat4::from_translation(Vec3::new(0.0, 0.0, self.radius));
        pose.w_axis -= self.center.extend(0.0);
        pose
    }

    /// World-to-camera transform, the rigid inverse of [`Self::pose`].
    pub fn view(&self) -> Mat4 {
        let pose = self.pose();
        let inv_rot = self.rotation.conjugate();
        Mat4::from_quat(inv_rot) * Mat4::from_translation(-pose.w_axis.truncate())
    }

    /// Eye position in world space.
    pub fn eye(&self) -> Vec3 {
        self.pose().w_axis.truncate()
    }

    /// Pinhole intrinsics `[fx, fy, cx, cy]` in pixels.
    pub fn intrinsics(&self) -> [f32; 4] {
        let focal = self.height as f32 / (2.0 * (self.fovy.to_radians() / 2.0).tan());
        // Principal point at the integer half of the viewport, so odd sizes
        // sit half a pixel off the exact center.
        [
            focal,
            focal,
            (self.width / 2) as f32,
            (self.height / 2) as f32,
        ]
    }

    /// Right-handed perspective projection with the Y row negated, so image
    /// row 0 is the top of the view. Near maps to -1, far to +1.
    pub fn perspective(&self) -> Mat4 {
        let y = (self.fovy.to_radians() / 2.0).tan();
        let aspect = self.aspect();
        let (n, f) = (self.near, self.far);
        Mat4::from_cols(
            Vec4::new(1.0 / (y * aspect), 0.0, 0.0, 0.0),
            Vec4::new(0.0, -1.0 / y, 0.0, 0.0),
            Vec4::new(0.0, 0.0, -(f + n) / (f - n), -1.0),
            Vec4::new(0.0, 0.0, -(2.0 * f * n) / (f - n), 0.0),
        )
    }

    /// `perspective · view`.
    pub fn view_projection(&self) -> Mat4 {
        self.perspective() * self.view()
    }
}

fn check_viewport(width: u32, height: u32) -> Result<(), CameraError> {
    if width == 0 || height == 0 {
        return Err(CameraError::EmptyViewport { width, height });
    }
    Ok(())
}

fn check_fovy(fovy: f32) -> Result<(), CameraError> {
    if !fovy.is_finite() || fovy <= 0.0 || fovy >= 180.0 {
        return Err(CameraError::InvalidFovy(fovy));
    }
    Ok(())
}

fn check_clip(near: f32, far: f32) -> Result<(), CameraError> {
    if !near.is_finite() || !far.is_finite() || near <= 0.0 || near >= far {
        return Err(CameraError::InvalidClip { near, far });
    }
    Ok(())
}
