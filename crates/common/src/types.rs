use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How rasterized fragments are turned into color.
///
/// The set is closed: every consumer matches exhaustively, and parsing an
/// unknown name is an error rather than a silent fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadingMode {
    /// Clip-space depth broadcast to all channels.
    Depth,
    /// Bilinearly sampled albedo texture, anti-aliased at silhouettes.
    Albedo,
    /// Interpolated surface normal remapped to [0, 1].
    Normal,
    /// Albedo modulated by ambient + diffuse lighting.
    #[default]
    Lambertian,
}

impl ShadingMode {
    pub const ALL: [ShadingMode; 4] = [
        ShadingMode::Albedo,
        ShadingMode::Depth,
        ShadingMode::Normal,
        ShadingMode::Lambertian,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Depth => "depth",
            Self::Albedo => "albedo",
            Self::Normal => "normal",
            Self::Lambertian => "lambertian",
        }
    }

    /// Whether the mode samples the albedo texture.
    pub fn needs_albedo(self) -> bool {
        matches!(self, Self::Albedo | Self::Lambertian)
    }

    /// Whether the mode interpolates vertex normals.
    pub fn needs_normals(self) -> bool {
        matches!(self, Self::Normal | Self::Lambertian)
    }
}

impl fmt::Display for ShadingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown shading mode '{0}' (expected depth, albedo, normal or lambertian)")]
pub struct ShadingModeParseError(pub String);

impl FromStr for ShadingMode {
    type Err = ShadingModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "depth" => Ok(Self::Depth),
            "albedo" => Ok(Self::Albedo),
            "normal" => Ok(Self::Normal),
            "lambertian" => Ok(Self::Lambertian),
            _ => Err(ShadingModeParseError(s.to_string())),
        }
    }
}

/// Directional light given as spherical angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LightDirection {
    /// Polar angle from +Y.
    pub theta: f32,
    /// Azimuth around +Y, measured from +Z toward +X.
    pub phi: f32,
}

impl LightDirection {
    pub fn new(theta: f32, phi: f32) -> Self {
        Self { theta, phi }
    }

    /// World-space unit vector `(sin θ sin φ, cos θ, sin θ cos φ)`.
    pub fn to_vector(self) -> Vec3 {
        let theta = self.theta.to_radians();
        let phi = self.phi.to_radians();
        Vec3::new(theta.sin() * phi.sin(), theta.cos(), theta.sin() * phi.cos())
    }

    pub fn is_finite(self) -> bool {
        self.theta.is_finite() && self.phi.is_finite()
    }
}
