//! Viewer configuration loaded from JSON.

use std::path::{Path, PathBuf};

use orbitview_common::{LightDirection, ShadingMode};
use orbitview_render::{DEFAULT_FAR, DEFAULT_NEAR, RenderOptions};
use orbitview_schedule::SchedulerConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Every knob the viewer starts from. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub width: u32,
    pub height: u32,
    pub radius: f32,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub near: f32,
    pub far: f32,
    pub shading: ShadingMode,
    pub light: LightDirection,
    pub ambient_ratio: f32,
    /// Start with background work enabled.
    pub training: bool,
    /// Start state of the seed sequence used by "generate".
    pub seed: u64,
    pub scheduler: SchedulerConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            radius: 3.0,
            fovy: 50.0,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            shading: ShadingMode::Lambertian,
            light: LightDirection::new(0.0, 0.0),
            ambient_ratio: 0.5,
            training: false,
            seed: 0,
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        tracing::info!(path = %path.display(), "loaded viewer config");
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            mode: self.shading,
            light: self.light,
            ambient_ratio: self.ambient_ratio.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let c = ViewerConfig::default();
        assert_eq!((c.width, c.height), (1024, 1024));
        assert_eq!(c.radius, 3.0);
        assert_eq!(c.fovy, 50.0);
        assert_eq!(c.shading, ShadingMode::Lambertian);
        assert_eq!(c.ambient_ratio, 0.5);
        assert_eq!(c.scheduler.target_ms, 500.0);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c = ViewerConfig::from_json(r#"{ "width": 640, "shading": "normal" }"#).unwrap();
        assert_eq!(c.width, 640);
        assert_eq!(c.height, 1024);
        assert_eq!(c.shading, ShadingMode::Normal);
    }

    #[test]
    fn nested_scheduler_overrides() {
        let c = ViewerConfig::from_json(r#"{ "scheduler": { "target_ms": 250.0 } }"#).unwrap();
        assert_eq!(c.scheduler.target_ms, 250.0);
        assert_eq!(c.scheduler.max_units, 16);
    }

    #[test]
    fn unknown_mode_is_an_error() {
        assert!(ViewerConfig::from_json(r#"{ "shading": "phong" }"#).is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "radius": 5.0, "training": true }}"#).unwrap();
        let c = ViewerConfig::load(file.path()).unwrap();
        assert_eq!(c.radius, 5.0);
        assert!(c.training);
    }

    #[test]
    fn missing_file_reports_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("absent.json");
        let err = ViewerConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn json_roundtrip_preserves_config() {
        let mut c = ViewerConfig::default();
        c.light = LightDirection::new(30.0, 120.0);
        let text = c.to_json_pretty().unwrap();
        assert_eq!(ViewerConfig::from_json(&text).unwrap(), c);
    }
}
