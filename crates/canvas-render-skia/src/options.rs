// File: crates/canvas-render-skia/src/options.rs
// Summary: Engine configuration with defaults and environment overrides.

use std::path::PathBuf;

use thiserror::Error;

/// Directory scanned for `.ttf`/`.otf` files at load time.
pub const ENV_ASSET_DIR: &str = "CANVAS_ASSET_DIR";
/// `1`/`true` disables hardware surfaces entirely.
pub const ENV_SOFTWARE_ONLY: &str = "CANVAS_SOFTWARE_ONLY";
/// Upper bound on simultaneously live hardware surfaces.
pub const ENV_MAX_HW_SURFACES: &str = "CANVAS_MAX_HW_SURFACES";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{var} must be a boolean, got {value:?}")]
    InvalidFlag { var: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct EngineOptions {
    pub asset_dir: Option<PathBuf>,
    /// Attempt hardware surfaces before software ones.
    pub hardware: bool,
    /// Hardware surfaces allowed at once; the next one raises `ContextLimit`.
    pub max_hardware_surfaces: usize,
    /// Family tried first by the text shaper and `SkiaEngine::font`.
    pub default_family: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            asset_dir: None,
            hardware: true,
            max_hardware_surfaces: 8,
            default_family: "Roboto".to_string(),
        }
    }
}

impl EngineOptions {
    /// Defaults overridden by `CANVAS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut opts = Self::default();
        if let Some(dir) = get(ENV_ASSET_DIR).filter(|s| !s.trim().is_empty()) {
            opts.asset_dir = Some(PathBuf::from(dir));
        }
        if let Some(v) = get(ENV_SOFTWARE_ONLY) {
            opts.hardware = !parse_flag(ENV_SOFTWARE_ONLY, &v)?;
        }
        if let Some(v) = get(ENV_MAX_HW_SURFACES) {
            opts.max_hardware_surfaces = v
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber { var: ENV_MAX_HW_SURFACES, value: v.clone() })?;
        }
        Ok(opts)
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { var, value: value.to_string() }),
    }
}
