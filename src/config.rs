//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/phtree/phtree.toml`
//! 3. Local config: `<project_dir>/.phtree.toml`
//! 4. Environment variables: `PHTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::layout::{LayoutOptions, ScaleMode};
use crate::application::ApplicationError;

/// Drawing defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    pub scale: ScaleMode,
    pub width: f64,
    pub row_height: f64,
    /// Species appearing at or after this time are hidden
    #[serde(skip_serializing_if = "Option::is_none")]
    pub present_time: Option<f64>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            scale: ScaleMode::Chronological,
            width: 1000.0,
            row_height: 50.0,
            present_time: None,
        }
    }
}

impl LayoutConfig {
    pub fn to_options(&self) -> LayoutOptions {
        LayoutOptions {
            scale: self.scale,
            width: self.width,
            row_height: self.row_height,
            present_time: self.present_time,
        }
    }
}

/// Terminal and file output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Significant decimals in scientific notation
    pub decimals: usize,
    /// Pretty-print written JSON documents
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            decimals: 2,
            pretty: true,
        }
    }
}

/// Raw layout config for intermediate parsing (None means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawLayoutConfig {
    pub scale: Option<ScaleMode>,
    pub width: Option<f64>,
    pub row_height: Option<f64>,
    pub present_time: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawOutputConfig {
    pub decimals: Option<usize>,
    pub pretty: Option<bool>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub layout: RawLayoutConfig,
    pub output: RawOutputConfig,
}

/// Unified configuration for phtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    pub layout: LayoutConfig,
    pub output: OutputConfig,
}

/// Get the XDG config directory for phtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "phtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("phtree.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".phtree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        let layout = &overlay.layout;
        let output = &overlay.output;
        Self {
            layout: LayoutConfig {
                scale: layout.scale.unwrap_or(self.layout.scale),
                width: layout.width.unwrap_or(self.layout.width),
                row_height: layout.row_height.unwrap_or(self.layout.row_height),
                present_time: layout.present_time.or(self.layout.present_time),
            },
            output: OutputConfig {
                decimals: output.decimals.unwrap_or(self.output.decimals),
                pretty: output.pretty.unwrap_or(self.output.pretty),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional directory holding a `.phtree.toml`
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = project_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.validate()?;
        Ok(current)
    }

    /// Load from one explicit file on top of the defaults (no env, no global).
    pub fn load_file(path: &Path) -> Result<Self, ApplicationError> {
        let settings = Self::default().merge_with(&load_raw_settings(path)?);
        settings.validate()?;
        Ok(settings)
    }

    /// Apply PHTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("PHTREE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("layout.scale") {
            settings.layout.scale = match val.to_lowercase().as_str() {
                "chronological" => ScaleMode::Chronological,
                "steps" => ScaleMode::Steps,
                other => {
                    return Err(ApplicationError::Config {
                        message: format!("unknown layout scale: {other}"),
                    })
                }
            };
        }
        if let Ok(val) = config.get_float("layout.width") {
            settings.layout.width = val;
        }
        if let Ok(val) = config.get_float("layout.row_height") {
            settings.layout.row_height = val;
        }
        if let Ok(val) = config.get_float("layout.present_time") {
            settings.layout.present_time = Some(val);
        }
        if let Ok(val) = config.get_int("output.decimals") {
            settings.output.decimals = usize::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("output.decimals must not be negative, got {val}"),
            })?;
        }
        if let Ok(val) = config.get_bool("output.pretty") {
            settings.output.pretty = val;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if !(self.layout.width > 0.0) || !(self.layout.row_height > 0.0) {
            return Err(ApplicationError::Config {
                message: format!(
                    "layout width and row_height must be positive, got {} and {}",
                    self.layout.width, self.layout.row_height
                ),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# phtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/phtree/phtree.toml
#   Local:  <project_dir>/.phtree.toml
#   Env:    PHTREE_* environment variables, e.g. PHTREE_LAYOUT__SCALE=steps

[layout]
# Horizontal scale: "chronological" (time) or "steps" (generations)
# scale = "chronological"

# Drawing width and row height
# width = 1000.0
# row_height = 50.0

# Hide species appearing at or after this time
# present_time = -5e6

[output]
# Significant decimals of scientific notation
# decimals = 2

# Pretty-print written JSON documents
# pretty = true
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
