//! Optional, read-only application settings.
//!
//! Looked up in the platform config directory (`settings.toml`). The file only
//! tunes the app itself; invoice data is never written anywhere.

use std::fs;
use std::path::{Path, PathBuf};

use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

const CONFIG_FILENAME: &str = "settings.toml";
const MAX_EXPORT_SCALE: f32 = 8.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub export: ExportSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            log_filter: "info".to_string(),
            export: ExportSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportSettings {
    /// Starting directory of the save dialog. Falls back to Downloads.
    pub directory: Option<PathBuf>,
    /// Raster pixels per logical point of the captured preview.
    pub scale: f32,
    /// Ask where to save. When `false` the file goes straight to `directory`.
    pub prompt: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        ExportSettings {
            directory: None,
            scale: 2.0,
            prompt: true,
        }
    }
}

impl ExportSettings {
    pub fn target_dir(&self) -> PathBuf {
        if let Some(dir) = &self.directory {
            return dir.clone();
        }
        UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

impl AppSettings {
    pub fn config_path() -> PathBuf {
        if let Some(proj_dirs) = ProjectDirs::from("com", "invoice-gen", "InvoiceGen") {
            return proj_dirs.config_dir().join(CONFIG_FILENAME);
        }
        PathBuf::from(CONFIG_FILENAME)
    }

    /// Load from `path`, or from [`AppSettings::config_path`] when `None`.
    ///
    /// A missing file is not an error and yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(AppSettings::default());
            }
            Err(source) => return Err(SettingsError::Read { path, source }),
        };

        let settings: AppSettings =
            toml::from_str(&content).map_err(|source| SettingsError::Parse {
                path: path.clone(),
                source,
            })?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let scale = self.export.scale;
        if !scale.is_finite() || scale <= 0.0 || scale > MAX_EXPORT_SCALE {
            return Err(SettingsError::Invalid {
                message: format!(
                    "export.scale must be in (0, {}], got {}",
                    MAX_EXPORT_SCALE, scale
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = AppSettings::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.export.scale, 2.0);
        assert!(settings.export.prompt);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[export]\nprompt = false\ndirectory = \"/tmp/out\"\n").unwrap();

        let settings = AppSettings::load(Some(&path)).unwrap();
        assert!(!settings.export.prompt);
        assert_eq!(settings.export.directory, Some(PathBuf::from("/tmp/out")));
        assert_eq!(settings.export.scale, 2.0);
        assert_eq!(settings.log_filter, "info");
        assert_eq!(settings.export.target_dir(), PathBuf::from("/tmp/out"));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "log_filter = [").unwrap();

        let err = AppSettings::load(Some(&path)).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn out_of_range_scale_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[export]\nscale = 0.0\n").unwrap();

        let err = AppSettings::load(Some(&path)).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { .. }));
    }
}
