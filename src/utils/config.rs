//! Configuration management for pipview
//!
//! This module handles loading and managing screen configuration
//! from config files and environment variables.

use crate::audio::{AudioCategory, AudioMode};
use crate::utils::error::{IntoPlayerError, PipViewError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Sample clip played when nothing else is configured
pub const DEFAULT_SOURCE_URL: &str =
    "http://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerFun.mp4";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Media source configuration
    pub media: MediaConfig,

    /// Playback behaviour
    pub playback: PlaybackConfig,

    /// Picture-in-Picture behaviour
    pub pip: PipConfig,

    /// Audio routing configuration
    pub audio: AudioConfig,

    /// General application settings
    pub general: GeneralConfig,
}

/// Media source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Locator of the clip to load on start
    pub source_url: String,
}

/// Playback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Cadence of the periodic time observer in milliseconds
    pub progress_interval_ms: u64,

    /// Height/width ratio used until the real track size is known
    pub placeholder_aspect_ratio: f64,

    /// Hide the overlay on the first play from time zero
    pub first_play_hides_overlay: bool,
}

/// Picture-in-Picture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipConfig {
    /// Create a PiP capability when the host supports it
    pub enabled: bool,

    /// Start PiP automatically when the app goes to the background
    pub auto_start_on_background: bool,
}

/// Audio configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Session category requested at startup
    pub category: AudioCategory,

    /// Session mode requested at startup
    pub mode: AudioMode,

    /// Activate the session after configuring it
    pub activate: bool,
}

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            progress_interval_ms: 1000,
            placeholder_aspect_ratio: 9.0 / 16.0,
            first_play_hides_overlay: true,
        }
    }
}

impl Default for PipConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_start_on_background: true,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            category: AudioCategory::Playback,
            mode: AudioMode::MoviePlayback,
            activate: true,
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl PlaybackConfig {
    /// Observer cadence as a duration
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

impl Config {
    /// Load configuration from various sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. System config file (/etc/pipview/config.toml on Linux)
    /// 3. User config file (~/.config/pipview/config.toml on Linux)
    /// 4. The explicitly given file, if any
    /// 5. Environment variables (PIPVIEW_* prefix)
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut layers = Vec::new();

        if let Some(system_path) = Self::system_config_path() {
            if system_path.exists() {
                layers.push(system_path);
            }
        }

        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                layers.push(user_path);
            }
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(PipViewError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            layers.push(path.to_path_buf());
        }

        Self::load_layers(&layers)
    }

    /// Layer `files` over the defaults in order, then apply environment
    /// overrides and validate.
    pub fn load_layers<P: AsRef<Path>>(files: &[P]) -> Result<Self> {
        let mut config = Self::default();
        for file in files {
            config.merge_from_file(file.as_ref())?;
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to user config file
    pub fn save(&self) -> Result<()> {
        let path = Self::user_config_path()
            .ok_or_else(|| PipViewError::Config("Cannot determine user config path".to_string()))?;
        self.save_to(&path)
    }

    /// Save configuration to the given path, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).config_err("Failed to create config directory")?;
        }

        let toml = toml::to_string_pretty(self).config_err("Failed to serialize config")?;
        std::fs::write(path, toml).config_err("Failed to write config file")?;

        Ok(())
    }

    /// Overlay the keys present in a TOML file onto this configuration.
    ///
    /// Tables merge key by key; keys the file does not mention keep their
    /// current value.
    fn merge_from_file(&mut self, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path).config_err("Failed to read config file")?;
        let overlay: toml::Table =
            toml::from_str(&contents).config_err("Failed to parse config file")?;

        let mut merged = toml::Value::try_from(&*self).config_err("Failed to serialize config")?;
        merge_toml(&mut merged, toml::Value::Table(overlay));
        *self = merged.try_into().config_err("Failed to apply config file")?;
        Ok(())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("PIPVIEW_SOURCE_URL") {
            self.media.source_url = url;
        }

        if let Ok(interval) = std::env::var("PIPVIEW_PROGRESS_INTERVAL_MS") {
            self.playback.progress_interval_ms = interval
                .parse()
                .map_err(|_| {
                    PipViewError::Config("Invalid PIPVIEW_PROGRESS_INTERVAL_MS".to_string())
                })?;
        }

        if let Ok(auto_pip) = std::env::var("PIPVIEW_AUTO_PIP") {
            self.pip.auto_start_on_background = auto_pip
                .parse()
                .map_err(|_| PipViewError::Config("Invalid PIPVIEW_AUTO_PIP".to_string()))?;
        }

        if let Ok(log_level) = std::env::var("PIPVIEW_LOG_LEVEL") {
            self.general.log_level = log_level;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.media.source_url.trim().is_empty() {
            return Err(PipViewError::Config("Source URL must not be empty".to_string()));
        }

        if self.playback.progress_interval_ms == 0 {
            return Err(PipViewError::Config("Progress interval must be non-zero".to_string()));
        }

        let ratio = self.playback.placeholder_aspect_ratio;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(PipViewError::Config(format!(
                "Placeholder aspect ratio must be positive, got {}",
                ratio
            )));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.general.log_level.as_str()) {
            return Err(PipViewError::Config(format!(
                "Invalid log level '{}', must be one of: {:?}",
                self.general.log_level, valid_log_levels
            )));
        }

        Ok(())
    }

    /// Get system config file path
    fn system_config_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        return Some(PathBuf::from("/etc/pipview/config.toml"));

        #[cfg(target_os = "windows")]
        return std::env::var("PROGRAMDATA")
            .ok()
            .map(|p| PathBuf::from(p).join("pipview").join("config.toml"));

        #[cfg(target_os = "macos")]
        return Some(PathBuf::from("/Library/Application Support/pipview/config.toml"));

        #[allow(unreachable_code)]
        None
    }

    /// Get user config file path
    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pipview").join("config.toml"))
    }
}

/// Deep-merge `overlay` into `base`; non-table values replace
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.media.source_url, DEFAULT_SOURCE_URL);
        assert_eq!(config.playback.progress_interval(), Duration::from_secs(1));
        assert_eq!(config.playback.placeholder_aspect_ratio, 9.0 / 16.0);
        assert!(config.pip.auto_start_on_background);
        assert_eq!(config.audio.category, AudioCategory::Playback);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.playback.progress_interval_ms = 0;
        assert!(config.validate().is_err());

        config.playback.progress_interval_ms = 1000;
        config.playback.placeholder_aspect_ratio = f64::NAN;
        assert!(config.validate().is_err());

        config.playback.placeholder_aspect_ratio = 0.75;
        config.general.log_level = "loud".to_string();
        assert!(config.validate().is_err());

        config.general.log_level = "warn".to_string();
        config.media.source_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[playback]\nprogress_interval_ms = 500\n").unwrap();

        let mut config = Config::default();
        config.merge_from_file(&path).unwrap();

        assert_eq!(config.playback.progress_interval_ms, 500);
        assert!(config.playback.first_play_hides_overlay);
        assert_eq!(config.media.source_url, DEFAULT_SOURCE_URL);
    }

    #[test]
    fn test_later_file_layers_over_earlier() {
        let dir = tempfile::tempdir().unwrap();
        let user = dir.path().join("user.toml");
        let explicit = dir.path().join("explicit.toml");
        std::fs::write(
            &user,
            "[pip]\nenabled = false\n\n[playback]\nprogress_interval_ms = 250\n",
        )
        .unwrap();
        std::fs::write(&explicit, "[playback]\nplaceholder_aspect_ratio = 0.75\n").unwrap();

        let mut config = Config::default();
        config.merge_from_file(&user).unwrap();
        config.merge_from_file(&explicit).unwrap();

        assert!(!config.pip.enabled);
        assert_eq!(config.playback.progress_interval_ms, 250);
        assert_eq!(config.playback.placeholder_aspect_ratio, 0.75);
        assert!(config.pip.auto_start_on_background);
    }

    #[test]
    #[serial]
    fn test_load_layers_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.toml");
        let second = dir.path().join("second.toml");
        std::fs::write(
            &first,
            "[media]\nsource_url = \"https://example.com/a.mp4\"\n\n[pip]\nenabled = false\n",
        )
        .unwrap();
        std::fs::write(&second, "[media]\nsource_url = \"https://example.com/b.mp4\"\n").unwrap();

        let config = Config::load_layers(&[&first, &second]).unwrap();
        assert!(!config.pip.enabled);

        let reversed = Config::load_layers(&[&second, &first]).unwrap();
        assert!(!reversed.pip.enabled);
        if std::env::var("PIPVIEW_SOURCE_URL").is_err() {
            assert_eq!(config.media.source_url, "https://example.com/b.mp4");
            assert_eq!(reversed.media.source_url, "https://example.com/a.mp4");
        }
    }

    #[test]
    fn test_merge_replaces_scalars_and_keeps_siblings() {
        let mut base: toml::Value =
            toml::from_str::<toml::Table>("[a]\nx = 1\ny = 2\n").unwrap().into();
        let overlay: toml::Value =
            toml::from_str::<toml::Table>("[a]\ny = 3\nz = 4\n").unwrap().into();
        merge_toml(&mut base, overlay);

        assert_eq!(base["a"]["x"].as_integer(), Some(1));
        assert_eq!(base["a"]["y"].as_integer(), Some(3));
        assert_eq!(base["a"]["z"].as_integer(), Some(4));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.pip.enabled = false;
        config.audio.mode = AudioMode::Default;
        config.save_to(&path).unwrap();

        let mut reloaded = Config::default();
        reloaded.merge_from_file(&path).unwrap();
        assert!(!reloaded.pip.enabled);
        assert_eq!(reloaded.audio.mode, AudioMode::Default);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[playback\n").unwrap();

        let err = Config::default().merge_from_file(&path).unwrap_err();
        assert!(matches!(err, PipViewError::Config(_)));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("PIPVIEW_SOURCE_URL", "https://example.com/clip.mp4");
        std::env::set_var("PIPVIEW_AUTO_PIP", "false");

        let mut config = Config::default();
        let result = config.apply_env_overrides();

        std::env::remove_var("PIPVIEW_SOURCE_URL");
        std::env::remove_var("PIPVIEW_AUTO_PIP");

        assert!(result.is_ok());
        assert_eq!(config.media.source_url, "https://example.com/clip.mp4");
        assert!(!config.pip.auto_start_on_background);
    }

    #[test]
    #[serial]
    fn test_invalid_env_override() {
        std::env::set_var("PIPVIEW_PROGRESS_INTERVAL_MS", "soon");
        let result = Config::default().apply_env_overrides();
        std::env::remove_var("PIPVIEW_PROGRESS_INTERVAL_MS");

        assert!(matches!(result, Err(PipViewError::Config(_))));
    }
}
