//! Utility module for pipview
//!
//! This module provides common utilities used throughout the crate:
//! - Error handling with custom error types
//! - Configuration management
//! - Common helper functions

pub mod config;
pub mod error;

// Re-export commonly used items
pub use config::{AudioConfig, Config, MediaConfig, PipConfig, PlaybackConfig};
pub use error::{AssetLoadError, PipViewError, Result};

use std::path::Path;

/// Initialize the screen configuration
///
/// Loads configuration from:
/// 1. Default values
/// 2. System configuration file
/// 3. User configuration file
/// 4. The explicitly given file
/// 5. Environment variables
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    Config::load(explicit)
}

/// Format a duration for display
///
/// Formatted string in the format "HH:MM:SS" or "MM:SS" for durations under an hour
pub fn format_duration(duration: std::time::Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
