//! Audio routing module for pipview
//!
//! The host owns the audio session; the screen only asks for a
//! background-capable playback category once at startup. Failures are
//! logged and playback continues with whatever category the host keeps.

use crate::utils::config::AudioConfig;
use crate::utils::error::Result;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Audio session category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCategory {
    /// Ambient audio that mixes with others and obeys the silent switch
    Ambient,

    /// Primary playback that keeps playing when muted or backgrounded
    Playback,
}

/// Audio session mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioMode {
    /// No mode-specific processing
    Default,

    /// Tuned for film and video playback
    MoviePlayback,
}

impl AudioCategory {
    /// Whether audio in this category survives the app going to the background
    pub fn allows_background(self) -> bool {
        matches!(self, AudioCategory::Playback)
    }
}

/// Audio routing trait implemented by the host
#[cfg_attr(test, mockall::automock)]
pub trait AudioRouting: Send + Sync {
    /// Request a session category and mode
    fn set_category(&self, category: AudioCategory, mode: AudioMode) -> Result<()>;

    /// Activate or deactivate the session
    fn set_active(&self, active: bool) -> Result<()>;
}

/// Configure the audio session for playback.
///
/// Returns `true` when the requested configuration was fully applied.
/// Errors never propagate: the caller keeps going with the host's default.
pub fn configure_audio_session(routing: &dyn AudioRouting, config: &AudioConfig) -> bool {
    if let Err(e) = routing.set_category(config.category, config.mode) {
        warn!("Audio session category not applied: {}", e);
        return false;
    }

    if config.activate {
        if let Err(e) = routing.set_active(true) {
            warn!("Audio session activation failed: {}", e);
            return false;
        }
    }

    info!(
        "Audio session configured: {:?}/{:?} (background: {})",
        config.category,
        config.mode,
        config.category.allows_background()
    );
    true
}
