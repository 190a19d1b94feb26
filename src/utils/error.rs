//! Error types for pipview
//!
//! This module defines custom error types used throughout the crate.
//! We use thiserror for convenient error type definitions and anyhow for
//! application-level error handling in the binary.

use crate::player::PlaybackState;
use thiserror::Error;

/// Main error type for pipview
#[derive(Error, Debug)]
pub enum PipViewError {
    /// Asset could not be resolved into a playable video
    #[error("Asset load failed: {0}")]
    AssetLoad(#[from] AssetLoadError),

    /// Audio session could not be configured for background playback
    #[error("Audio session error: {0}")]
    AudioSession(String),

    /// Picture-in-Picture refused to start
    #[error("PiP start failed: {0}")]
    PipStart(String),

    /// Picture-in-Picture could not be set up on this surface
    #[error("PiP unavailable: {0}")]
    PipUnavailable(String),

    /// Playback session was asked for a transition it does not allow
    #[error("Invalid transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: PlaybackState,
        to: PlaybackState,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File error: {0}")]
    FileIO(#[from] std::io::Error),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error for unexpected situations
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Reasons an asset never reaches the ready state
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetLoadError {
    /// Transport failure while fetching the resource
    #[error("network error: {0}")]
    Network(String),

    /// The locator did not resolve to a resource
    #[error("not found: {0}")]
    NotFound(String),

    /// The resource has no video track
    #[error("no video track in {0}")]
    NoVideoTrack(String),

    /// The video track reported an unusable natural size
    #[error("invalid natural size {width}x{height}")]
    InvalidNaturalSize { width: f64, height: f64 },
}

/// Convenience type alias for Results in pipview
pub type Result<T> = std::result::Result<T, PipViewError>;

/// Extension trait for converting other errors to PipViewError
pub trait IntoPlayerError<T> {
    /// Convert this error into a PipViewError with the given context
    fn config_err(self, context: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> IntoPlayerError<T> for std::result::Result<T, E> {
    fn config_err(self, context: &str) -> Result<T> {
        self.map_err(|e| PipViewError::Config(format!("{}: {}", context, e)))
    }
}
