//! Asset module for pipview
//!
//! This module describes remote media assets and the backend that resolves
//! them: which tracks an asset has, the natural size of its video track, and
//! how a player is constructed once the asset is known to be playable.

mod loader;

pub use loader::AssetLoader;

use crate::player::MediaPlayer;
use crate::utils::error::{PipViewError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Locator of the asset to play. Immutable once chosen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaSource {
    url: String,
}

impl MediaSource {
    const SCHEMES: [&'static str; 3] = ["http://", "https://", "file://"];

    /// Validate a locator string
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(PipViewError::InvalidInput("empty media locator".to_string()));
        }

        let lower = url.to_ascii_lowercase();
        let scheme = Self::SCHEMES
            .iter()
            .find(|scheme| lower.starts_with(*scheme))
            .ok_or_else(|| {
                PipViewError::InvalidInput(format!("unsupported media locator: {}", url))
            })?;

        if url.len() == scheme.len() {
            return Err(PipViewError::InvalidInput(format!("media locator has no path: {}", url)));
        }

        Ok(Self { url: url.to_string() })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Kind of media carried by a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Video,
    Audio,
    Subtitle,
    Other,
}

/// Track description as reported by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub id: u32,
    pub kind: TrackKind,
    pub codec: String,
}

impl TrackInfo {
    pub fn new(id: u32, kind: TrackKind, codec: &str) -> Self {
        Self {
            id,
            kind,
            codec: codec.to_string(),
        }
    }
}

/// Natural (encoded) size of a video track in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NaturalSize {
    pub width: f64,
    pub height: f64,
}

impl NaturalSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both dimensions finite and strictly positive
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Asset whose tracks and video size are resolved
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAsset {
    pub source: MediaSource,
    pub tracks: Vec<TrackInfo>,
    pub video_track: TrackInfo,
    pub natural_size: NaturalSize,
}

/// Media backend provided by the host platform
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Fetch the asset and list its tracks
    async fn load_tracks(&self, source: &MediaSource) -> Result<Vec<TrackInfo>>;

    /// Resolve the natural size of one of the asset's tracks
    async fn load_natural_size(
        &self,
        source: &MediaSource,
        track: &TrackInfo,
    ) -> Result<NaturalSize>;

    /// Construct a playable item and a player bound to it
    fn make_player(&self, asset: &LoadedAsset) -> Result<Box<dyn MediaPlayer>>;
}
