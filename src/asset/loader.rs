//! Asynchronous asset loading
//!
//! Loading runs on the tokio runtime and never touches screen state. The
//! result is posted to the UI queue; if the screen is gone by then the
//! result is dropped.

use crate::asset::{LoadedAsset, MediaBackend, MediaSource, TrackKind};
use crate::player::{UiEvent, UiSender};
use crate::utils::error::{AssetLoadError, Result};
use log::{debug, info};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Resolves tracks and video size of a media source
#[derive(Clone)]
pub struct AssetLoader {
    backend: Arc<dyn MediaBackend>,
}

impl AssetLoader {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self { backend }
    }

    /// Resolve the asset's tracks and the first video track's natural size
    pub async fn load(&self, source: MediaSource) -> Result<LoadedAsset> {
        info!("Loading asset: {}", source);

        let tracks = self.backend.load_tracks(&source).await?;
        debug!("{} reports {} tracks", source, tracks.len());

        let video_track = tracks
            .iter()
            .find(|track| track.kind == TrackKind::Video)
            .cloned()
            .ok_or_else(|| AssetLoadError::NoVideoTrack(source.to_string()))?;

        let natural_size = self.backend.load_natural_size(&source, &video_track).await?;
        if !natural_size.is_valid() {
            return Err(AssetLoadError::InvalidNaturalSize {
                width: natural_size.width,
                height: natural_size.height,
            }
            .into());
        }

        info!(
            "Asset ready: {} ({}x{}, codec {})",
            source, natural_size.width, natural_size.height, video_track.codec
        );

        Ok(LoadedAsset {
            source,
            tracks,
            video_track,
            natural_size,
        })
    }

    /// Load on `runtime` and post the outcome to the UI queue
    pub fn spawn(
        &self,
        runtime: &Handle,
        source: MediaSource,
        generation: u64,
        tx: UiSender,
    ) -> JoinHandle<()> {
        let loader = self.clone();
        runtime.spawn(async move {
            let result = loader.load(source).await;
            if tx.send(UiEvent::AssetLoaded { generation, result }).is_err() {
                debug!("Screen torn down before load {} finished; result dropped", generation);
            }
        })
    }
}
