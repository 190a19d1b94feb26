//! Simulated host for pipview
//!
//! In-memory implementations of every host collaborator: media backend and
//! player on a virtual clock, PiP, app lifecycle, audio session and a view
//! that records what it is told. Used by the CLI and by the tests.

mod host;
mod media;
mod pip;
mod view;

pub use host::{SimAppLifecycle, SimAudioRouting};
pub use media::{SimAsset, SimMediaBackend, SimPlayer, SimPlayerHandle};
pub use pip::{SimPipBackend, SimPipHandle};
pub use view::{RecordingView, ViewRecorder};

use crate::player::{ScreenController, ScreenControllerBuilder};
use crate::utils::config::Config;
use std::sync::Arc;

/// Every simulated collaborator of one screen
#[derive(Clone, Default)]
pub struct SimHost {
    pub media: SimMediaBackend,
    pub pip: SimPipBackend,
    pub app: SimAppLifecycle,
    pub audio: SimAudioRouting,
}

impl SimHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder wired to this host; the caller still supplies the view
    pub fn builder(&self, config: Config) -> ScreenControllerBuilder {
        ScreenController::builder()
            .with_config(config)
            .with_media_backend(Arc::new(self.media.clone()))
            .with_pip_backend(Arc::new(self.pip.clone()))
            .with_app_lifecycle(Arc::new(self.app.clone()))
            .with_audio_routing(Arc::new(self.audio.clone()))
    }
}
