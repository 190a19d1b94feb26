//! Integration test utilities for pipview
//!
//! This module provides a fixture that wires a `ScreenController` to the
//! simulated host and helpers to let asynchronous loads settle.

use anyhow::{bail, Result};
use pipview::player::{PlaybackState, ScreenController};
use pipview::sim::{RecordingView, SimAsset, SimHost, SimPlayerHandle, ViewRecorder};
use pipview::utils::Config;
use std::path::Path;
use std::time::Duration;

/// URL every fixture serves its asset at
pub const TEST_URL: &str = "https://media.example.com/sample/clip.mp4";

/// One screen wired to a simulated host
pub struct ScreenFixture {
    pub host: SimHost,
    pub view: ViewRecorder,
    pub screen: ScreenController,
}

impl ScreenFixture {
    /// Build a screen serving `asset` at `TEST_URL`; `did_load` is not called
    pub fn new(asset: Option<SimAsset>) -> Result<Self> {
        Self::with_config(test_config(), asset)
    }

    pub fn with_config(config: Config, asset: Option<SimAsset>) -> Result<Self> {
        let host = SimHost::new();
        if let Some(asset) = asset {
            host.media.insert(&config.media.source_url, asset);
        }

        let (view, recorder) = RecordingView::new();
        let screen = host.builder(config).with_view(Box::new(view)).build()?;
        Ok(Self {
            host,
            view: recorder,
            screen,
        })
    }

    /// Build, bring the screen up and wait until the session is ready
    pub async fn ready(asset: SimAsset) -> Result<Self> {
        let mut fixture = Self::new(Some(asset))?;
        fixture.screen.did_load();
        fixture.settle().await?;
        if fixture.screen.playback_state() != PlaybackState::Ready {
            bail!("screen not ready: {:?}", fixture.screen.playback_state());
        }
        Ok(fixture)
    }

    /// Pump the UI queue until nothing is loading any more
    pub async fn settle(&mut self) -> Result<()> {
        for _ in 0..500 {
            self.screen.pump();
            if self.screen.playback_state() != PlaybackState::Loading {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        bail!("load did not settle")
    }

    /// Handle to the player backing the live session
    pub fn player(&self) -> Result<SimPlayerHandle> {
        match self.host.media.last_player() {
            Some(player) => Ok(player),
            None => bail!("no player constructed"),
        }
    }

    /// Advance the clock and apply whatever the player posted
    pub fn advance(&mut self, by: Duration) -> Result<usize> {
        self.player()?.advance(by);
        Ok(self.screen.pump())
    }
}

/// Default configuration pointed at `TEST_URL`
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.media.source_url = TEST_URL.to_string();
    config
}

/// Write `contents` as the config file `name` under `dir`
pub fn write_config(dir: &Path, name: &str, contents: &str) -> Result<std::path::PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}
