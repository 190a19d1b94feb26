//! Simulated media backend and player
//!
//! Time only moves when a handle calls `advance`; observers and end-of-media
//! subscribers fire synchronously from that call.

use crate::asset::{LoadedAsset, MediaBackend, MediaSource, NaturalSize, TrackInfo, TrackKind};
use crate::lifecycle::Subscription;
use crate::player::{MediaPlayer, NotifyCallback, SeekCompletion, TimeCallback, TimeObserverToken};
use crate::utils::error::{AssetLoadError, Result};
use crate::view::SurfaceHandle;
use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Asset served by the simulated backend
#[derive(Debug, Clone, PartialEq)]
pub struct SimAsset {
    pub tracks: Vec<TrackInfo>,
    pub natural_size: NaturalSize,
    pub duration: Option<Duration>,
}

impl SimAsset {
    /// H.264 video plus an AAC audio track
    pub fn video(width: u32, height: u32, duration: Duration) -> Self {
        Self {
            tracks: vec![
                TrackInfo::new(1, TrackKind::Video, "h264"),
                TrackInfo::new(2, TrackKind::Audio, "aac"),
            ],
            natural_size: NaturalSize::new(width as f64, height as f64),
            duration: Some(duration),
        }
    }

    pub fn audio_only(duration: Duration) -> Self {
        Self {
            tracks: vec![TrackInfo::new(1, TrackKind::Audio, "aac")],
            natural_size: NaturalSize::new(0.0, 0.0),
            duration: Some(duration),
        }
    }
}

#[derive(Default)]
struct BackendState {
    assets: HashMap<String, std::result::Result<SimAsset, AssetLoadError>>,
    latency: Duration,
    players: Vec<SimPlayerHandle>,
}

/// Media backend serving assets from memory
#[derive(Clone, Default)]
pub struct SimMediaBackend {
    state: Arc<Mutex<BackendState>>,
}

impl SimMediaBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `asset` at `url`
    pub fn insert(&self, url: &str, asset: SimAsset) {
        self.state.lock().assets.insert(url.to_string(), Ok(asset));
    }

    /// Fail every load of `url` with `error`
    pub fn fail(&self, url: &str, error: AssetLoadError) {
        self.state.lock().assets.insert(url.to_string(), Err(error));
    }

    /// Delay applied to each metadata request
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    pub fn players_created(&self) -> usize {
        self.state.lock().players.len()
    }

    /// Handle to the most recently constructed player
    pub fn last_player(&self) -> Option<SimPlayerHandle> {
        self.state.lock().players.last().cloned()
    }

    async fn lookup(&self, source: &MediaSource) -> Result<SimAsset> {
        let (latency, entry) = {
            let state = self.state.lock();
            (state.latency, state.assets.get(source.as_str()).cloned())
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        match entry {
            Some(Ok(asset)) => Ok(asset),
            Some(Err(e)) => Err(e.into()),
            None => Err(AssetLoadError::NotFound(source.to_string()).into()),
        }
    }
}

#[async_trait]
impl MediaBackend for SimMediaBackend {
    async fn load_tracks(&self, source: &MediaSource) -> Result<Vec<TrackInfo>> {
        Ok(self.lookup(source).await?.tracks)
    }

    async fn load_natural_size(
        &self,
        source: &MediaSource,
        track: &TrackInfo,
    ) -> Result<NaturalSize> {
        let asset = self.lookup(source).await?;
        debug!("Natural size of track {} is {:?}", track.id, asset.natural_size);
        Ok(asset.natural_size)
    }

    fn make_player(&self, asset: &LoadedAsset) -> Result<Box<dyn MediaPlayer>> {
        let mut state = self.state.lock();
        let duration = match state.assets.get(asset.source.as_str()) {
            Some(Ok(sim)) => sim.duration,
            _ => return Err(AssetLoadError::NotFound(asset.source.to_string()).into()),
        };

        let surface = SurfaceHandle(state.players.len() as u64 + 1);
        let (player, handle) = SimPlayer::new(surface, duration);
        state.players.push(handle);
        Ok(Box::new(player))
    }
}

struct Observer {
    id: u64,
    interval: Duration,
    callback: Arc<dyn Fn(Duration) + Send + Sync>,
}

#[derive(Default)]
struct PlayerState {
    playing: bool,
    time: Duration,
    duration: Option<Duration>,
    next_id: u64,
    observers: Vec<Observer>,
    observers_removed: u32,
    end_subscribers: Vec<(u64, Arc<dyn Fn() + Send + Sync>)>,
    hold_seeks: bool,
    pending_seeks: Vec<(Duration, SeekCompletion)>,
    seeks: Vec<Duration>,
}

/// Player over a virtual clock
pub struct SimPlayer {
    surface: SurfaceHandle,
    state: Arc<Mutex<PlayerState>>,
}

impl SimPlayer {
    pub fn new(surface: SurfaceHandle, duration: Option<Duration>) -> (Self, SimPlayerHandle) {
        let state = Arc::new(Mutex::new(PlayerState {
            duration,
            ..PlayerState::default()
        }));
        let handle = SimPlayerHandle {
            surface,
            state: Arc::clone(&state),
        };
        (Self { surface, state }, handle)
    }

    /// A player not owned by any backend
    pub fn standalone(duration: Option<Duration>) -> (Self, SimPlayerHandle) {
        Self::new(SurfaceHandle(1), duration)
    }
}

impl MediaPlayer for SimPlayer {
    fn play(&mut self) {
        self.state.lock().playing = true;
    }

    fn pause(&mut self) {
        self.state.lock().playing = false;
    }

    fn seek(&mut self, to: Duration, on_complete: SeekCompletion) {
        let mut state = self.state.lock();
        state.seeks.push(to);
        if state.hold_seeks {
            state.pending_seeks.push((to, on_complete));
            return;
        }
        state.time = to;
        drop(state);
        on_complete(true);
    }

    fn current_time(&self) -> Duration {
        self.state.lock().time
    }

    fn duration(&self) -> Option<Duration> {
        self.state.lock().duration
    }

    fn surface(&self) -> SurfaceHandle {
        self.surface
    }

    fn add_periodic_time_observer(
        &mut self,
        interval: Duration,
        callback: TimeCallback,
    ) -> TimeObserverToken {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.observers.push(Observer {
            id,
            interval,
            callback: Arc::from(callback),
        });
        TimeObserverToken::new(id)
    }

    fn remove_time_observer(&mut self, token: TimeObserverToken) {
        let mut state = self.state.lock();
        let before = state.observers.len();
        state.observers.retain(|observer| observer.id != token.id());
        if state.observers.len() < before {
            state.observers_removed += 1;
        }
    }

    fn subscribe_end_of_media(&mut self, callback: NotifyCallback) -> Subscription {
        let id = {
            let mut state = self.state.lock();
            state.next_id += 1;
            let id = state.next_id;
            state.end_subscribers.push((id, Arc::from(callback)));
            id
        };

        let state = Arc::clone(&self.state);
        Subscription::new("end-of-media", move || {
            state.lock().end_subscribers.retain(|(sub, _)| *sub != id);
        })
    }
}

/// Test-side handle on a `SimPlayer`
#[derive(Clone)]
pub struct SimPlayerHandle {
    surface: SurfaceHandle,
    state: Arc<Mutex<PlayerState>>,
}

impl SimPlayerHandle {
    /// Move the clock forward by `by` if playing.
    ///
    /// Fires every observer interval crossed, then end-of-media when the
    /// clock reaches the duration.
    pub fn advance(&self, by: Duration) {
        let mut ticks: Vec<(Duration, Arc<dyn Fn(Duration) + Send + Sync>)> = Vec::new();
        let mut ended = Vec::new();
        {
            let mut state = self.state.lock();
            if !state.playing {
                return;
            }

            let start = state.time;
            let mut end = start + by;
            if let Some(total) = state.duration {
                if end >= total {
                    end = total;
                    if start < total {
                        state.playing = false;
                        ended = state
                            .end_subscribers
                            .iter()
                            .map(|(_, cb)| Arc::clone(cb))
                            .collect();
                    }
                }
            }
            state.time = end;

            for observer in &state.observers {
                let step = observer.interval.as_nanos();
                if step == 0 {
                    continue;
                }
                let mut k = start.as_nanos() / step + 1;
                while step * k <= end.as_nanos() {
                    let at = Duration::from_nanos((step * k) as u64);
                    ticks.push((at, Arc::clone(&observer.callback)));
                    k += 1;
                }
            }
        }

        ticks.sort_by_key(|(at, _)| *at);
        for (at, callback) in ticks {
            callback(at);
        }
        for callback in ended {
            callback();
        }
    }

    /// Hold seek completions until `complete_seeks`
    pub fn hold_seeks(&self, hold: bool) {
        self.state.lock().hold_seeks = hold;
    }

    /// Settle every held seek
    pub fn complete_seeks(&self, finished: bool) {
        let pending: Vec<_> = {
            let mut state = self.state.lock();
            let pending: Vec<_> = state.pending_seeks.drain(..).collect();
            if finished {
                if let Some((to, _)) = pending.last() {
                    state.time = *to;
                }
            }
            pending
        };
        for (_, on_complete) in pending {
            on_complete(finished);
        }
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.state.lock().seeks.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    pub fn current_time(&self) -> Duration {
        self.state.lock().time
    }

    pub fn surface(&self) -> SurfaceHandle {
        self.surface
    }

    pub fn observer_count(&self) -> usize {
        self.state.lock().observers.len()
    }

    pub fn observers_removed(&self) -> u32 {
        self.state.lock().observers_removed
    }

    pub fn end_subscriber_count(&self) -> usize {
        self.state.lock().end_subscribers.len()
    }
}
