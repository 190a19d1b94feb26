//! Screen controller for pipview
//!
//! This module provides the `ScreenController` that orchestrates asset
//! loading, layout, the playback session, progress, overlay and lifecycle
//! handling for one playback screen. It lives on the UI-affinity thread:
//! collaborators post `UiEvent`s to its queue and `pump` applies them.

use crate::asset::{AssetLoader, LoadedAsset, MediaBackend, MediaSource};
use crate::audio::{configure_audio_session, AudioRouting};
use crate::layout::{AspectDescriptor, LayoutAdapter};
use crate::lifecycle::{
    AppLifecycle, ChannelPipDelegate, LifecycleCoordinator, PipBackend, PipController,
    UnsupportedPip,
};
use crate::player::{
    ButtonIcon, OverlayController, PlaybackSession, PlaybackState, ProgressReporter, ToggleAction,
    UiEvent, UiSender,
};
use crate::utils::config::Config;
use crate::utils::error::{PipViewError, Result};
use crate::view::{ScreenView, SurfaceHandle};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// Builder for a screen controller
pub struct ScreenControllerBuilder {
    config: Config,
    backend: Option<Arc<dyn MediaBackend>>,
    pip: Option<Arc<dyn PipBackend>>,
    app: Option<Arc<dyn AppLifecycle>>,
    audio: Option<Arc<dyn AudioRouting>>,
    view: Option<Box<dyn ScreenView>>,
    runtime: Option<Handle>,
}

impl ScreenControllerBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            backend: None,
            pip: None,
            app: None,
            audio: None,
            view: None,
            runtime: None,
        }
    }

    /// Set screen configuration
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set the media backend
    pub fn with_media_backend(mut self, backend: Arc<dyn MediaBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set the PiP backend; hosts without one get no PiP
    pub fn with_pip_backend(mut self, pip: Arc<dyn PipBackend>) -> Self {
        self.pip = Some(pip);
        self
    }

    /// Set the app lifecycle source
    pub fn with_app_lifecycle(mut self, app: Arc<dyn AppLifecycle>) -> Self {
        self.app = Some(app);
        self
    }

    /// Set the audio routing collaborator
    pub fn with_audio_routing(mut self, audio: Arc<dyn AudioRouting>) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Set the host view
    pub fn with_view(mut self, view: Box<dyn ScreenView>) -> Self {
        self.view = Some(view);
        self
    }

    /// Runtime used for asset loading; defaults to the current one
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the screen controller
    pub fn build(self) -> Result<ScreenController> {
        self.config.validate()?;

        let backend = self
            .backend
            .ok_or_else(|| PipViewError::InvalidInput("a media backend is required".to_string()))?;
        let app = self
            .app
            .ok_or_else(|| {
                PipViewError::InvalidInput("an app lifecycle source is required".to_string())
            })?;
        let view = self
            .view
            .ok_or_else(|| PipViewError::InvalidInput("a screen view is required".to_string()))?;
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current()
                .map_err(|e| PipViewError::Internal(format!("No tokio runtime available: {}", e)))?,
        };

        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let config = self.config;

        Ok(ScreenController {
            loader: AssetLoader::new(Arc::clone(&backend)),
            backend,
            pip_backend: self.pip.unwrap_or_else(|| Arc::new(UnsupportedPip)),
            app,
            audio: self.audio,
            view,
            runtime,
            slot: SessionSlot::Absent,
            layout: LayoutAdapter::new(),
            progress: ProgressReporter::new(config.playback.progress_interval()),
            overlay: OverlayController::new(config.playback.first_play_hides_overlay),
            lifecycle: LifecycleCoordinator::new(config.pip.auto_start_on_background),
            config,
            events_tx,
            events_rx,
            next_generation: 0,
            loaded: false,
            _ui_thread: PhantomData,
        })
    }
}

impl Default for ScreenControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Session slot: nothing yet, metadata in flight, or a live session
enum SessionSlot {
    Absent,
    Loading { generation: u64, source: MediaSource },
    Ready(Box<PlaybackSession>),
}

/// Serializable view of the screen state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenSnapshot {
    pub state: PlaybackState,
    pub source: Option<String>,
    pub icon: ButtonIcon,
    pub overlay_hidden: bool,
    pub surface_hidden: bool,
    pub aspect_ratio: Option<f64>,
    pub progress: Option<f32>,
    pub elapsed_secs: f64,
    pub duration_secs: Option<f64>,
    pub pip_available: bool,
    pub pip_active: bool,
    /// Aspect constraints swapped in since the screen loaded
    pub aspect_swaps: u32,
    /// Progress samples pushed to the view
    pub progress_samples: u64,
    pub time_observer: bool,
    pub pip_auto_starts: u32,
    /// Live notification subscriptions
    pub subscriptions: usize,
}

/// Controller of one playback screen.
///
/// Not `Send`: every method must be called on the thread that owns it.
pub struct ScreenController {
    config: Config,
    backend: Arc<dyn MediaBackend>,
    loader: AssetLoader,
    pip_backend: Arc<dyn PipBackend>,
    app: Arc<dyn AppLifecycle>,
    audio: Option<Arc<dyn AudioRouting>>,
    view: Box<dyn ScreenView>,
    runtime: Handle,

    slot: SessionSlot,
    layout: LayoutAdapter,
    progress: ProgressReporter,
    overlay: OverlayController,
    lifecycle: LifecycleCoordinator,

    events_tx: UiSender,
    events_rx: Receiver<UiEvent>,
    next_generation: u64,
    loaded: bool,

    _ui_thread: PhantomData<*const ()>,
}

impl ScreenController {
    /// Start a builder
    pub fn builder() -> ScreenControllerBuilder {
        ScreenControllerBuilder::new()
    }

    /// Bring the screen up: audio session, initial view state, app-state
    /// observation, and loading of the configured source.
    pub fn did_load(&mut self) {
        if self.loaded {
            debug!("Screen already loaded");
            return;
        }
        self.loaded = true;

        match &self.audio {
            Some(audio) => {
                configure_audio_session(audio.as_ref(), &self.config.audio);
            }
            None => debug!("No audio routing collaborator; keeping host defaults"),
        }

        self.overlay.install(&mut *self.view);
        self.view.set_progress(0.0, Duration::ZERO);
        match AspectDescriptor::new(self.config.playback.placeholder_aspect_ratio) {
            Ok(placeholder) => self.layout.install_placeholder(&mut *self.view, placeholder),
            Err(e) => warn!("Placeholder aspect ratio rejected: {}", e),
        }

        self.lifecycle.observe_app_state(self.app.as_ref(), self.events_tx.clone());

        let url = self.config.media.source_url.clone();
        match MediaSource::parse(&url) {
            Ok(source) => {
                if let Err(e) = self.load(source) {
                    error!("Failed to start loading {}: {}", url, e);
                }
            }
            Err(e) => error!("Failed to load video: {}", e),
        }
    }

    /// Accept a media source and start resolving it off the UI thread.
    ///
    /// Returns the generation tagging this load.
    pub fn load(&mut self, source: MediaSource) -> Result<u64> {
        if !matches!(self.slot, SessionSlot::Absent) {
            return Err(PipViewError::InvalidTransition {
                from: self.playback_state(),
                to: PlaybackState::Loading,
            });
        }

        self.next_generation += 1;
        let generation = self.next_generation;

        self.loader
            .spawn(&self.runtime, source.clone(), generation, self.events_tx.clone());
        self.slot = SessionSlot::Loading { generation, source };
        Ok(generation)
    }

    /// Sender collaborators can use to reach this screen's UI queue
    pub fn event_sender(&self) -> UiSender {
        self.events_tx.clone()
    }

    /// Apply every queued event. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Block for at most `timeout` until an event arrives, then pump.
    ///
    /// Returns whether anything was handled.
    pub fn wait_event(&mut self, timeout: Duration) -> bool {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => {
                self.handle_event(event);
                self.pump();
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Apply one event on the UI thread
    pub fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::AssetLoaded { generation, result } => self.on_asset_loaded(generation, result),
            UiEvent::TimeTick { generation, elapsed } => {
                let SessionSlot::Ready(session) = &mut self.slot else {
                    return;
                };
                if session.generation() != generation {
                    debug!("Stale time tick for generation {}", generation);
                    return;
                }
                let duration = session.duration();
                self.progress.on_tick(elapsed, duration, &mut *self.view);
            }
            UiEvent::EndOfMedia { generation } => match &mut self.slot {
                SessionSlot::Ready(session) if session.generation() == generation => {
                    self.lifecycle
                        .on_end_of_media(session, &mut self.overlay, &mut *self.view);
                }
                _ => debug!("Stale end of media for generation {}", generation),
            },
            UiEvent::SeekCompleted { generation, finished } => {
                self.on_seek_completed(generation, finished)
            }
            UiEvent::DidEnterBackground => {
                let session = match &mut self.slot {
                    SessionSlot::Ready(session) => Some(session.as_mut()),
                    _ => None,
                };
                self.lifecycle.on_did_enter_background(session);
            }
            UiEvent::Pip { generation, event } => {
                if !self.is_live(generation) {
                    debug!("Stale PiP event for generation {}", generation);
                    return;
                }
                self.lifecycle.on_pip_event(event, &mut *self.view);
            }
        }
    }

    /// The transport button: restart, pause or play depending on state.
    ///
    /// Ignored while no session exists.
    pub fn toggle_play_pause(&mut self) {
        let SessionSlot::Ready(session) = &mut self.slot else {
            debug!("Toggle ignored: no playback session");
            return;
        };

        match session.toggle_action() {
            ToggleAction::Restart => {
                let tx = self.events_tx.clone();
                let generation = session.generation();
                let completion = Box::new(move |finished| {
                    let _ = tx.send(UiEvent::SeekCompleted { generation, finished });
                });
                match session.restart(completion) {
                    Ok(()) => info!("Restarting from the beginning"),
                    Err(e) => warn!("Restart rejected: {}", e),
                }
            }
            ToggleAction::Pause => match session.pause() {
                Ok(()) => self.overlay.set_icon(ButtonIcon::Play, &mut *self.view),
                Err(e) => warn!("Pause rejected: {}", e),
            },
            ToggleAction::Play => {
                let at_start = session.current_time().is_zero();
                self.overlay.on_play_command(at_start, &mut *self.view);
                match session.play() {
                    Ok(()) => self.overlay.set_icon(ButtonIcon::Pause, &mut *self.view),
                    Err(e) => warn!("Play rejected: {}", e),
                }
            }
            ToggleAction::Ignore => debug!("Toggle ignored while seeking"),
        }
    }

    /// Seek the session; ignored while no session exists
    pub fn seek(&mut self, to: Duration) {
        let SessionSlot::Ready(session) = &mut self.slot else {
            debug!("Seek ignored: no playback session");
            return;
        };

        let tx = self.events_tx.clone();
        let generation = session.generation();
        let completion = Box::new(move |finished| {
            let _ = tx.send(UiEvent::SeekCompleted { generation, finished });
        });
        if let Err(e) = session.begin_seek(to, completion) {
            warn!("Seek rejected: {}", e);
        }
    }

    /// Tap anywhere over the player surface
    pub fn handle_overlay_tap(&mut self) {
        self.overlay.handle_tap(&mut *self.view);
    }

    /// The inline PiP button
    pub fn toggle_pip(&mut self) {
        let session = match &mut self.slot {
            SessionSlot::Ready(session) => Some(session.as_mut()),
            _ => None,
        };
        self.lifecycle.toggle_pip(session);
    }

    /// Host layout pass: keep the player surface matched to its container
    pub fn layout_subviews(&mut self) {
        if matches!(self.slot, SessionSlot::Ready(_)) {
            self.view.sync_surface_frame();
        }
    }

    /// Release the session and every subscription.
    ///
    /// The time observer is removed before the player is dropped.
    pub fn teardown(&mut self) {
        if let SessionSlot::Ready(session) = &mut self.slot {
            self.progress.deregister(session.player_mut());
        }
        self.lifecycle.dispose();
        self.layout.release(&mut *self.view);

        if !matches!(self.slot, SessionSlot::Absent) {
            info!("Tearing down playback screen");
        }
        self.slot = SessionSlot::Absent;
    }

    pub fn playback_state(&self) -> PlaybackState {
        match &self.slot {
            SessionSlot::Absent => PlaybackState::Idle,
            SessionSlot::Loading { .. } => PlaybackState::Loading,
            SessionSlot::Ready(session) => session.state(),
        }
    }

    pub fn button_icon(&self) -> ButtonIcon {
        self.overlay.icon()
    }

    pub fn overlay_hidden(&self) -> bool {
        self.overlay.is_hidden()
    }

    pub fn aspect(&self) -> Option<AspectDescriptor> {
        self.layout.current()
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        match &self.slot {
            SessionSlot::Ready(session) => Some(session.as_ref()),
            _ => None,
        }
    }

    /// Snapshot of the current state
    pub fn snapshot(&self) -> ScreenSnapshot {
        let session = self.session();
        let source = match &self.slot {
            SessionSlot::Absent => None,
            SessionSlot::Loading { source, .. } => Some(source.to_string()),
            SessionSlot::Ready(session) => Some(session.source().to_string()),
        };

        ScreenSnapshot {
            state: self.playback_state(),
            source,
            icon: self.overlay.icon(),
            overlay_hidden: self.overlay.is_hidden(),
            surface_hidden: self.lifecycle.surface_hidden(),
            aspect_ratio: self.layout.current().map(|aspect| aspect.ratio()),
            progress: self.progress.last_sample().map(|sample| sample.fraction()),
            elapsed_secs: session.map(|s| s.current_time().as_secs_f64()).unwrap_or(0.0),
            duration_secs: session.and_then(|s| s.duration()).map(|d| d.as_secs_f64()),
            pip_available: session.map(|s| s.pip().is_some()).unwrap_or(false),
            pip_active: session.and_then(|s| s.pip()).map(|pip| pip.is_active()).unwrap_or(false),
            aspect_swaps: self.layout.swaps(),
            progress_samples: self.progress.emitted(),
            time_observer: self.progress.is_registered(),
            pip_auto_starts: self.lifecycle.pip_auto_starts(),
            subscriptions: self.lifecycle.subscription_count(),
        }
    }

    fn is_live(&self, generation: u64) -> bool {
        matches!(&self.slot, SessionSlot::Ready(session) if session.generation() == generation)
    }

    fn on_asset_loaded(&mut self, generation: u64, result: Result<LoadedAsset>) {
        match &self.slot {
            SessionSlot::Loading { generation: pending, .. } if *pending == generation => {}
            _ => {
                debug!("Discarding stale load result for generation {}", generation);
                return;
            }
        }

        let asset = match result {
            Ok(asset) => asset,
            Err(e) => {
                error!("Failed to load video: {}", e);
                self.slot = SessionSlot::Absent;
                return;
            }
        };

        match self.install_session(generation, asset) {
            Ok(session) => {
                info!(
                    "Playback session {} ready for {} (PiP: {})",
                    generation,
                    session.source(),
                    session.pip().is_some()
                );
                self.slot = SessionSlot::Ready(session);
            }
            Err(e) => {
                error!("Failed to set up playback: {}", e);
                self.slot = SessionSlot::Absent;
            }
        }
    }

    /// Build the session for a loaded asset.
    ///
    /// Nothing on screen changes unless the player could be built; the aspect
    /// constraint and layout pass land before the surface is attached.
    fn install_session(
        &mut self,
        generation: u64,
        asset: LoadedAsset,
    ) -> Result<Box<PlaybackSession>> {
        let aspect = AspectDescriptor::from_size(asset.natural_size)?;
        let mut player = self.backend.make_player(&asset)?;

        self.layout.apply(&mut *self.view, aspect);

        let surface = player.surface();
        self.view.attach_surface(surface);
        self.view.sync_surface_frame();

        let pip = self.make_pip(surface, generation);

        self.progress
            .register(player.as_mut(), generation, self.events_tx.clone())?;
        self.lifecycle.release_session();
        self.lifecycle
            .observe_end_of_media(player.as_mut(), generation, self.events_tx.clone());

        Ok(Box::new(PlaybackSession::new(generation, asset.source, player, pip)))
    }

    fn make_pip(&self, surface: SurfaceHandle, generation: u64) -> Option<Box<dyn PipController>> {
        if !self.config.pip.enabled {
            debug!("PiP disabled by configuration");
            return None;
        }
        if !self.pip_backend.is_supported() {
            debug!("PiP not supported on this host");
            return None;
        }

        let delegate = Arc::new(ChannelPipDelegate::new(generation, self.events_tx.clone()));
        match self.pip_backend.make_controller(surface, delegate) {
            Ok(controller) => Some(controller),
            Err(e) => {
                warn!("PiP capability not created: {}", e);
                None
            }
        }
    }

    fn on_seek_completed(&mut self, generation: u64, finished: bool) {
        let SessionSlot::Ready(session) = &mut self.slot else {
            return;
        };
        if session.generation() != generation {
            debug!("Stale seek completion for generation {}", generation);
            return;
        }

        match session.finish_seek(finished) {
            Ok(state) => {
                let icon = match state {
                    PlaybackState::Playing => ButtonIcon::Pause,
                    PlaybackState::Ended => ButtonIcon::Restart,
                    _ => ButtonIcon::Play,
                };
                self.overlay.set_icon(icon, &mut *self.view);
            }
            Err(e) => warn!("Seek completion rejected: {}", e),
        }
    }
}

impl Drop for ScreenController {
    fn drop(&mut self) {
        self.teardown();
    }
}
