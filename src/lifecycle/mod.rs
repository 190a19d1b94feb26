//! Lifecycle module for pipview
//!
//! Reacts to signals that do not come from the user's taps: the app moving
//! to the background, the item playing to its end, and the PiP delegate
//! callbacks. Owns the notification subscriptions behind those signals.

mod pip;
mod subscription;

pub use pip::{ChannelPipDelegate, PipBackend, PipController, PipDelegate, PipEvent, UnsupportedPip};
pub use subscription::{Subscription, SubscriptionSet};

#[cfg(test)]
pub use pip::MockPipController;

use crate::player::{
    ButtonIcon, MediaPlayer, NotifyCallback, OverlayController, PlaybackSession, UiEvent, UiSender,
};
use crate::view::ScreenView;
use log::{debug, info, warn};

/// App lifecycle notifications provided by the host
pub trait AppLifecycle: Send + Sync {
    /// Subscribe to the did-enter-background notification
    fn subscribe_did_enter_background(&self, callback: NotifyCallback) -> Subscription;
}

/// Drives background, end-of-media and PiP transitions
#[derive(Debug)]
pub struct LifecycleCoordinator {
    auto_pip: bool,
    app_subscriptions: SubscriptionSet,
    session_subscriptions: SubscriptionSet,
    surface_hidden: bool,
    pip_auto_starts: u32,
}

impl LifecycleCoordinator {
    pub fn new(auto_pip: bool) -> Self {
        Self {
            auto_pip,
            app_subscriptions: SubscriptionSet::new(),
            session_subscriptions: SubscriptionSet::new(),
            surface_hidden: false,
            pip_auto_starts: 0,
        }
    }

    /// Subscribe to app background transitions, once per screen
    pub fn observe_app_state(&mut self, app: &dyn AppLifecycle, tx: UiSender) {
        if !self.app_subscriptions.is_empty() {
            debug!("Already observing app state");
            return;
        }

        let subscription = app.subscribe_did_enter_background(Box::new(move || {
            let _ = tx.send(UiEvent::DidEnterBackground);
        }));
        self.app_subscriptions.push(subscription);
    }

    /// Subscribe to end-of-media of the session's item
    pub fn observe_end_of_media(
        &mut self,
        player: &mut dyn MediaPlayer,
        generation: u64,
        tx: UiSender,
    ) {
        let subscription = player.subscribe_end_of_media(Box::new(move || {
            let _ = tx.send(UiEvent::EndOfMedia { generation });
        }));
        self.session_subscriptions.push(subscription);
    }

    /// App went to the background: start PiP if possible.
    ///
    /// Returns whether PiP start was requested.
    pub fn on_did_enter_background(&mut self, session: Option<&mut PlaybackSession>) -> bool {
        if !self.auto_pip {
            debug!("Background entered; PiP auto-start disabled");
            return false;
        }

        let Some(pip) = session.and_then(|session| session.pip_mut()) else {
            debug!("Background entered without a PiP capability");
            return false;
        };

        if pip.is_active() {
            debug!("Background entered with PiP already active");
            return false;
        }

        info!("Starting PiP for background playback");
        pip.start();
        self.pip_auto_starts += 1;
        true
    }

    /// The item played to its end
    pub fn on_end_of_media<V: ScreenView + ?Sized>(
        &mut self,
        session: &mut PlaybackSession,
        overlay: &mut OverlayController,
        view: &mut V,
    ) {
        match session.mark_ended() {
            Ok(true) => {
                info!("End of media reached");
                overlay.set_icon(ButtonIcon::Restart, view);
            }
            Ok(false) => debug!("End of media deferred until the seek settles"),
            Err(e) => debug!("End of media ignored: {}", e),
        }
    }

    /// PiP delegate callback
    pub fn on_pip_event<V: ScreenView + ?Sized>(&mut self, event: PipEvent, view: &mut V) {
        match event {
            PipEvent::WillStart => {
                debug!("PiP will start; hiding inline surface");
                self.surface_hidden = true;
                view.set_surface_hidden(true);
            }
            PipEvent::WillStop => {
                debug!("PiP will stop; showing inline surface");
                self.surface_hidden = false;
                view.set_surface_hidden(false);
            }
            PipEvent::FailedToStart(message) => {
                warn!("Entering PiP failed: {}", message);
            }
        }
    }

    /// Inline PiP button: start when inactive, stop when active
    pub fn toggle_pip(&mut self, session: Option<&mut PlaybackSession>) -> bool {
        let Some(pip) = session.and_then(|session| session.pip_mut()) else {
            debug!("PiP toggle ignored: no capability");
            return false;
        };

        if pip.is_active() {
            pip.stop();
        } else {
            pip.start();
        }
        true
    }

    /// Drop the subscriptions bound to the current session
    pub fn release_session(&mut self) {
        self.session_subscriptions.clear();
    }

    /// Drop every subscription
    pub fn dispose(&mut self) {
        self.session_subscriptions.clear();
        self.app_subscriptions.clear();
    }

    pub fn surface_hidden(&self) -> bool {
        self.surface_hidden
    }

    pub fn pip_auto_starts(&self) -> u32 {
        self.pip_auto_starts
    }

    pub fn subscription_count(&self) -> usize {
        self.app_subscriptions.len() + self.session_subscriptions.len()
    }
}
