//! Player module for pipview
//!
//! This module owns everything between a loaded asset and the pixels on the
//! transport overlay: the playback session state machine, the periodic
//! progress reporter, the overlay controller and the screen controller that
//! ties them to the host view on the UI thread.

mod controller;
mod overlay;
mod progress;
mod session;
mod state;

pub use controller::{ScreenController, ScreenControllerBuilder, ScreenSnapshot};
pub use overlay::{ButtonIcon, OverlayController};
pub use progress::{ProgressReporter, ProgressSample};
pub use session::{PlaybackSession, ToggleAction};
pub use state::PlaybackState;

use crate::asset::LoadedAsset;
use crate::lifecycle::{PipEvent, Subscription};
use crate::utils::error::Result;
use crate::view::SurfaceHandle;
use crossbeam_channel::Sender;
use std::time::Duration;

/// Callback invoked by the backend at the observer cadence with the current time
pub type TimeCallback = Box<dyn Fn(Duration) + Send + Sync>;

/// Callback invoked once when a seek finishes; `false` means it was interrupted
pub type SeekCompletion = Box<dyn FnOnce(bool) + Send>;

/// Callback invoked on a notification without payload
pub type NotifyCallback = Box<dyn Fn() + Send + Sync>;

/// Player bound to one loaded item, provided by the media backend
pub trait MediaPlayer: Send {
    /// Start or resume playback
    fn play(&mut self);

    /// Pause playback
    fn pause(&mut self);

    /// Seek to a position; `on_complete` runs when the seek settles
    fn seek(&mut self, to: Duration, on_complete: SeekCompletion);

    /// Current playback position
    fn current_time(&self) -> Duration;

    /// Item duration, `None` while unknown or indefinite
    fn duration(&self) -> Option<Duration>;

    /// Handle of the visual surface rendering this player
    fn surface(&self) -> SurfaceHandle;

    /// Register a periodic time observer
    fn add_periodic_time_observer(
        &mut self,
        interval: Duration,
        callback: TimeCallback,
    ) -> TimeObserverToken;

    /// Remove a periodic time observer; the token is consumed
    fn remove_time_observer(&mut self, token: TimeObserverToken);

    /// Subscribe to the end-of-media notification of the current item
    fn subscribe_end_of_media(&mut self, callback: NotifyCallback) -> Subscription;
}

/// Handle for a registered periodic time observer.
///
/// Not `Clone`: removing an observer consumes its token, so it can only be
/// removed once.
#[derive(Debug, PartialEq, Eq)]
pub struct TimeObserverToken(u64);

impl TimeObserverToken {
    /// Wrap a backend-assigned observer id
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Backend-assigned observer id
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Events delivered to the UI thread.
///
/// Every collaborator callback is turned into one of these and posted on the
/// screen's queue; only `ScreenController::handle_event` mutates state.
#[derive(Debug)]
pub enum UiEvent {
    /// Asset resolution finished
    AssetLoaded {
        generation: u64,
        result: Result<LoadedAsset>,
    },

    /// Periodic time observer fired
    TimeTick { generation: u64, elapsed: Duration },

    /// The item played to its end
    EndOfMedia { generation: u64 },

    /// A seek issued by the session settled
    SeekCompleted { generation: u64, finished: bool },

    /// The app moved to the background
    DidEnterBackground,

    /// Picture-in-Picture delegate callback
    Pip { generation: u64, event: PipEvent },
}

/// Sending half of the UI event queue
pub type UiSender = Sender<UiEvent>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observer_token_id() {
        let token = TimeObserverToken::new(7);
        assert_eq!(token.id(), 7);
        assert_eq!(token, TimeObserverToken::new(7));
    }
}
