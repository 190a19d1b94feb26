//! Playback state machine for pipview
//!
//! The session moves through `Idle → Loading → Ready → {Playing ⇄ Paused} → Ended`,
//! with a transient `Seeking` state while the backend repositions the item.

use serde::{Deserialize, Serialize};

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// No media accepted yet
    Idle,

    /// Asset metadata is being resolved
    Loading,

    /// Player constructed, nothing played yet
    Ready,

    /// Currently playing
    Playing,

    /// Playback paused
    Paused,

    /// Waiting for a seek to complete
    Seeking,

    /// End of media reached
    Ended,
}

impl PlaybackState {
    /// Whether the session allows moving from `self` to `next`
    pub fn can_transition_to(self, next: PlaybackState) -> bool {
        use PlaybackState::*;

        match (self, next) {
            (Idle, Loading) => true,
            (Loading, Ready) | (Loading, Idle) => true,

            (Ready, Playing) | (Ready, Seeking) => true,
            (Playing, Paused) | (Playing, Seeking) | (Playing, Ended) => true,
            (Paused, Playing) | (Paused, Seeking) | (Paused, Ended) => true,

            // A seek resolves back into whichever state it interrupted.
            (Seeking, Ready) | (Seeking, Playing) | (Seeking, Paused) | (Seeking, Ended) => true,

            // Restart goes through a seek to zero first.
            (Ended, Seeking) => true,

            // Teardown is always allowed.
            (_, Idle) => true,

            _ => false,
        }
    }
}
