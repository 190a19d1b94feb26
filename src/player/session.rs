//! Playback session
//!
//! A session wraps the player built for one loaded item, the optional PiP
//! capability bound to its surface, and the playback state machine.

use crate::asset::MediaSource;
use crate::lifecycle::PipController;
use crate::player::{MediaPlayer, PlaybackState, SeekCompletion};
use crate::utils::error::{PipViewError, Result};
use log::debug;
use std::time::Duration;

/// What the single transport button does in the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Play,
    Pause,
    Restart,
    /// A seek is in flight
    Ignore,
}

#[derive(Debug, Clone, Copy)]
struct PendingSeek {
    resume: PlaybackState,
    restart: bool,
    /// End-of-media arrived while the seek was in flight
    ended: bool,
}

/// Player, PiP capability and playback state for one loaded item
pub struct PlaybackSession {
    generation: u64,
    source: MediaSource,
    player: Box<dyn MediaPlayer>,
    pip: Option<Box<dyn PipController>>,
    state: PlaybackState,
    pending_seek: Option<PendingSeek>,
}

impl PlaybackSession {
    /// Wrap a freshly constructed player; the session starts `Ready`
    pub fn new(
        generation: u64,
        source: MediaSource,
        player: Box<dyn MediaPlayer>,
        pip: Option<Box<dyn PipController>>,
    ) -> Self {
        Self {
            generation,
            source,
            player,
            pip,
            state: PlaybackState::Ready,
            pending_seek: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn source(&self) -> &MediaSource {
        &self.source
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn player(&self) -> &dyn MediaPlayer {
        self.player.as_ref()
    }

    pub fn player_mut(&mut self) -> &mut dyn MediaPlayer {
        self.player.as_mut()
    }

    pub fn pip(&self) -> Option<&dyn PipController> {
        self.pip.as_deref()
    }

    pub fn pip_mut(&mut self) -> Option<&mut (dyn PipController + 'static)> {
        self.pip.as_deref_mut()
    }

    pub fn current_time(&self) -> Duration {
        self.player.current_time()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.player.duration()
    }

    /// Dispatch rule of the transport button
    pub fn toggle_action(&self) -> ToggleAction {
        match self.state {
            PlaybackState::Ended => ToggleAction::Restart,
            PlaybackState::Playing => ToggleAction::Pause,
            PlaybackState::Seeking => ToggleAction::Ignore,
            _ => ToggleAction::Play,
        }
    }

    /// Start or resume playback from `Ready` or `Paused`
    pub fn play(&mut self) -> Result<()> {
        self.check(PlaybackState::Playing)?;
        self.player.play();
        self.set_state(PlaybackState::Playing);
        Ok(())
    }

    /// Pause a playing session
    pub fn pause(&mut self) -> Result<()> {
        self.check(PlaybackState::Paused)?;
        self.player.pause();
        self.set_state(PlaybackState::Paused);
        Ok(())
    }

    /// Seek to `to` (clamped to the duration when known).
    ///
    /// The session stays `Seeking` until `finish_seek` is called with the
    /// backend's completion, then returns to the state it was in. A seek from
    /// `Ended` resolves to `Paused`.
    pub fn begin_seek(&mut self, to: Duration, on_complete: SeekCompletion) -> Result<()> {
        self.check(PlaybackState::Seeking)?;

        let resume = match self.state {
            PlaybackState::Ended => PlaybackState::Paused,
            other => other,
        };
        let target = match self.player.duration() {
            Some(total) => to.min(total),
            None => to,
        };

        self.pending_seek = Some(PendingSeek {
            resume,
            restart: false,
            ended: false,
        });
        self.set_state(PlaybackState::Seeking);
        self.player.seek(target, on_complete);
        Ok(())
    }

    /// Restart an ended session: seek to zero, play once the seek settles
    pub fn restart(&mut self, on_complete: SeekCompletion) -> Result<()> {
        if self.state != PlaybackState::Ended {
            return Err(PipViewError::InvalidTransition {
                from: self.state,
                to: PlaybackState::Seeking,
            });
        }

        self.pending_seek = Some(PendingSeek {
            resume: PlaybackState::Playing,
            restart: true,
            ended: false,
        });
        self.set_state(PlaybackState::Seeking);
        self.player.seek(Duration::ZERO, on_complete);
        Ok(())
    }

    /// Apply a seek completion and return the resulting state.
    ///
    /// A plain seek that saw end-of-media while in flight resolves to `Ended`.
    pub fn finish_seek(&mut self, finished: bool) -> Result<PlaybackState> {
        let pending = self.pending_seek.take().ok_or_else(|| {
            PipViewError::Internal("seek completion without a pending seek".to_string())
        })?;

        let next = match (pending.restart, finished) {
            (true, true) => {
                self.player.play();
                PlaybackState::Playing
            }
            (true, false) => PlaybackState::Ended,
            (false, _) if pending.ended => PlaybackState::Ended,
            (false, _) => pending.resume,
        };

        self.check(next)?;
        self.set_state(next);
        Ok(next)
    }

    /// End-of-media reached.
    ///
    /// Returns `true` once the session is `Ended`, or `false` when a plain
    /// seek is in flight and the transition waits for `finish_seek`.
    pub fn mark_ended(&mut self) -> Result<bool> {
        if matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
            self.set_state(PlaybackState::Ended);
            return Ok(true);
        }

        match self.pending_seek.as_mut() {
            Some(pending) if self.state == PlaybackState::Seeking && !pending.restart => {
                debug!("Session {} reached the end mid-seek", self.generation);
                pending.ended = true;
                Ok(false)
            }
            _ => Err(PipViewError::InvalidTransition {
                from: self.state,
                to: PlaybackState::Ended,
            }),
        }
    }

    fn check(&self, to: PlaybackState) -> Result<()> {
        if self.state.can_transition_to(to) {
            Ok(())
        } else {
            Err(PipViewError::InvalidTransition { from: self.state, to })
        }
    }

    fn set_state(&mut self, to: PlaybackState) {
        debug!("Session {} state {:?} -> {:?}", self.generation, self.state, to);
        self.state = to;
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("generation", &self.generation)
            .field("source", &self.source)
            .field("state", &self.state)
            .field("pip", &self.pip.is_some())
            .finish()
    }
}
