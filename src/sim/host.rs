//! Simulated app lifecycle and audio session

use crate::audio::{AudioCategory, AudioMode, AudioRouting};
use crate::lifecycle::{AppLifecycle, Subscription};
use crate::player::NotifyCallback;
use crate::utils::error::{PipViewError, Result};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct AppState {
    next_id: u64,
    subscribers: Vec<(u64, Arc<dyn Fn() + Send + Sync>)>,
}

/// App lifecycle driven by `enter_background`
#[derive(Clone, Default)]
pub struct SimAppLifecycle {
    state: Arc<Mutex<AppState>>,
}

impl SimAppLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver did-enter-background to every subscriber
    pub fn enter_background(&self) {
        let subscribers: Vec<_> = self
            .state
            .lock()
            .subscribers
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in subscribers {
            callback();
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }
}

impl AppLifecycle for SimAppLifecycle {
    fn subscribe_did_enter_background(&self, callback: NotifyCallback) -> Subscription {
        let id = {
            let mut state = self.state.lock();
            state.next_id += 1;
            let id = state.next_id;
            state.subscribers.push((id, Arc::from(callback)));
            id
        };

        let state = Arc::clone(&self.state);
        Subscription::new("did-enter-background", move || {
            state.lock().subscribers.retain(|(sub, _)| *sub != id);
        })
    }
}

#[derive(Default)]
struct AudioState {
    category: Option<(AudioCategory, AudioMode)>,
    active: bool,
    applied: u32,
    reject: bool,
}

/// Audio session that records what it was asked for
#[derive(Clone, Default)]
pub struct SimAudioRouting {
    state: Arc<Mutex<AudioState>>,
}

impl SimAudioRouting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every category request
    pub fn reject_category(&self) {
        self.state.lock().reject = true;
    }

    pub fn category(&self) -> Option<(AudioCategory, AudioMode)> {
        self.state.lock().category
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// Number of category requests that were accepted
    pub fn applied(&self) -> u32 {
        self.state.lock().applied
    }
}

impl AudioRouting for SimAudioRouting {
    fn set_category(&self, category: AudioCategory, mode: AudioMode) -> Result<()> {
        let mut state = self.state.lock();
        if state.reject {
            return Err(PipViewError::AudioSession(format!("category {:?} rejected", category)));
        }
        state.category = Some((category, mode));
        state.applied += 1;
        Ok(())
    }

    fn set_active(&self, active: bool) -> Result<()> {
        self.state.lock().active = active;
        Ok(())
    }
}
