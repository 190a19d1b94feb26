//! Picture-in-Picture collaborator traits
//!
//! The host provides the floating window; the screen only creates a
//! controller bound to the player surface and reacts to its delegate calls.

use crate::player::{UiEvent, UiSender};
use crate::utils::error::{PipViewError, Result};
use crate::view::SurfaceHandle;
use log::debug;
use std::sync::Arc;

/// Delegate callbacks forwarded to the UI thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipEvent {
    WillStart,
    WillStop,
    FailedToStart(String),
}

/// Receives PiP lifecycle callbacks from the host
pub trait PipDelegate: Send + Sync {
    /// PiP is about to take over rendering
    fn will_start(&self);

    /// PiP is about to hand rendering back
    fn will_stop(&self);

    /// PiP was requested but could not start
    fn failed_to_start(&self, error: PipViewError);
}

/// PiP capability bound to one player surface
#[cfg_attr(test, mockall::automock)]
pub trait PipController: Send {
    fn start(&mut self);

    fn stop(&mut self);

    fn is_active(&self) -> bool;
}

/// Host PiP support
pub trait PipBackend: Send + Sync {
    /// Whether this host can show PiP at all
    fn is_supported(&self) -> bool;

    /// Create a capability bound to `surface`
    fn make_controller(
        &self,
        surface: SurfaceHandle,
        delegate: Arc<dyn PipDelegate>,
    ) -> Result<Box<dyn PipController>>;
}

/// Backend for hosts without PiP
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedPip;

impl PipBackend for UnsupportedPip {
    fn is_supported(&self) -> bool {
        false
    }

    fn make_controller(
        &self,
        _surface: SurfaceHandle,
        _delegate: Arc<dyn PipDelegate>,
    ) -> Result<Box<dyn PipController>> {
        Err(PipViewError::PipUnavailable("PiP is not supported on this host".to_string()))
    }
}

/// Delegate that posts every callback to the UI queue
pub struct ChannelPipDelegate {
    generation: u64,
    tx: UiSender,
}

impl ChannelPipDelegate {
    pub fn new(generation: u64, tx: UiSender) -> Self {
        Self { generation, tx }
    }

    fn post(&self, event: PipEvent) {
        let generation = self.generation;
        if self.tx.send(UiEvent::Pip { generation, event }).is_err() {
            debug!("PiP callback after screen teardown ignored");
        }
    }
}

impl PipDelegate for ChannelPipDelegate {
    fn will_start(&self) {
        self.post(PipEvent::WillStart);
    }

    fn will_stop(&self) {
        self.post(PipEvent::WillStop);
    }

    fn failed_to_start(&self, error: PipViewError) {
        self.post(PipEvent::FailedToStart(error.to_string()));
    }
}
