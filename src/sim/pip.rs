//! Simulated Picture-in-Picture support

use crate::lifecycle::{PipBackend, PipController, PipDelegate};
use crate::utils::error::{PipViewError, Result};
use crate::view::SurfaceHandle;
use parking_lot::Mutex;
use std::sync::Arc;

struct BackendState {
    supported: bool,
    fail_message: Option<String>,
    controllers: Vec<SimPipHandle>,
}

/// PiP backend whose starts succeed unless told otherwise
#[derive(Clone)]
pub struct SimPipBackend {
    state: Arc<Mutex<BackendState>>,
}

impl SimPipBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BackendState {
                supported: true,
                fail_message: None,
                controllers: Vec::new(),
            })),
        }
    }

    pub fn set_supported(&self, supported: bool) {
        self.state.lock().supported = supported;
    }

    /// Make every later start fail with `message`
    pub fn fail_starts(&self, message: &str) {
        self.state.lock().fail_message = Some(message.to_string());
    }

    pub fn controllers_created(&self) -> usize {
        self.state.lock().controllers.len()
    }

    pub fn last_controller(&self) -> Option<SimPipHandle> {
        self.state.lock().controllers.last().cloned()
    }
}

impl Default for SimPipBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PipBackend for SimPipBackend {
    fn is_supported(&self) -> bool {
        self.state.lock().supported
    }

    fn make_controller(
        &self,
        surface: SurfaceHandle,
        delegate: Arc<dyn PipDelegate>,
    ) -> Result<Box<dyn PipController>> {
        let mut state = self.state.lock();
        if !state.supported {
            return Err(PipViewError::PipUnavailable("PiP disabled on simulated host".to_string()));
        }

        let controller = Arc::new(Mutex::new(ControllerState {
            surface,
            active: false,
            start_calls: 0,
            stop_calls: 0,
        }));
        state.controllers.push(SimPipHandle {
            state: Arc::clone(&controller),
        });

        Ok(Box::new(SimPipController {
            backend: Arc::clone(&self.state),
            state: controller,
            delegate,
        }))
    }
}

struct ControllerState {
    surface: SurfaceHandle,
    active: bool,
    start_calls: u32,
    stop_calls: u32,
}

struct SimPipController {
    backend: Arc<Mutex<BackendState>>,
    state: Arc<Mutex<ControllerState>>,
    delegate: Arc<dyn PipDelegate>,
}

impl PipController for SimPipController {
    fn start(&mut self) {
        let failure = self.backend.lock().fail_message.clone();
        {
            let mut state = self.state.lock();
            state.start_calls += 1;
            if failure.is_none() {
                state.active = true;
            }
        }

        match failure {
            Some(message) => self.delegate.failed_to_start(PipViewError::PipStart(message)),
            None => self.delegate.will_start(),
        }
    }

    fn stop(&mut self) {
        let was_active = {
            let mut state = self.state.lock();
            state.stop_calls += 1;
            std::mem::replace(&mut state.active, false)
        };
        if was_active {
            self.delegate.will_stop();
        }
    }

    fn is_active(&self) -> bool {
        self.state.lock().active
    }
}

/// Test-side handle on one simulated PiP controller
#[derive(Clone)]
pub struct SimPipHandle {
    state: Arc<Mutex<ControllerState>>,
}

impl SimPipHandle {
    pub fn surface(&self) -> SurfaceHandle {
        self.state.lock().surface
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    pub fn start_calls(&self) -> u32 {
        self.state.lock().start_calls
    }

    pub fn stop_calls(&self) -> u32 {
        self.state.lock().stop_calls
    }
}
