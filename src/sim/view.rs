//! Recording host view
//!
//! Applies every call to an in-memory model of the view hierarchy and keeps
//! an ordered log of the calls, so tests can check ordering as well as state.

use crate::layout::{ConstraintId, LayoutHost};
use crate::player::ButtonIcon;
use crate::view::{ScreenView, SurfaceHandle};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct ViewState {
    ops: Vec<String>,
    next_constraint: u64,
    constraints: BTreeMap<ConstraintId, f64>,
    layout_passes: u32,
    surface: Option<SurfaceHandle>,
    surface_syncs: u32,
    icon: Option<ButtonIcon>,
    overlay_hidden: bool,
    surface_hidden: bool,
    progress: Vec<f32>,
}

/// Host view backed by memory
#[derive(Debug)]
pub struct RecordingView {
    state: Arc<Mutex<ViewState>>,
}

impl RecordingView {
    pub fn new() -> (Self, ViewRecorder) {
        let state = Arc::new(Mutex::new(ViewState::default()));
        let recorder = ViewRecorder {
            state: Arc::clone(&state),
        };
        (Self { state }, recorder)
    }
}

impl LayoutHost for RecordingView {
    fn activate_aspect_constraint(&mut self, ratio: f64) -> ConstraintId {
        let mut state = self.state.lock();
        state.next_constraint += 1;
        let id = ConstraintId(state.next_constraint);
        state.constraints.insert(id, ratio);
        state.ops.push(format!("activate {:.4}", ratio));
        id
    }

    fn deactivate_constraint(&mut self, id: ConstraintId) {
        let mut state = self.state.lock();
        state.constraints.remove(&id);
        state.ops.push(format!("deactivate {}", id.0));
    }

    fn layout_if_needed(&mut self) {
        let mut state = self.state.lock();
        state.layout_passes += 1;
        state.ops.push("layout".to_string());
    }
}

impl ScreenView for RecordingView {
    fn attach_surface(&mut self, surface: SurfaceHandle) {
        let mut state = self.state.lock();
        state.surface = Some(surface);
        state.ops.push(format!("attach {}", surface.0));
    }

    fn sync_surface_frame(&mut self) {
        let mut state = self.state.lock();
        state.surface_syncs += 1;
        state.ops.push("sync".to_string());
    }

    fn set_button_icon(&mut self, icon: ButtonIcon) {
        let mut state = self.state.lock();
        state.icon = Some(icon);
        state.ops.push(format!("icon {}", icon.symbol_name()));
    }

    fn set_overlay_hidden(&mut self, hidden: bool) {
        let mut state = self.state.lock();
        state.overlay_hidden = hidden;
        state.ops.push(format!("overlay hidden={}", hidden));
    }

    fn set_progress(&mut self, fraction: f32, _animation: Duration) {
        let mut state = self.state.lock();
        state.progress.push(fraction);
        state.ops.push(format!("progress {:.3}", fraction));
    }

    fn set_surface_hidden(&mut self, hidden: bool) {
        let mut state = self.state.lock();
        state.surface_hidden = hidden;
        state.ops.push(format!("surface hidden={}", hidden));
    }
}

/// Test-side handle on a `RecordingView`
#[derive(Debug, Clone)]
pub struct ViewRecorder {
    state: Arc<Mutex<ViewState>>,
}

impl ViewRecorder {
    /// Every view call so far, in order
    pub fn ops(&self) -> Vec<String> {
        self.state.lock().ops.clone()
    }

    /// Ratios of the active aspect constraints, oldest first
    pub fn active_constraints(&self) -> Vec<f64> {
        self.state.lock().constraints.values().copied().collect()
    }

    pub fn layout_passes(&self) -> u32 {
        self.state.lock().layout_passes
    }

    pub fn attached_surface(&self) -> Option<SurfaceHandle> {
        self.state.lock().surface
    }

    pub fn surface_syncs(&self) -> u32 {
        self.state.lock().surface_syncs
    }

    pub fn icon(&self) -> Option<ButtonIcon> {
        self.state.lock().icon
    }

    pub fn overlay_hidden(&self) -> bool {
        self.state.lock().overlay_hidden
    }

    pub fn surface_hidden(&self) -> bool {
        self.state.lock().surface_hidden
    }

    pub fn progress_updates(&self) -> Vec<f32> {
        self.state.lock().progress.clone()
    }
}
