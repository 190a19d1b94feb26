//! View module for pipview
//!
//! The host owns the view hierarchy: a container holding the player surface
//! with a transport overlay on top and a PiP button below. The screen drives
//! it exclusively through the `ScreenView` trait, from the UI thread.

use crate::layout::LayoutHost;
use crate::player::ButtonIcon;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Opaque handle of the visual surface a player renders into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceHandle(pub u64);

/// Host view driven by the screen controller
pub trait ScreenView: LayoutHost {
    /// Insert the player surface below the overlay
    fn attach_surface(&mut self, surface: SurfaceHandle);

    /// Match the player surface frame to the container bounds
    fn sync_surface_frame(&mut self);

    /// Set the transport button affordance
    fn set_button_icon(&mut self, icon: ButtonIcon);

    /// Show or hide the transport overlay
    fn set_overlay_hidden(&mut self, hidden: bool);

    /// Animate the progress bar to `fraction` over `animation`
    fn set_progress(&mut self, fraction: f32, animation: Duration);

    /// Show or hide the inline player container
    fn set_surface_hidden(&mut self, hidden: bool);
}
