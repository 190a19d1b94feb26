//! Transport overlay state
//!
//! The overlay carries a single button and the progress bar. Visibility is
//! flipped by taps over the player surface; the button icon follows the
//! playback state.

use crate::view::ScreenView;
use log::debug;
use serde::{Deserialize, Serialize};

/// Affordance shown on the transport button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonIcon {
    Play,
    Pause,
    Restart,
}

impl ButtonIcon {
    /// Symbol name used by the host's icon set
    pub fn symbol_name(self) -> &'static str {
        match self {
            ButtonIcon::Play => "play.fill",
            ButtonIcon::Pause => "pause.fill",
            ButtonIcon::Restart => "arrow.clockwise",
        }
    }
}

/// Overlay visibility and button icon
#[derive(Debug)]
pub struct OverlayController {
    hidden: bool,
    icon: ButtonIcon,
    first_play_hides: bool,
    auto_hidden: bool,
}

impl OverlayController {
    pub fn new(first_play_hides: bool) -> Self {
        Self {
            hidden: false,
            icon: ButtonIcon::Play,
            first_play_hides,
            auto_hidden: false,
        }
    }

    /// Push the initial visibility and icon to the view
    pub fn install<V: ScreenView + ?Sized>(&mut self, view: &mut V) {
        view.set_overlay_hidden(self.hidden);
        view.set_button_icon(self.icon);
    }

    /// Tap anywhere over the player surface
    pub fn handle_tap<V: ScreenView + ?Sized>(&mut self, view: &mut V) {
        self.hidden = !self.hidden;
        debug!("Overlay {}", if self.hidden { "hidden" } else { "shown" });
        view.set_overlay_hidden(self.hidden);
    }

    /// Called right before a play command is issued.
    ///
    /// The first play from time zero hides the overlay regardless of taps.
    pub fn on_play_command<V: ScreenView + ?Sized>(&mut self, elapsed_is_zero: bool, view: &mut V) {
        if !self.first_play_hides || self.auto_hidden || !elapsed_is_zero {
            return;
        }

        self.auto_hidden = true;
        self.hidden = true;
        debug!("Overlay hidden on first play");
        view.set_overlay_hidden(true);
    }

    pub fn set_icon<V: ScreenView + ?Sized>(&mut self, icon: ButtonIcon, view: &mut V) {
        self.icon = icon;
        view.set_button_icon(icon);
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn icon(&self) -> ButtonIcon {
        self.icon
    }
}
