//! pipview - a single-screen video playback controller
//!
//! Loads a remote asset off the UI thread, sizes the player container to the
//! video's aspect ratio, drives play/pause/restart from one overlay button,
//! reports progress once per second and hands playback to Picture-in-Picture
//! when the app goes to the background.
//!
//! The host platform is reached only through traits (`MediaBackend`,
//! `ScreenView`, `PipBackend`, `AppLifecycle`, `AudioRouting`); the `sim`
//! module provides an in-memory host.

pub mod asset;
pub mod audio;
pub mod layout;
pub mod lifecycle;
pub mod player;
pub mod sim;
pub mod utils;
pub mod view;

pub use asset::{AssetLoader, LoadedAsset, MediaBackend, MediaSource};
pub use player::{
    ButtonIcon, PlaybackState, ScreenController, ScreenControllerBuilder, ScreenSnapshot, UiEvent,
};
pub use utils::{Config, PipViewError, Result};
pub use view::{ScreenView, SurfaceHandle};
