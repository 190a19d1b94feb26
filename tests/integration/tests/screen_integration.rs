//! Integration tests for the pipview playback screen
//!
//! These tests drive a complete screen against the simulated host:
//! - Asset loading and aspect layout
//! - Play/pause/restart through the single button
//! - Progress reporting and PiP on background
//! - Teardown and stale results

use anyhow::Result;
use pipview::player::{ButtonIcon, PlaybackState};
use pipview::sim::SimAsset;
use pipview::utils::{AssetLoadError, Config};
use pipview_integration_tests::{test_config, write_config, ScreenFixture, TEST_URL};
use serial_test::serial;
use std::time::Duration;

#[tokio::test]
async fn test_full_hd_asset_sets_aspect() -> Result<()> {
    let fixture = ScreenFixture::ready(SimAsset::video(1920, 1080, Duration::from_secs(15))).await?;

    assert_eq!(fixture.screen.aspect().map(|a| a.ratio()), Some(0.5625));
    assert_eq!(fixture.view.active_constraints(), vec![0.5625]);
    assert_eq!(fixture.view.attached_surface(), Some(fixture.player()?.surface()));
    assert_eq!(fixture.screen.button_icon(), ButtonIcon::Play);
    assert!(!fixture.screen.overlay_hidden());

    Ok(())
}

#[tokio::test]
async fn test_toggle_plays_and_pauses() -> Result<()> {
    let mut fixture =
        ScreenFixture::ready(SimAsset::video(1280, 720, Duration::from_secs(15))).await?;
    let player = fixture.player()?;

    fixture.screen.toggle_play_pause();
    assert_eq!(fixture.screen.playback_state(), PlaybackState::Playing);
    assert_eq!(fixture.view.icon(), Some(ButtonIcon::Pause));
    assert!(fixture.view.overlay_hidden());
    assert!(player.is_playing());

    fixture.advance(Duration::from_secs(3))?;

    fixture.screen.toggle_play_pause();
    assert_eq!(fixture.screen.playback_state(), PlaybackState::Paused);
    assert_eq!(fixture.view.icon(), Some(ButtonIcon::Play));
    assert!(!player.is_playing());

    // Resuming mid-stream keeps the overlay where the user left it.
    fixture.screen.handle_overlay_tap();
    fixture.screen.toggle_play_pause();
    assert!(!fixture.screen.overlay_hidden());

    Ok(())
}

#[tokio::test]
async fn test_progress_once_per_second() -> Result<()> {
    let mut fixture =
        ScreenFixture::ready(SimAsset::video(1280, 720, Duration::from_secs(10))).await?;
    fixture.screen.toggle_play_pause();

    fixture.advance(Duration::from_millis(3500))?;

    let updates = fixture.view.progress_updates();
    assert_eq!(updates, vec![0.0, 0.1, 0.2, 0.3]);
    assert_eq!(fixture.screen.snapshot().progress, Some(0.3));

    Ok(())
}

#[tokio::test]
async fn test_end_then_restart() -> Result<()> {
    let mut fixture =
        ScreenFixture::ready(SimAsset::video(1280, 720, Duration::from_secs(5))).await?;
    fixture.screen.toggle_play_pause();

    fixture.advance(Duration::from_secs(6))?;
    assert_eq!(fixture.screen.playback_state(), PlaybackState::Ended);
    assert_eq!(fixture.view.icon(), Some(ButtonIcon::Restart));
    assert_eq!(fixture.view.progress_updates().last().copied(), Some(1.0));

    fixture.screen.toggle_play_pause();
    fixture.screen.pump();

    let player = fixture.player()?;
    assert_eq!(player.seeks(), vec![Duration::ZERO]);
    assert_eq!(player.current_time(), Duration::ZERO);
    assert!(player.is_playing());
    assert_eq!(fixture.screen.playback_state(), PlaybackState::Playing);
    assert_eq!(fixture.view.icon(), Some(ButtonIcon::Pause));

    Ok(())
}

#[tokio::test]
async fn test_background_starts_pip() -> Result<()> {
    let mut fixture =
        ScreenFixture::ready(SimAsset::video(1920, 1080, Duration::from_secs(60))).await?;
    fixture.screen.toggle_play_pause();

    fixture.host.app.enter_background();
    fixture.screen.pump();

    let pip = fixture.host.pip.last_controller().expect("PiP controller");
    assert_eq!(pip.start_calls(), 1);
    assert_eq!(pip.surface(), fixture.player()?.surface());
    assert!(fixture.view.surface_hidden());

    fixture.host.app.enter_background();
    fixture.screen.pump();
    assert_eq!(pip.start_calls(), 1);

    // Stopping PiP brings the inline surface back.
    fixture.screen.toggle_pip();
    fixture.screen.pump();
    assert!(!fixture.view.surface_hidden());
    assert_eq!(fixture.screen.playback_state(), PlaybackState::Playing);

    Ok(())
}

#[tokio::test]
async fn test_background_without_pip_support() -> Result<()> {
    let mut fixture =
        ScreenFixture::new(Some(SimAsset::video(1920, 1080, Duration::from_secs(60))))?;
    fixture.host.pip.set_supported(false);
    fixture.screen.did_load();
    fixture.settle().await?;
    fixture.screen.toggle_play_pause();

    fixture.host.app.enter_background();
    fixture.screen.pump();

    assert_eq!(fixture.host.pip.controllers_created(), 0);
    assert!(!fixture.view.surface_hidden());
    assert_eq!(fixture.screen.playback_state(), PlaybackState::Playing);

    Ok(())
}

#[tokio::test]
async fn test_commands_without_session() -> Result<()> {
    let mut fixture = ScreenFixture::new(None)?;
    fixture.host.media.fail(TEST_URL, AssetLoadError::Network("unreachable".to_string()));
    fixture.screen.did_load();
    fixture.settle().await?;

    fixture.screen.toggle_play_pause();
    fixture.screen.seek(Duration::from_secs(2));
    fixture.screen.toggle_pip();
    fixture.host.app.enter_background();
    fixture.screen.pump();

    assert_eq!(fixture.screen.playback_state(), PlaybackState::Idle);
    assert_eq!(fixture.view.icon(), Some(ButtonIcon::Play));
    assert_eq!(fixture.view.active_constraints(), vec![9.0 / 16.0]);
    assert_eq!(fixture.host.media.players_created(), 0);

    Ok(())
}

#[tokio::test]
async fn test_teardown_releases_observers() -> Result<()> {
    let mut fixture =
        ScreenFixture::ready(SimAsset::video(1280, 720, Duration::from_secs(10))).await?;
    let player = fixture.player()?;
    fixture.screen.toggle_play_pause();

    fixture.screen.teardown();
    assert_eq!(player.observer_count(), 0);
    assert_eq!(player.observers_removed(), 1);
    assert_eq!(player.end_subscriber_count(), 0);
    assert_eq!(fixture.host.app.subscriber_count(), 0);

    // Nothing reaches the screen any more.
    player.advance(Duration::from_secs(2));
    assert_eq!(fixture.screen.pump(), 0);

    Ok(())
}

#[tokio::test]
async fn test_load_outliving_screen() -> Result<()> {
    let mut fixture =
        ScreenFixture::new(Some(SimAsset::video(1280, 720, Duration::from_secs(10))))?;
    fixture.host.media.set_latency(Duration::from_millis(20));
    fixture.screen.did_load();

    let ScreenFixture { host, view, screen } = fixture;
    drop(screen);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(host.media.players_created(), 0);
    assert_eq!(view.layout_passes(), 0);

    Ok(())
}

#[tokio::test]
async fn test_snapshot_serializes() -> Result<()> {
    let mut fixture =
        ScreenFixture::ready(SimAsset::video(1920, 1080, Duration::from_secs(15))).await?;
    fixture.screen.toggle_play_pause();
    fixture.advance(Duration::from_secs(3))?;

    let json = serde_json::to_value(fixture.screen.snapshot())?;
    assert_eq!(json["state"], "playing");
    assert_eq!(json["icon"], "pause");
    assert_eq!(json["aspect_ratio"], 0.5625);
    assert_eq!(json["source"], TEST_URL);
    assert_eq!(json["pip_available"], true);

    Ok(())
}

#[tokio::test]
#[serial]
async fn test_config_file_disables_pip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let user = write_config(dir.path(), "user.toml", "[pip]\nenabled = false\n")?;
    let explicit = write_config(
        dir.path(),
        "explicit.toml",
        "[playback]\nplaceholder_aspect_ratio = 0.75\n",
    )?;

    let mut config = Config::load_layers(&[&user, &explicit])?;
    assert!(!config.pip.enabled);
    assert_eq!(config.playback.placeholder_aspect_ratio, 0.75);
    config.media.source_url = TEST_URL.to_string();

    let asset = SimAsset::video(640, 480, Duration::from_secs(5));
    let mut fixture = ScreenFixture::with_config(config, Some(asset))?;
    fixture.screen.did_load();
    assert_eq!(fixture.view.active_constraints(), vec![0.75]);
    fixture.settle().await?;

    assert!(!fixture.screen.snapshot().pip_available);
    assert_eq!(fixture.host.pip.controllers_created(), 0);

    Ok(())
}

#[tokio::test]
async fn test_config_defaults_match_fixture() {
    let config = test_config();
    assert_eq!(config.playback.progress_interval(), Duration::from_secs(1));
    assert!(config.pip.auto_start_on_background);
}
