use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use env_logger::Env;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::Duration;

use pipview::player::ScreenController;
use pipview::sim::{RecordingView, SimAsset, SimHost};
use pipview::utils::{format_duration, load_config};
use pipview::MediaSource;

/// pipview - drive a playback screen against a simulated host
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Media URL to play (defaults to the configured source)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Natural width of the simulated video track
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Natural height of the simulated video track
    #[arg(long, default_value = "720")]
    height: u32,

    /// Duration of the simulated asset in seconds
    #[arg(long, value_name = "SECS", default_value = "15")]
    duration: u64,

    /// Press play once the asset is ready
    #[arg(short, long)]
    play: bool,

    /// Send the app to the background after this many seconds of playback
    #[arg(long, value_name = "SECS")]
    background_after: Option<u64>,

    /// Simulate a host without Picture-in-Picture support
    #[arg(long = "no-pip", action = ArgAction::SetFalse)]
    pip: bool,

    /// Stop after this many simulated seconds
    #[arg(long, value_name = "SECS", default_value = "20")]
    run_for: u64,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

const STEP: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = &args.url {
        config.media.source_url = url.clone();
    }

    let log_level = if args.debug { "debug" } else { config.general.log_level.as_str() };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    info!("Starting pipview v{}", env!("CARGO_PKG_VERSION"));

    let source = MediaSource::parse(&config.media.source_url)?;
    let host = SimHost::new();
    host.pip.set_supported(args.pip);
    host.media.insert(
        source.as_str(),
        SimAsset::video(args.width, args.height, Duration::from_secs(args.duration)),
    );

    let (view, recorder) = RecordingView::new();
    let mut screen = host.builder(config).with_view(Box::new(view)).build()?;
    screen.did_load();

    if !wait_until_ready(&mut screen).await {
        warn!("Asset did not become ready");
    } else if args.play {
        screen.toggle_play_pause();
    }

    let background_at = args.background_after.map(Duration::from_secs);
    let run_for = Duration::from_secs(args.run_for);
    let mut simulated = Duration::ZERO;
    let mut backgrounded = false;

    while simulated < run_for {
        if let Some(player) = host.media.last_player() {
            player.advance(STEP);
        }
        simulated += STEP;

        if let Some(at) = background_at {
            if !backgrounded && simulated >= at {
                info!("Entering background at {}", format_duration(simulated));
                host.app.enter_background();
                backgrounded = true;
            }
        }

        let handled = screen.pump();
        if handled > 0 {
            debug!("{} events at {:?}", handled, simulated);
        }
        tokio::task::yield_now().await;
    }

    let snapshot = screen.snapshot();
    screen.teardown();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("state:    {:?}", snapshot.state);
        println!("button:   {}", snapshot.icon.symbol_name());
        println!(
            "position: {} / {}",
            format_duration(Duration::from_secs_f64(snapshot.elapsed_secs)),
            snapshot
                .duration_secs
                .map(|secs| format_duration(Duration::from_secs_f64(secs)))
                .unwrap_or_else(|| "--:--".to_string())
        );
        if let Some(ratio) = snapshot.aspect_ratio {
            println!("aspect:   {:.4}", ratio);
        }
        println!(
            "pip:      {} (active: {})",
            if snapshot.pip_available { "available" } else { "unavailable" },
            snapshot.pip_active
        );
        println!(
            "progress: {} samples (observer: {})",
            snapshot.progress_samples, snapshot.time_observer
        );
        println!("view ops: {}", recorder.ops().len());
    }

    Ok(())
}

/// Pump the UI queue until the load settles
async fn wait_until_ready(screen: &mut ScreenController) -> bool {
    for _ in 0..50 {
        screen.pump();
        if screen.session().is_some() {
            return true;
        }
        if screen.playback_state() == pipview::PlaybackState::Idle {
            return false;
        }
        tokio::time::sleep(STEP).await;
    }
    false
}
