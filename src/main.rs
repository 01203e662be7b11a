mod cli;

use scrollreel::{
    config,
    runtime::{self, PlayerOptions},
    script::{self, Script},
    sim,
};
use scrollreel_common::{EventBus, PlaybackEvent};
use scrollreel_playback::SegmentSelector;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::error::TryRecvError;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "scrollreel=trace,scrollreel_playback=trace,scrollreel_common=debug".to_string()
        } else {
            "scrollreel=info,scrollreel_playback=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Segments { json } => list_segments(cli.config.as_deref(), json),
        Commands::Select { offset } => select_offset(cli.config.as_deref(), offset),
        Commands::Simulate { script, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(simulate(cli.config.as_deref(), &script, json))
        }
        Commands::Version => {
            println!("scrollreel {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("✓ Configuration is valid");
    println!("  Segments: {}", config.segments.len());
    println!(
        "    Looping: {}",
        config
            .segments
            .iter()
            .filter(|s| s.active_loop().is_some())
            .count()
    );
    println!("  Notifier: {}", config.playback.notifier);
    println!("  Viewport height: {}px", config.scroll.viewport_height);

    let warnings = config.warnings();
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &warnings {
            println!("  - {}", warning);
        }
    }

    Ok(())
}

fn list_segments(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let table = config::segment_table(&config)?;
    let selector = SegmentSelector::new(table.len(), &config.controller_options().selector)?;

    if json {
        let rows: Vec<_> = table
            .iter()
            .enumerate()
            .map(|(i, segment)| {
                let band = selector.band(i);
                serde_json::json!({
                    "index": i,
                    "name": segment.name,
                    "start": segment.range.start,
                    "end": segment.range.end,
                    "loop": segment.loop_range,
                    "scroll_from": band.map(|b| b.0),
                    "scroll_to": band.map(|b| b.1),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "Segments: {} (scroll extent {}px)",
        table.len(),
        selector.max_offset()
    );
    for (i, segment) in table.iter().enumerate() {
        let looping = match segment.active_loop() {
            Some(range) => format!("loop {}", range),
            None => "pause at end".to_string(),
        };
        print!("  [{}] {:<12} {}  {}", i, segment.name, segment.range, looping);
        if let Some((from, to)) = selector.band(i) {
            print!("  scroll {:.0}..{:.0}px", from, to);
        }
        println!();
    }

    Ok(())
}

fn select_offset(config_path: Option<&Path>, offset: f64) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let table = config::segment_table(&config)?;
    let selector = SegmentSelector::new(table.len(), &config.controller_options().selector)?;

    let index = selector.select_index(offset);
    let name = table.by_index(index).map(|s| s.name.as_str()).unwrap_or("?");
    println!("{}px -> [{}] {}", offset, index, name);

    Ok(())
}

async fn simulate(config_path: Option<&Path>, script_path: &Path, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let script = Script::load(script_path)?;

    let events = Arc::new(EventBus::new(4096));
    let mut rx = events.subscribe();

    let (controller, video) = sim::mount_simulation(&config, Arc::clone(&events))?;
    let player = runtime::spawn_player(
        controller,
        PlayerOptions {
            frame_interval: config.video.frame_interval(),
            ..PlayerOptions::default()
        },
    );

    tracing::info!(
        steps = script.steps.len(),
        duration_ms = script.duration().as_millis() as u64,
        "Running script"
    );
    let outcome = script::run_script(&player, &script).await;
    let status = player.shutdown().await?;
    outcome?;

    let mut first = None;
    loop {
        match rx.try_recv() {
            Ok(event) => {
                if json {
                    println!("{}", serde_json::to_string(&event)?);
                } else {
                    let origin = *first.get_or_insert(event.timestamp);
                    let offset = (event.timestamp - origin).num_milliseconds() as f64 / 1000.0;
                    println!("{:>8.3}s  {}", offset, describe(&event.payload));
                }
            }
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!("{} events dropped from the output", skipped);
            }
            Err(_) => break,
        }
    }

    let snapshot = video.snapshot();
    if json {
        let summary = serde_json::json!({ "status": status, "video": snapshot });
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!(
            "\nFinal: {} on '{}' (index {}), video at {:.3}s, {} frames",
            status.phase, status.current_segment, status.active_index, snapshot.time, status.frames
        );
    }

    Ok(())
}

fn describe(event: &PlaybackEvent) -> String {
    match event {
        PlaybackEvent::MetadataReady => "metadata ready".to_string(),
        PlaybackEvent::LoadFailed { detail } => format!("load failed: {}", detail),
        PlaybackEvent::SegmentChanged { index, segment } => {
            format!("segment changed to [{}] {}", index, segment)
        }
        PlaybackEvent::MainStarted {
            segment,
            start,
            end,
        } => format!("{} main {:.3}s..{:.3}s", segment, start, end),
        PlaybackEvent::LoopArmed { segment, reason } => {
            format!("{} loop armed ({})", segment, reason)
        }
        PlaybackEvent::LoopWrapped { segment, from, to } => {
            format!("{} loop {:.3}s -> {:.3}s", segment, from, to)
        }
        PlaybackEvent::LoopWatcherStopped { segment } => {
            format!("{} loop watcher stopped", segment)
        }
        PlaybackEvent::PausedTerminal { segment, at } => {
            format!("{} paused at {:.3}s", segment, at)
        }
        PlaybackEvent::UnknownSegment { segment } => format!("unknown segment '{}'", segment),
        PlaybackEvent::TornDown => "torn down".to_string(),
    }
}
