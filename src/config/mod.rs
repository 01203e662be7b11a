mod types;

pub use types::*;

use anyhow::{Context, Result};
use scrollreel_playback::SegmentTable;
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config).with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = ["./scrollreel.toml", "~/.config/scrollreel/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

/// Build the segment table the config describes.
pub fn segment_table(config: &Config) -> Result<SegmentTable> {
    SegmentTable::new(config.segments.clone()).context("Invalid segment table")
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    // Validate video source
    let video = &config.video;
    if !video.duration_secs.is_finite() || video.duration_secs <= 0.0 {
        anyhow::bail!("video.duration_secs must be positive");
    }
    if !video.frame_rate.is_finite() || video.frame_rate <= 0.0 {
        anyhow::bail!("video.frame_rate must be positive");
    }
    if video.frame_rate > MAX_FRAME_RATE {
        anyhow::bail!(
            "video.frame_rate {} exceeds the maximum of {}",
            video.frame_rate,
            MAX_FRAME_RATE
        );
    }

    // Validate playback tuning
    let buffer = config.playback.boundary_buffer_secs;
    if !buffer.is_finite() || buffer < 0.0 {
        anyhow::bail!("playback.boundary_buffer_secs cannot be negative");
    }

    // Validate scroll mapping
    let scroll = &config.scroll;
    if !scroll.viewport_height.is_finite() || scroll.viewport_height <= 0.0 {
        anyhow::bail!("scroll.viewport_height must be positive");
    }
    if !(0.0..1.0).contains(&scroll.epsilon) {
        anyhow::bail!("scroll.epsilon must be in [0, 1)");
    }

    // Validate segments
    segment_table(config)?;

    for warning in config.warnings() {
        tracing::warn!("{}", warning);
    }

    Ok(())
}
