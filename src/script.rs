//! Scripted scroll sessions.
//!
//! A script is a list of host events stamped with the time they happen,
//! relative to the start of the run. Scripts load from TOML or JSON:
//!
//! ```toml
//! tail_ms = 1500
//!
//! [[steps]]
//! at_ms = 0
//! event = "metadata_ready"
//!
//! [[steps]]
//! at_ms = 6000
//! event = "scroll"
//! offset = 950.0
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::runtime::{HostEvent, PlayerError, PlayerHandle};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Milliseconds after the run starts
    pub at_ms: u64,

    #[serde(flatten)]
    pub event: HostEvent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// How long to keep running after the last step
    #[serde(default)]
    pub tail_ms: u64,

    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

impl Script {
    /// Load a script, choosing the format by extension (`.json` or TOML).
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script: {:?}", path))?;

        let script: Script = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse script: {:?}", path))?,
            _ => toml::from_str(&content)
                .with_context(|| format!("Failed to parse script: {:?}", path))?,
        };

        script.validate()?;
        Ok(script)
    }

    /// Steps must be in time order.
    pub fn validate(&self) -> Result<()> {
        for pair in self.steps.windows(2) {
            if pair[1].at_ms < pair[0].at_ms {
                anyhow::bail!(
                    "Script steps out of order: {}ms comes after {}ms",
                    pair[1].at_ms,
                    pair[0].at_ms
                );
            }
        }
        Ok(())
    }

    /// Total run time including the tail.
    pub fn duration(&self) -> Duration {
        let last = self.steps.last().map(|s| s.at_ms).unwrap_or(0);
        Duration::from_millis(last + self.tail_ms)
    }
}

/// Play `script` against a running player, returning once the tail has
/// elapsed.
pub async fn run_script(player: &PlayerHandle, script: &Script) -> Result<(), PlayerError> {
    let start = tokio::time::Instant::now();

    for step in &script.steps {
        tokio::time::sleep_until(start + Duration::from_millis(step.at_ms)).await;
        tracing::debug!(at_ms = step.at_ms, event = ?step.event, "Script step");
        player.send(step.event.clone()).await?;
    }

    tokio::time::sleep_until(start + script.duration()).await;
    Ok(())
}
