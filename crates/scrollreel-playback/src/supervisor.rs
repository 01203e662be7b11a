//! Idle-loop supervisor.
//!
//! Tracks when scrolling last happened and reports, once, when it has been
//! quiet for the idle threshold. The controller then re-arms the loop for the
//! current segment, which recovers a loop that was dropped by an interrupted
//! segment switch.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Supervisor tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleOptions {
    /// Quiet period after the last scroll event before the loop is re-armed.
    pub idle_threshold_ms: u64,
}

impl Default for IdleOptions {
    fn default() -> Self {
        Self {
            idle_threshold_ms: 800,
        }
    }
}

/// Debounce over scroll activity.
#[derive(Debug, Clone)]
pub struct IdleLoopSupervisor {
    /// How long scrolling must stop before it counts as idle
    threshold: Duration,
    /// Time of the last activity still waiting to settle
    last_activity: Option<Instant>,
}

impl IdleLoopSupervisor {
    pub fn new(options: &IdleOptions) -> Self {
        Self {
            threshold: Duration::from_millis(options.idle_threshold_ms),
            last_activity: None,
        }
    }

    /// Record a scroll event, restarting the quiet period.
    pub fn activity(&mut self, now: Instant) {
        self.last_activity = Some(now);
    }

    /// Forget pending activity so nothing fires.
    pub fn cancel(&mut self) {
        self.last_activity = None;
    }

    /// Whether the quiet period has just elapsed. True at most once per
    /// burst of activity.
    pub fn check_idle(&mut self, now: Instant) -> bool {
        match self.last_activity {
            Some(last) if now.duration_since(last) >= self.threshold => {
                self.last_activity = None;
                true
            }
            _ => false,
        }
    }

    /// When the pending quiet period ends.
    pub fn deadline(&self) -> Option<Instant> {
        self.last_activity.map(|last| last + self.threshold)
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn fires_once_after_quiet_period() {
        let start = Instant::now();
        let mut sup = IdleLoopSupervisor::new(&IdleOptions::default());
        sup.activity(start);

        assert!(!sup.check_idle(start + ms(799)));
        assert!(sup.check_idle(start + ms(800)));
        assert!(!sup.check_idle(start + ms(5000)));
    }

    #[test]
    fn continuous_activity_never_fires() {
        let start = Instant::now();
        let mut sup = IdleLoopSupervisor::new(&IdleOptions::default());
        let mut fired = 0;
        for step in 0..=20 {
            let now = start + ms(step * 100);
            sup.activity(now);
            for probe in [10, 50, 99] {
                if sup.check_idle(now + ms(probe)) {
                    fired += 1;
                }
            }
        }
        assert_eq!(fired, 0);
    }

    #[test]
    fn cancel_suppresses_pending_fire() {
        let start = Instant::now();
        let mut sup = IdleLoopSupervisor::new(&IdleOptions::default());
        sup.activity(start);
        sup.cancel();
        assert_eq!(sup.deadline(), None);
        assert!(!sup.check_idle(start + ms(2000)));
    }

    #[test]
    fn deadline_tracks_latest_activity() {
        let start = Instant::now();
        let mut sup = IdleLoopSupervisor::new(&IdleOptions {
            idle_threshold_ms: 250,
        });
        sup.activity(start);
        sup.activity(start + ms(100));
        assert_eq!(sup.deadline(), Some(start + ms(350)));
        assert_eq!(sup.threshold(), ms(250));
    }
}
