//! Scroll offset to segment index.
//!
//! The pinned region scrolls through `(N - 1) * unit` pixels, where the unit
//! defaults to one viewport height. Offset `o` selects
//! `clamp(floor(o / unit + epsilon), 0, N - 1)`; the small fractional bias
//! keeps the index from flickering when a scroll comes to rest exactly on a
//! segment boundary.

use scrollreel_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Selector tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorOptions {
    /// Pixels of pinned scroll per segment.
    pub viewport_height: f64,
    /// Fraction of a unit added before flooring.
    pub epsilon: f64,
}

impl Default for SelectorOptions {
    fn default() -> Self {
        Self {
            viewport_height: 900.0,
            epsilon: 0.1,
        }
    }
}

/// Edge-triggered mapping from scroll offset to segment index.
#[derive(Debug, Clone)]
pub struct SegmentSelector {
    unit: f64,
    epsilon: f64,
    count: usize,
    last: usize,
}

impl SegmentSelector {
    /// Create a selector for `count` segments, starting on index 0.
    pub fn new(count: usize, options: &SelectorOptions) -> Result<Self> {
        if count == 0 {
            return Err(Error::invalid_input("selector needs at least one segment"));
        }
        check_unit(options.viewport_height)?;
        if !options.epsilon.is_finite() || !(0.0..1.0).contains(&options.epsilon) {
            return Err(Error::invalid_input(format!(
                "epsilon must be in [0, 1), got {}",
                options.epsilon
            )));
        }
        Ok(Self {
            unit: options.viewport_height,
            epsilon: options.epsilon,
            count,
            last: 0,
        })
    }

    /// Index for `offset`, without touching the edge-trigger state.
    pub fn select_index(&self, offset: f64) -> usize {
        let raw = (offset / self.unit + self.epsilon).floor();
        if raw.is_nan() || raw <= 0.0 {
            return 0;
        }
        let max = (self.count - 1) as f64;
        raw.min(max) as usize
    }

    /// Feed a scroll offset. Returns the new index only when it differs
    /// from the last one returned.
    pub fn update(&mut self, offset: f64) -> Option<usize> {
        let index = self.select_index(offset);
        if index == self.last {
            return None;
        }
        self.last = index;
        Some(index)
    }

    /// Move the edge-trigger state without a scroll, e.g. after an explicit
    /// segment request. Returns whether the index changed.
    pub fn force(&mut self, index: usize) -> bool {
        let index = index.min(self.count - 1);
        let changed = index != self.last;
        self.last = index;
        changed
    }

    /// Change the pixels-per-segment unit (viewport resize).
    pub fn set_unit(&mut self, unit: f64) -> Result<()> {
        check_unit(unit)?;
        self.unit = unit;
        Ok(())
    }

    pub fn unit(&self) -> f64 {
        self.unit
    }

    pub fn last_index(&self) -> usize {
        self.last
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Total pinned scroll distance: `(N - 1) * unit`.
    pub fn max_offset(&self) -> f64 {
        (self.count - 1) as f64 * self.unit
    }

    /// Offsets `[from, to)` that select `index`, within `[0, max_offset]`.
    pub fn band(&self, index: usize) -> Option<(f64, f64)> {
        if index >= self.count {
            return None;
        }
        let from = ((index as f64 - self.epsilon) * self.unit).max(0.0);
        let to = if index + 1 == self.count {
            self.max_offset()
        } else {
            (index as f64 + 1.0 - self.epsilon) * self.unit
        };
        Some((from, to))
    }
}

fn check_unit(unit: f64) -> Result<()> {
    if !unit.is_finite() || unit <= 0.0 {
        return Err(Error::invalid_input(format!(
            "pixels per segment must be positive, got {unit}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector(count: usize) -> SegmentSelector {
        SegmentSelector::new(
            count,
            &SelectorOptions {
                viewport_height: 1000.0,
                epsilon: 0.1,
            },
        )
        .unwrap()
    }

    #[test]
    fn maps_offsets_with_bias() {
        let s = selector(3);
        assert_eq!(s.select_index(0.0), 0);
        assert_eq!(s.select_index(899.0), 0);
        assert_eq!(s.select_index(901.0), 1);
        assert_eq!(s.select_index(1000.0), 1);
        assert_eq!(s.select_index(1899.0), 1);
        assert_eq!(s.select_index(1901.0), 2);
    }

    #[test]
    fn clamps_out_of_range_offsets() {
        let s = selector(3);
        assert_eq!(s.select_index(-500.0), 0);
        assert_eq!(s.select_index(1e9), 2);
        assert_eq!(s.select_index(f64::NAN), 0);
        assert_eq!(s.select_index(f64::INFINITY), 2);
    }

    #[test]
    fn matches_formula_and_is_monotonic() {
        let s = selector(4);
        let mut previous = 0;
        let mut offset = 0.0;
        while offset < s.max_offset() {
            let expected = ((offset / 1000.0 + 0.1).floor() as i64).clamp(0, 3) as usize;
            let index = s.select_index(offset);
            assert_eq!(index, expected, "offset {offset}");
            assert!(index >= previous, "not monotonic at {offset}");
            previous = index;
            offset += 7.3;
        }
    }

    #[test]
    fn update_is_edge_triggered() {
        let mut s = selector(3);
        assert_eq!(s.update(0.0), None);
        assert_eq!(s.update(100.0), None);
        assert_eq!(s.update(950.0), Some(1));
        assert_eq!(s.update(950.0), None);
        assert_eq!(s.update(1200.0), None);
        assert_eq!(s.update(100.0), Some(0));
    }

    #[test]
    fn force_moves_trigger_state() {
        let mut s = selector(3);
        assert!(s.force(1));
        assert!(!s.force(1));
        assert_eq!(s.update(1000.0), None);
        assert!(s.force(99));
        assert_eq!(s.last_index(), 2);
    }

    #[test]
    fn max_offset_and_bands() {
        let s = selector(3);
        assert_eq!(s.max_offset(), 2000.0);
        let close = |(a, b): (f64, f64), (x, y): (f64, f64)| {
            (a - x).abs() < 1e-9 && (b - y).abs() < 1e-9
        };
        assert!(close(s.band(0).unwrap(), (0.0, 900.0)));
        assert!(close(s.band(1).unwrap(), (900.0, 1900.0)));
        assert!(close(s.band(2).unwrap(), (1900.0, 2000.0)));
        assert_eq!(s.band(3), None);
    }

    #[test]
    fn single_segment_never_changes() {
        let mut s = selector(1);
        assert_eq!(s.max_offset(), 0.0);
        assert_eq!(s.update(5000.0), None);
    }

    #[test]
    fn invalid_options_rejected() {
        assert!(SegmentSelector::new(0, &SelectorOptions::default()).is_err());
        let bad_unit = SelectorOptions {
            viewport_height: 0.0,
            epsilon: 0.1,
        };
        assert!(SegmentSelector::new(2, &bad_unit).is_err());
        let bad_eps = SelectorOptions {
            viewport_height: 800.0,
            epsilon: 1.5,
        };
        assert!(SegmentSelector::new(2, &bad_eps).is_err());

        let mut s = selector(2);
        assert!(s.set_unit(-1.0).is_err());
        assert!(s.set_unit(640.0).is_ok());
        assert_eq!(s.unit(), 640.0);
    }
}
