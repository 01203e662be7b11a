//! Segment table: the named time ranges a scroll position can select.
//!
//! Each main segment may carry a loop range that is replayed once the main
//! range has played through. The association is typed, so a missing loop is
//! `None` rather than a failed string lookup at playback time.

use std::collections::{BTreeMap, HashSet};

use scrollreel_common::{Error, Result, TimeRange};
use serde::{Deserialize, Serialize};

/// Suffix used by the flat, name-keyed table form for loop entries.
pub const LOOP_SUFFIX: &str = "Loop";

/// One narrative beat of the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Unique name, used by explicit requests such as a "play action" button.
    pub name: String,
    /// Range played once when the segment is entered.
    #[serde(flatten)]
    pub range: TimeRange,
    /// Range repeated after the main range ends. `None` pauses at the end.
    #[serde(default, rename = "loop", skip_serializing_if = "Option::is_none")]
    pub loop_range: Option<TimeRange>,
}

impl Segment {
    /// Create a segment without a loop.
    pub fn new(name: impl Into<String>, start: f64, end: f64) -> Result<Self> {
        let name = name.into();
        let range =
            TimeRange::new(start, end).map_err(|e| Error::invalid_segment(&name, e.to_string()))?;
        Ok(Self {
            name,
            range,
            loop_range: None,
        })
    }

    /// Attach a loop range.
    pub fn with_loop(mut self, start: f64, end: f64) -> Result<Self> {
        let range = TimeRange::new(start, end)
            .map_err(|e| Error::invalid_segment(&self.name, format!("loop: {e}")))?;
        self.loop_range = Some(range);
        Ok(self)
    }

    /// The loop range if it is usable, i.e. present and not zero-length.
    pub fn active_loop(&self) -> Option<TimeRange> {
        self.loop_range.filter(|r| !r.is_degenerate())
    }
}

/// Ordered set of main segments.
///
/// The order is the scroll order: index 0 is shown at the top of the pinned
/// region, index `len() - 1` at the bottom.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentTable {
    segments: Vec<Segment>,
}

impl SegmentTable {
    /// Build a table, validating every segment.
    pub fn new(segments: Vec<Segment>) -> Result<Self> {
        if segments.is_empty() {
            return Err(Error::invalid_table("at least one segment is required"));
        }

        let mut seen = HashSet::new();
        for segment in &segments {
            if segment.name.is_empty() {
                return Err(Error::invalid_table("segment names must not be empty"));
            }
            if !seen.insert(segment.name.as_str()) {
                return Err(Error::invalid_table(format!(
                    "duplicate segment name '{}'",
                    segment.name
                )));
            }

            segment
                .range
                .check()
                .map_err(|e| Error::invalid_segment(&segment.name, e.to_string()))?;

            if let Some(loop_range) = &segment.loop_range {
                loop_range
                    .check()
                    .map_err(|e| Error::invalid_segment(&segment.name, format!("loop: {e}")))?;

                // Authored tables sometimes loop a tail that runs past the
                // main range; playback handles it, so only flag it.
                if !segment.range.contains_range(loop_range) {
                    tracing::warn!(
                        segment = %segment.name,
                        range = %segment.range,
                        loop_range = %loop_range,
                        "Loop range lies outside its segment"
                    );
                }
            }
        }

        Ok(Self { segments })
    }

    /// Build a table from the flat form: `order` names the main segments and
    /// `ranges` holds both `name` and `name + "Loop"` entries.
    ///
    /// Every ordered name needs its own entry. A `xLoop` entry whose `x` is
    /// not in `order` is rejected instead of being silently ignored.
    pub fn from_named_ranges(order: &[&str], ranges: &BTreeMap<String, TimeRange>) -> Result<Self> {
        let mains: HashSet<&str> = order.iter().copied().collect();

        for key in ranges.keys() {
            if mains.contains(key.as_str()) {
                continue;
            }
            if let Some(parent) = key.strip_suffix(LOOP_SUFFIX) {
                if !parent.is_empty() && !mains.contains(parent) {
                    return Err(Error::invalid_table(format!(
                        "loop entry '{key}' has no main segment '{parent}'"
                    )));
                }
            }
        }

        let segments = order
            .iter()
            .map(|name| {
                let range = ranges
                    .get(*name)
                    .copied()
                    .ok_or_else(|| Error::invalid_table(format!("no range for segment '{name}'")))?;
                let loop_range = ranges.get(&format!("{name}{LOOP_SUFFIX}")).copied();
                Ok(Segment {
                    name: (*name).to_string(),
                    range,
                    loop_range,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(segments)
    }

    /// Number of main segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false: construction rejects empty tables.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Look up a segment by name.
    pub fn get(&self, name: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.name == name)
    }

    /// Scroll-order index of a segment.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.segments.iter().position(|s| s.name == name)
    }

    /// Segment at a scroll-order index.
    pub fn by_index(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// Main segment names in scroll order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|s| s.name.as_str())
    }

    /// Iterate segments in scroll order.
    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    /// The first segment, played when the video becomes ready.
    pub fn first(&self) -> &Segment {
        // Non-empty by construction.
        &self.segments[0]
    }
}

impl<'a> IntoIterator for &'a SegmentTable {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}
