#![forbid(unsafe_code)]

//! Fixed-capacity ring buffer of completed camera transitions.
//!
//! The engine appends one record per finished transition (successful or
//! not). The buffer preserves the raw ordered sequence of the last N
//! transitions for debug introspection and is exposed read-only on every
//! snapshot. Nothing is persisted.

use std::collections::VecDeque;
use std::time::Duration;

use lightbox_core::animation::MovementKind;
use lightbox_core::geometry::CanvasPosition;
use lightbox_core::section::SectionId;
use web_time::Instant;

/// Default capacity if none is specified.
pub const DEFAULT_HISTORY_CAPACITY: usize = 64;

/// One finished camera transition.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRecord {
    /// Monotonic sequence number, starting at 1.
    pub seq: u64,
    /// Section the camera rested on when the transition began, if any.
    pub from_section: Option<SectionId>,
    /// Section the camera rests on afterwards, if any.
    pub to_section: Option<SectionId>,
    /// Starting position.
    pub from: CanvasPosition,
    /// Final position.
    pub to: CanvasPosition,
    /// Movement of the final leg.
    pub movement: MovementKind,
    /// Wall-clock time the transition took.
    pub duration: Duration,
    /// Whether it finished on time.
    pub success: bool,
    /// Retargets absorbed along the way.
    pub retargets: u32,
    /// When it completed.
    pub completed_at: Instant,
}

/// Fixed-capacity ring buffer of transitions.
///
/// When full, the oldest entry is evicted on each new `record()`.
#[derive(Debug, Clone)]
pub struct TransitionHistory {
    entries: VecDeque<TransitionRecord>,
    capacity: usize,
    next_seq: u64,
}

impl TransitionHistory {
    /// Create a history buffer with the given capacity.
    ///
    /// A capacity of 0 is clamped to 1.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_seq: 1,
        }
    }

    /// Append a record, assigning its sequence number.
    ///
    /// If the buffer is at capacity, the oldest entry is evicted.
    pub fn record(&mut self, mut record: TransitionRecord) -> u64 {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        record.seq = self.next_seq;
        self.next_seq += 1;
        let seq = record.seq;
        self.entries.push_back(record);
        seq
    }

    /// The most recent `n` transitions, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<&TransitionRecord> {
        let start = self.entries.len().saturating_sub(n);
        self.entries.range(start..).collect()
    }

    /// The newest record.
    #[must_use]
    pub fn last(&self) -> Option<&TransitionRecord> {
        self.entries.back()
    }

    /// All records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.entries.iter()
    }

    /// Copy of all records, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<TransitionRecord> {
        self.entries.iter().cloned().collect()
    }

    /// Number of records currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records ever appended, including evicted ones.
    #[must_use]
    pub fn total_recorded(&self) -> u64 {
        self.next_seq - 1
    }

    /// Clear all stored records. Sequence numbers keep counting.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for TransitionHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(to: SectionId) -> TransitionRecord {
        TransitionRecord {
            seq: 0,
            from_section: Some(SectionId::Capture),
            to_section: Some(to),
            from: CanvasPosition::ORIGIN,
            to: CanvasPosition::new(100.0, 0.0, 1.0),
            movement: MovementKind::PanTilt,
            duration: Duration::from_millis(800),
            success: true,
            retargets: 0,
            completed_at: Instant::now(),
        }
    }

    #[test]
    fn empty_history() {
        let h = TransitionHistory::with_capacity(10);
        assert!(h.is_empty());
        assert_eq!(h.capacity(), 10);
        assert!(h.recent(5).is_empty());
        assert!(h.last().is_none());
    }

    #[test]
    fn zero_capacity_is_clamped() {
        assert_eq!(TransitionHistory::with_capacity(0).capacity(), 1);
    }

    #[test]
    fn records_get_sequence_numbers() {
        let mut h = TransitionHistory::default();
        assert_eq!(h.record(record(SectionId::Focus)), 1);
        assert_eq!(h.record(record(SectionId::Frame)), 2);
        assert_eq!(h.last().map(|r| r.to_section), Some(Some(SectionId::Frame)));
    }

    #[test]
    fn eviction_at_capacity() {
        let mut h = TransitionHistory::with_capacity(3);
        for id in [
            SectionId::Focus,
            SectionId::Frame,
            SectionId::Exposure,
            SectionId::Develop,
        ] {
            h.record(record(id));
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.total_recorded(), 4);
        let recent = h.recent(10);
        assert_eq!(recent[0].to_section, Some(SectionId::Frame));
        assert_eq!(recent[2].to_section, Some(SectionId::Develop));
        assert_eq!(recent[2].seq, 4);
    }

    #[test]
    fn clear_keeps_counting() {
        let mut h = TransitionHistory::default();
        h.record(record(SectionId::Focus));
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.record(record(SectionId::Focus)), 2);
    }
}
