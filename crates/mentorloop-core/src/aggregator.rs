//! Sequence tracking for streamed assistant deltas.
//!
//! Tracks, per active assistant message, the highest accepted sequence
//! number. The actual accept/reject decision and content folding live in
//! [`crate::usecase::append_assistant_delta`]; this map only remembers what
//! was accepted so the controller can pass the right `last_seq_no` in.
//! Entries are cleared when a message reaches a terminal status to bound
//! memory.

use std::collections::HashMap;

use uuid::Uuid;

/// Last-accepted sequence number per in-flight assistant message.
#[derive(Debug, Default)]
pub struct DeltaAggregator {
    last_seq: HashMap<Uuid, u64>,
}

impl DeltaAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest sequence number accepted so far for `message_id` (0 if none).
    pub fn last_seq_no(&self, message_id: Uuid) -> u64 {
        self.last_seq.get(&message_id).copied().unwrap_or(0)
    }

    /// Reset tracking for a message about to start streaming.
    pub fn begin(&mut self, message_id: Uuid) {
        self.last_seq.insert(message_id, 0);
    }

    /// Record a delta that passed validation.
    pub fn record(&mut self, message_id: Uuid, seq_no: u64) {
        self.last_seq.insert(message_id, seq_no);
    }

    /// Drop tracking once the message is terminal.
    pub fn clear(&mut self, message_id: Uuid) {
        self.last_seq.remove(&message_id);
    }

    pub fn is_tracking(&self, message_id: Uuid) -> bool {
        self.last_seq.contains_key(&message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untracked_message_starts_at_zero() {
        let agg = DeltaAggregator::new();
        assert_eq!(agg.last_seq_no(Uuid::now_v7()), 0);
    }

    #[test]
    fn test_record_advances_last_seq() {
        let mut agg = DeltaAggregator::new();
        let id = Uuid::now_v7();
        agg.begin(id);
        agg.record(id, 1);
        agg.record(id, 2);
        assert_eq!(agg.last_seq_no(id), 2);
    }

    #[test]
    fn test_clear_drops_tracking() {
        let mut agg = DeltaAggregator::new();
        let id = Uuid::now_v7();
        agg.begin(id);
        agg.record(id, 7);
        agg.clear(id);
        assert!(!agg.is_tracking(id));
        assert_eq!(agg.last_seq_no(id), 0);
    }

    #[test]
    fn test_messages_are_tracked_independently() {
        let mut agg = DeltaAggregator::new();
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        agg.begin(a);
        agg.begin(b);
        agg.record(a, 5);
        assert_eq!(agg.last_seq_no(a), 5);
        assert_eq!(agg.last_seq_no(b), 0);
    }
}
