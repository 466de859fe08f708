//! Monotonic request sequencing used to fence stale gateway responses.

use std::collections::BTreeMap;

use crate::domain::{OperationKind, RecordId};

/// What a fenced response writes to.
///
/// Responses for different scopes never fence each other.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Scope {
    /// The collection cache and its pagination.
    Collection,
    /// A single record, in the collection cache or the focus slot.
    Record(RecordId),
    /// A derived cache such as weight trends or the daily nutrition total.
    Aggregate(OperationKind),
}

/// Issues sequence numbers and remembers the newest one applied per scope.
#[derive(Debug, Clone, Default)]
pub(crate) struct Sequencer {
    issued: u64,
    floor: u64,
    applied: BTreeMap<Scope, u64>,
}

impl Sequencer {
    /// Next sequence number; strictly greater than every earlier one.
    pub(crate) fn issue(&mut self) -> u64 {
        self.issued = self.issued.saturating_add(1);
        self.issued
    }

    /// Whether a response numbered `seq` is older than what `scope` already
    /// holds, or was issued before the last reset.
    pub(crate) fn is_stale(&self, scope: &Scope, seq: u64) -> bool {
        seq <= self.floor || self.applied.get(scope).is_some_and(|&last| last > seq)
    }

    /// Record that the response numbered `seq` was applied to `scope`.
    pub(crate) fn record(&mut self, scope: Scope, seq: u64) {
        let last = self.applied.entry(scope).or_default();
        *last = (*last).max(seq);
    }

    /// Forget applied responses and fence off everything issued so far.
    pub(crate) fn reset(&mut self) {
        self.floor = self.issued;
        self.applied.clear();
    }
}
