//! Per-operation in-flight and error bookkeeping.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Kinds of gateway operation a slice tracks independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    /// Collection fetch.
    Fetch,
    /// Single-record fetch into the focus slot.
    Lookup,
    Create,
    Update,
    Delete,
    /// Goal progress reading.
    Progress,
    /// Goal status transition.
    Status,
    /// Goal recomputation from related data.
    Sync,
    /// Water intake logging.
    Water,
    /// Daily nutrition aggregate.
    Daily,
    /// Weight trend line.
    Trends,
    /// Weight summary statistics.
    Summary,
    /// Latest weight entry.
    Latest,
    /// Comparison of two weight entries.
    Compare,
    /// Bulk weight import.
    Import,
}

impl OperationKind {
    /// Stable name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Lookup => "lookup",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Progress => "progress",
            Self::Status => "status",
            Self::Sync => "sync",
            Self::Water => "water",
            Self::Daily => "daily",
            Self::Trends => "trends",
            Self::Summary => "summary",
            Self::Latest => "latest",
            Self::Compare => "compare",
            Self::Import => "import",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-flight flag and last error for one operation kind.
///
/// Overlapping attempts of the same kind are counted so the kind reports in
/// flight until the last of them settles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatus {
    #[serde(skip)]
    pending: u32,
    error: Option<String>,
}

impl OperationStatus {
    /// Whether an attempt of this kind is awaiting the gateway.
    pub fn in_flight(&self) -> bool {
        self.pending > 0
    }

    /// Message of the last failed attempt, until the next attempt begins.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Operation status for every kind a slice has attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationStatuses(BTreeMap<OperationKind, OperationStatus>);

impl OperationStatuses {
    /// Status of `kind`; idle with no error when never attempted.
    pub fn get(&self, kind: OperationKind) -> OperationStatus {
        self.0.get(&kind).cloned().unwrap_or_default()
    }

    /// Whether `kind` is in flight.
    pub fn in_flight(&self, kind: OperationKind) -> bool {
        self.0.get(&kind).is_some_and(OperationStatus::in_flight)
    }

    /// Whether any kind is in flight.
    pub fn any_in_flight(&self) -> bool {
        self.0.values().any(OperationStatus::in_flight)
    }

    /// Last error message of `kind`.
    pub fn error(&self, kind: OperationKind) -> Option<&str> {
        self.0.get(&kind).and_then(OperationStatus::error)
    }

    /// Mark a new attempt of `kind`: in flight, previous error cleared.
    pub fn begin(&mut self, kind: OperationKind) {
        let status = self.0.entry(kind).or_default();
        status.pending = status.pending.saturating_add(1);
        status.error = None;
    }

    /// Settle one attempt of `kind` successfully.
    pub fn succeed(&mut self, kind: OperationKind) {
        self.settle(kind);
    }

    /// Settle one attempt of `kind` with `message` as its error.
    pub fn fail(&mut self, kind: OperationKind, message: impl Into<String>) {
        let status = self.settle(kind);
        status.error = Some(message.into());
    }

    /// Clear the stored error of `kind`.
    pub fn clear_error(&mut self, kind: OperationKind) {
        if let Some(status) = self.0.get_mut(&kind) {
            status.error = None;
        }
    }

    /// Clear every stored error.
    pub fn clear_errors(&mut self) {
        for status in self.0.values_mut() {
            status.error = None;
        }
    }

    fn settle(&mut self, kind: OperationKind) -> &mut OperationStatus {
        let status = self.0.entry(kind).or_default();
        status.pending = status.pending.saturating_sub(1);
        status
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for operation bookkeeping.

    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn statuses() -> OperationStatuses {
        OperationStatuses::default()
    }

    #[rstest]
    fn begin_clears_previous_error(mut statuses: OperationStatuses) {
        statuses.begin(OperationKind::Delete);
        statuses.fail(OperationKind::Delete, "gateway down");
        assert_eq!(statuses.error(OperationKind::Delete), Some("gateway down"));
        assert!(!statuses.in_flight(OperationKind::Delete));

        statuses.begin(OperationKind::Delete);
        assert!(statuses.in_flight(OperationKind::Delete));
        assert_eq!(statuses.error(OperationKind::Delete), None);
    }

    #[rstest]
    fn kinds_are_independent(mut statuses: OperationStatuses) {
        statuses.begin(OperationKind::Progress);
        statuses.fail(OperationKind::Progress, "rejected");

        assert_eq!(statuses.error(OperationKind::Update), None);
        assert!(!statuses.in_flight(OperationKind::Update));
    }

    #[rstest]
    fn overlapping_attempts_stay_in_flight_until_last_settles(mut statuses: OperationStatuses) {
        statuses.begin(OperationKind::Update);
        statuses.begin(OperationKind::Update);
        statuses.succeed(OperationKind::Update);
        assert!(statuses.in_flight(OperationKind::Update));
        statuses.succeed(OperationKind::Update);
        assert!(!statuses.in_flight(OperationKind::Update));
        assert!(!statuses.any_in_flight());
    }

    #[rstest]
    fn explicit_clear_removes_errors(mut statuses: OperationStatuses) {
        statuses.begin(OperationKind::Fetch);
        statuses.fail(OperationKind::Fetch, "timeout");
        statuses.begin(OperationKind::Create);
        statuses.fail(OperationKind::Create, "invalid");

        statuses.clear_error(OperationKind::Fetch);
        assert_eq!(statuses.error(OperationKind::Fetch), None);
        assert_eq!(statuses.error(OperationKind::Create), Some("invalid"));

        statuses.clear_errors();
        assert_eq!(statuses.error(OperationKind::Create), None);
    }
}
