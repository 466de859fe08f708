//! Generic slice state and the request lifecycle every slice shares.
//!
//! A request runs in three steps: `begin` marks the operation kind in flight
//! (and takes a sequence number for fenced scopes), the gateway call is
//! awaited with no lock held, then `settle` reconciles the outcome under a
//! single lock acquisition. A failure never touches the cached records.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use mockable::Clock;
use pagination::{Page, Pagination, PaginationPatch};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::ports::GatewayError;
use crate::domain::{Error, OperationKind, OperationStatuses, Record, RecordId};

use super::sequencer::{Scope, Sequencer};
use super::{SliceOptions, StaleResponsePolicy};

/// Cached records, focus slot and bookkeeping for one domain.
///
/// ## Invariants
/// - `items` never holds two records with the same id.
/// - A cached record is only replaced by one whose `updated_at` is not older,
///   except when rolling back an optimistic change.
/// - A record with a pending optimistic change has its last confirmed
///   version kept aside until the change is confirmed or rolled back.
#[derive(Debug, Clone)]
pub struct SliceState<R, F, C = ()> {
    items: Vec<R>,
    current: Option<R>,
    pagination: Pagination,
    filters: F,
    operations: OperationStatuses,
    confirmed: BTreeMap<RecordId, R>,
    caches: C,
    last_synced_at: Option<DateTime<Utc>>,
    sequencer: Sequencer,
}

impl<R, F, C> SliceState<R, F, C> {
    /// Records loaded by the last fetch plus local creations, in display order.
    pub fn items(&self) -> &[R] {
        &self.items
    }

    /// Focus record, set by single-record lookups, creations and updates.
    pub fn current(&self) -> Option<&R> {
        self.current.as_ref()
    }

    /// Position of the cached page within the remote result set.
    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    /// Filters applied to the next fetch.
    pub fn filters(&self) -> &F {
        &self.filters
    }

    /// In-flight flags and last errors per operation kind.
    pub fn operations(&self) -> &OperationStatuses {
        &self.operations
    }

    /// Domain-specific derived caches.
    pub fn caches(&self) -> &C {
        &self.caches
    }

    /// When the collection cache was last replaced by a fetch.
    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.last_synced_at
    }

    /// Whether `id` carries an optimistic change awaiting confirmation.
    pub fn is_optimistic(&self, id: &RecordId) -> bool {
        self.confirmed.contains_key(id)
    }

    /// Ids carrying optimistic changes awaiting confirmation.
    pub fn optimistic_ids(&self) -> impl Iterator<Item = &RecordId> {
        self.confirmed.keys()
    }

    /// Last confirmed version of a record with a pending optimistic change.
    pub fn confirmed(&self, id: &RecordId) -> Option<&R> {
        self.confirmed.get(id)
    }
}

impl<R, F, C> SliceState<R, F, C>
where
    R: Record,
    F: Default,
    C: Default,
{
    pub(crate) fn new(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            current: None,
            pagination: Pagination::from_response(1, page_size, 0),
            filters: F::default(),
            operations: OperationStatuses::default(),
            confirmed: BTreeMap::new(),
            caches: C::default(),
            last_synced_at: None,
            sequencer: Sequencer::default(),
        }
    }

    /// Cached record with `id`.
    pub fn get(&self, id: &RecordId) -> Option<&R> {
        self.items.iter().find(|record| record.id() == id)
    }

    /// Index of `id` in the collection cache.
    pub fn position(&self, id: &RecordId) -> Option<usize> {
        self.items.iter().position(|record| record.id() == id)
    }

    pub(crate) fn caches_mut(&mut self) -> &mut C {
        &mut self.caches
    }

    pub(crate) fn reset(&mut self, page_size: u32) {
        let mut sequencer = std::mem::take(&mut self.sequencer);
        sequencer.reset();
        *self = Self::new(page_size);
        self.sequencer = sequencer;
    }

    pub(crate) fn replace_page(&mut self, page: &Page<R>, now: DateTime<Utc>) {
        self.items = dedupe(page.data.iter().cloned());
        self.pagination = page.pagination;
        self.confirmed.clear();
        self.last_synced_at = Some(now);
    }

    /// Put `record` at the front of the collection and focus it.
    pub(crate) fn prepend(&mut self, record: &R) {
        self.items.retain(|existing| existing.id() != record.id());
        self.items.insert(0, record.clone());
        self.current = Some(record.clone());
    }

    /// Put `records` at the front of the collection, keeping their order.
    pub(crate) fn prepend_all(&mut self, records: &[R]) {
        let incoming: BTreeSet<&RecordId> = records.iter().map(Record::id).collect();
        self.items.retain(|existing| !incoming.contains(existing.id()));
        let mut items = dedupe(records.iter().cloned());
        items.append(&mut self.items);
        self.items = items;
    }

    /// Replace the cached copies of `record` in place.
    pub(crate) fn replace(&mut self, record: &R) {
        let id = record.id();
        if let Some(slot) = self.items.iter_mut().find(|existing| existing.id() == id) {
            overwrite_if_newer(slot, record);
        }
        if let Some(current) = self.current.as_mut().filter(|existing| existing.id() == id) {
            overwrite_if_newer(current, record);
        }
    }

    pub(crate) fn focus(&mut self, record: &R) {
        match self.current.as_mut() {
            Some(current) if current.id() == record.id() => {
                overwrite_if_newer(current, record);
                return;
            }
            _ => {}
        }
        self.current = Some(record.clone());
    }

    pub(crate) fn clear_current(&mut self) {
        self.current = None;
    }

    /// Drop `id` from the cache; the total shrinks even on a local miss.
    pub(crate) fn remove(&mut self, id: &RecordId) {
        self.items.retain(|record| record.id() != id);
        if self.current.as_ref().is_some_and(|record| record.id() == id) {
            self.current = None;
        }
        self.confirmed.remove(id);
        self.pagination.decrement_total();
    }

    pub(crate) fn update_filters(&mut self, change: impl FnOnce(&mut F)) {
        change(&mut self.filters);
        self.pagination.reset_page();
    }

    pub(crate) fn reset_filters(&mut self) {
        self.filters = F::default();
        self.pagination.reset_page();
    }

    pub(crate) fn set_pagination(&mut self, patch: PaginationPatch) {
        self.pagination.apply(patch);
    }

    pub(crate) fn add_to_total(&mut self, count: u64) {
        self.pagination.add_to_total(count);
    }

    pub(crate) fn operations_mut(&mut self) -> &mut OperationStatuses {
        &mut self.operations
    }

    /// Apply `change` locally to every cached copy of `id`, keeping the last
    /// confirmed version aside. Returns `false` when `id` is not cached.
    pub(crate) fn stage_optimistic(&mut self, id: &RecordId, change: impl Fn(&mut R)) -> bool {
        let baseline = self
            .get(id)
            .or_else(|| self.current.as_ref().filter(|record| record.id() == id))
            .cloned();
        let Some(baseline) = baseline else {
            return false;
        };
        self.confirmed.entry(id.clone()).or_insert(baseline);

        if let Some(slot) = self.items.iter_mut().find(|record| record.id() == id) {
            change(slot);
        }
        if let Some(current) = self.current.as_mut().filter(|record| record.id() == id) {
            change(current);
        }
        true
    }

    /// Accept the optimistic change on `id` as confirmed.
    pub(crate) fn confirm_optimistic(&mut self, id: &RecordId) -> bool {
        self.confirmed.remove(id).is_some()
    }

    /// Restore the last confirmed version of `id`.
    pub(crate) fn rollback_optimistic(&mut self, id: &RecordId) -> bool {
        let Some(baseline) = self.confirmed.remove(id) else {
            return false;
        };
        if let Some(slot) = self.items.iter_mut().find(|record| record.id() == id) {
            slot.clone_from(&baseline);
        }
        if let Some(current) = self.current.as_mut().filter(|record| record.id() == id) {
            *current = baseline;
        }
        debug!(%id, "rolled back optimistic change");
        true
    }
}

impl<R, F, C> SliceState<R, F, C>
where
    R: Record,
    F: Clone + Default,
    C: Default,
{
    pub(crate) fn to_snapshot(&self) -> SliceSnapshot<R, F> {
        SliceSnapshot {
            items: self.items.clone(),
            current: self.current.clone(),
            pagination: self.pagination,
            filters: self.filters.clone(),
        }
    }

    pub(crate) fn restore(&mut self, snapshot: SliceSnapshot<R, F>) {
        self.items = dedupe(snapshot.items);
        self.current = snapshot.current;
        self.pagination = snapshot.pagination;
        self.filters = snapshot.filters;
        self.confirmed.clear();
    }
}

fn begin_locked<R, F, C>(
    state: &mut SliceState<R, F, C>,
    kind: OperationKind,
    scope: Option<Scope>,
) -> Ticket {
    state.operations.begin(kind);
    let fence = scope.map(|scope| (scope, state.sequencer.issue()));
    Ticket {
        kind,
        fence,
        staged: None,
    }
}

fn overwrite_if_newer<R: Record>(slot: &mut R, record: &R) {
    if record.updated_at() < slot.updated_at() {
        debug!(
            id = %record.id(),
            cached = %slot.updated_at(),
            received = %record.updated_at(),
            "ignored response older than cached record"
        );
        return;
    }
    slot.clone_from(record);
}

fn dedupe<R: Record>(records: impl IntoIterator<Item = R>) -> Vec<R> {
    let mut seen = BTreeSet::new();
    let mut items = Vec::new();
    for record in records {
        if seen.insert(record.id().clone()) {
            items.push(record);
        } else {
            warn!(id = %record.id(), "dropped duplicate record from page");
        }
    }
    items
}

/// Persisted part of a slice: records, focus, pagination and filters.
///
/// In-flight flags, errors and optimistic bookkeeping are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceSnapshot<R, F> {
    /// Cached collection in display order.
    pub items: Vec<R>,
    /// Focused record; older snapshots may omit it.
    #[serde(default = "Option::default")]
    pub current: Option<R>,
    /// Page position and server total.
    pub pagination: Pagination,
    /// Filters the collection was last fetched with.
    pub filters: F,
}

/// Handle on an in-flight request.
#[derive(Debug)]
pub(crate) struct Ticket {
    kind: OperationKind,
    fence: Option<(Scope, u64)>,
    /// Record whose optimistic change this request settles.
    staged: Option<RecordId>,
}

/// Shared state plus the request lifecycle around it.
pub(crate) struct SliceCore<R, F, C = ()> {
    state: Arc<Mutex<SliceState<R, F, C>>>,
    clock: Arc<dyn Clock>,
    options: SliceOptions,
}

impl<R, F, C> SliceCore<R, F, C>
where
    R: Record,
    F: Clone + Default + Send,
    C: Default + Send,
{
    pub(crate) fn new(clock: Arc<dyn Clock>, options: SliceOptions) -> Self {
        Self {
            state: Arc::new(Mutex::new(SliceState::new(options.page_size))),
            clock,
            options,
        }
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    pub(crate) fn options(&self) -> SliceOptions {
        self.options
    }

    fn lock(&self) -> MutexGuard<'_, SliceState<R, F, C>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn read<T>(&self, view: impl FnOnce(&SliceState<R, F, C>) -> T) -> T {
        view(&self.lock())
    }

    pub(crate) fn mutate<T>(&self, change: impl FnOnce(&mut SliceState<R, F, C>) -> T) -> T {
        change(&mut self.lock())
    }

    pub(crate) fn snapshot(&self) -> SliceState<R, F, C>
    where
        C: Clone,
    {
        self.lock().clone()
    }

    pub(crate) fn reset(&self) {
        self.lock().reset(self.options.page_size);
    }

    pub(crate) fn begin(&self, kind: OperationKind, scope: Option<Scope>) -> Ticket {
        begin_locked(&mut self.lock(), kind, scope)
    }

    pub(crate) fn settle<T>(
        &self,
        ticket: Ticket,
        outcome: Result<T, GatewayError>,
        apply: impl FnOnce(&mut SliceState<R, F, C>, &T),
    ) -> Result<T, Error> {
        self.settle_or_revert(ticket, outcome, apply, |_| {})
    }

    /// Settle `ticket`; `revert` runs instead of `apply` when a fresh
    /// response reports failure.
    pub(crate) fn settle_or_revert<T>(
        &self,
        ticket: Ticket,
        outcome: Result<T, GatewayError>,
        apply: impl FnOnce(&mut SliceState<R, F, C>, &T),
        revert: impl FnOnce(&mut SliceState<R, F, C>),
    ) -> Result<T, Error> {
        let Ticket {
            kind,
            fence,
            staged,
        } = ticket;
        let mut state = self.lock();
        let stale = self.options.stale_responses == StaleResponsePolicy::Discard
            && fence
                .as_ref()
                .is_some_and(|(scope, seq)| state.sequencer.is_stale(scope, *seq));

        if stale {
            debug!(operation = %kind, ok = outcome.is_ok(), "discarded stale response");
            // A newer response owns the record now; its baseline is gone.
            if let Some(id) = staged.as_ref() {
                state.confirm_optimistic(id);
            }
            state.operations.succeed(kind);
            return outcome.map_err(Error::from);
        }

        match outcome {
            Ok(value) => {
                if let Some((scope, seq)) = fence {
                    state.sequencer.record(scope, seq);
                }
                apply(&mut state, &value);
                state.operations.succeed(kind);
                Ok(value)
            }
            Err(error) => {
                debug!(operation = %kind, error = %error, reason = error.label(), "gateway call failed");
                revert(&mut state);
                let error = Error::from(error);
                state.operations.fail(kind, error.message());
                Err(error)
            }
        }
    }

    pub(crate) async fn run<T, Fut>(
        &self,
        kind: OperationKind,
        scope: Option<Scope>,
        call: Fut,
        apply: impl FnOnce(&mut SliceState<R, F, C>, &T) + Send,
    ) -> Result<T, Error>
    where
        Fut: Future<Output = Result<T, GatewayError>> + Send,
    {
        let ticket = self.begin(kind, scope);
        let outcome = call.await;
        self.settle(ticket, outcome, apply)
    }

    /// Replace the collection with a fetched page.
    pub(crate) async fn fetch_page<Fut>(&self, call: Fut) -> Result<Page<R>, Error>
    where
        Fut: Future<Output = Result<Page<R>, GatewayError>> + Send,
    {
        let now = self.now();
        self.run(
            OperationKind::Fetch,
            Some(Scope::Collection),
            call,
            move |state, page| state.replace_page(page, now),
        )
        .await
    }

    /// Load one record into the focus slot; the collection is untouched.
    pub(crate) async fn fetch_one<Fut>(&self, id: &RecordId, call: Fut) -> Result<R, Error>
    where
        Fut: Future<Output = Result<R, GatewayError>> + Send,
    {
        self.run(
            OperationKind::Lookup,
            Some(Scope::Record(id.clone())),
            call,
            |state, record| state.focus(record),
        )
        .await
    }

    /// Prepend a created record, focus it and grow the total.
    pub(crate) async fn create<Fut>(&self, call: Fut) -> Result<R, Error>
    where
        Fut: Future<Output = Result<R, GatewayError>> + Send,
    {
        self.run(OperationKind::Create, None, call, |state, record| {
            state.prepend(record);
            state.pagination.increment_total();
        })
        .await
    }

    /// Replace a record in place with the gateway's post-mutation copy.
    pub(crate) async fn replace<Fut>(
        &self,
        kind: OperationKind,
        id: &RecordId,
        call: Fut,
    ) -> Result<R, Error>
    where
        Fut: Future<Output = Result<R, GatewayError>> + Send,
    {
        self.run(kind, Some(Scope::Record(id.clone())), call, |state, record| {
            state.replace(record);
        })
        .await
    }

    /// Run an optimistic mutation: `change` is applied before the call, the
    /// server copy replaces it on success and the confirmed version comes
    /// back on failure.
    pub(crate) async fn replace_optimistically<Fut>(
        &self,
        kind: OperationKind,
        id: &RecordId,
        change: impl Fn(&mut R) + Send,
        call: Fut,
    ) -> Result<R, Error>
    where
        Fut: Future<Output = Result<R, GatewayError>> + Send,
    {
        let ticket = {
            let mut state = self.lock();
            state.stage_optimistic(id, change);
            let mut ticket = begin_locked(&mut state, kind, Some(Scope::Record(id.clone())));
            ticket.staged = Some(id.clone());
            ticket
        };
        let outcome = call.await;
        self.settle_or_revert(
            ticket,
            outcome,
            |state, record| {
                state.confirm_optimistic(id);
                state.replace(record);
            },
            |state| {
                state.rollback_optimistic(id);
            },
        )
    }

    /// Delete a record; unfenced, so a late delete always lands.
    pub(crate) async fn remove<Fut>(&self, id: &RecordId, call: Fut) -> Result<(), Error>
    where
        Fut: Future<Output = Result<(), GatewayError>> + Send,
    {
        self.run(OperationKind::Delete, None, call, |state, _| state.remove(id))
            .await
    }
}

impl<R, F, C> SliceCore<R, F, C>
where
    R: Record + Serialize + DeserializeOwned,
    F: Clone + Default + Send + Serialize + DeserializeOwned,
    C: Default + Send,
{
    pub(crate) fn export(&self) -> Result<Value, serde_json::Error> {
        let snapshot = self.read(SliceState::to_snapshot);
        serde_json::to_value(snapshot)
    }

    pub(crate) fn hydrate(&self, snapshot: Value) -> Result<(), serde_json::Error> {
        let snapshot: SliceSnapshot<R, F> = serde_json::from_value(snapshot)?;
        self.mutate(|state| state.restore(snapshot));
        Ok(())
    }
}

#[cfg(test)]
#[path = "slice_tests.rs"]
mod tests;
