//! Request Store
//!
//! In-memory store of workflow records, one per kind. Decisions on a
//! single request serialize on its map entry.

use dashmap::DashMap;

use super::state::RequestState;
use super::types::{RequestId, RequestRecord};

/// Concurrent store of `RequestRecord<P, S>` keyed by `RequestId`.
///
/// # Lock Order
///
/// `with_mut` holds the record's map entry while the closure runs, and the
/// closure may take account locks. Nothing in the crate acquires a record
/// entry while holding an account lock, so the record -> account order is
/// global and cannot deadlock.
pub struct RequestStore<P, S> {
    records: DashMap<RequestId, RequestRecord<P, S>>,
}

impl<P, S> Default for RequestStore<P, S>
where
    P: Clone,
    S: RequestState,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P, S> RequestStore<P, S>
where
    P: Clone,
    S: RequestState,
{
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Persist a new record. ULID keys do not collide in practice; an
    /// existing entry under the same id would be replaced.
    pub fn insert(&self, record: RequestRecord<P, S>) {
        self.records.insert(record.id, record);
    }

    /// Owned copy of a record, or `None` for an unknown id
    pub fn get(&self, id: &RequestId) -> Option<RequestRecord<P, S>> {
        self.records.get(id).map(|entry| entry.value().clone())
    }

    /// Run `f` with exclusive access to the record.
    ///
    /// This is the serialization point for concurrent decisions on one
    /// request: the second decider blocks here until the first one's
    /// closure finishes, then observes whatever state it left behind.
    pub fn with_mut<T>(
        &self,
        id: &RequestId,
        f: impl FnOnce(&mut RequestRecord<P, S>) -> T,
    ) -> Option<T> {
        self.records.get_mut(id).map(|mut entry| f(entry.value_mut()))
    }

    /// Undecided requests in creation order (the back-office queue).
    /// Ids mint monotonically, so ordering by id is ordering by creation.
    pub fn pending(&self) -> Vec<RequestRecord<P, S>> {
        let mut pending: Vec<RequestRecord<P, S>> = self
            .records
            .iter()
            .filter(|entry| !entry.value().status.is_terminal())
            .map(|entry| entry.value().clone())
            .collect();
        pending.sort_unstable_by_key(|record| record.id);
        pending
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
