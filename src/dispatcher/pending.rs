//! Table of in-flight requests awaiting their response.

use std::collections::HashMap;

use crate::message::ServiceRequest;

/// Id-keyed table of pending requests. Each entry leaves exactly once,
/// either matched by its response or swept by [`clear`](Self::clear).
/// Mutated only under the dispatcher's state lock.
#[derive(Debug, Default)]
pub(crate) struct PendingTable {
    by_id: HashMap<u64, ServiceRequest>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly dispatched request. Ids come from a monotonic
    /// allocator, so a returned entry means id reuse; callers log it.
    pub fn insert(&mut self, request: ServiceRequest) -> Option<ServiceRequest> {
        self.by_id.insert(request.id, request)
    }

    /// Take the entry for `request_id`, if present.
    pub fn remove(&mut self, request_id: u64) -> Option<ServiceRequest> {
        self.by_id.remove(&request_id)
    }

    pub fn contains(&self, request_id: u64) -> bool {
        self.by_id.contains_key(&request_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
    }
}

#[path = "pending_tests.rs"]
mod pending_tests;
