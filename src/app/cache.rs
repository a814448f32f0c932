//! Explicit staleness store for server resources.
//!
//! Two query keys exist: the full user list and one detail entry per user
//! id. Invalidation only marks an entry stale; readers keep seeing the old
//! value until the event loop claims a refetch and its settlement lands.
//! Nothing outside fetch settlements ever writes resource data.

use std::collections::HashMap;

use tracing::debug;

use crate::api::{ApiError, ApiResult, User, UserList};

/// Cached state for one query key.
#[derive(Clone, Debug)]
pub struct QueryState<T> {
    pub data: Option<T>,
    stale: bool,
    in_flight: bool,
    pub error: Option<String>,
}

impl<T> QueryState<T> {
    /// A fresh entry starts stale so the first pump fetches it.
    fn new() -> Self {
        Self {
            data: None,
            stale: true,
            in_flight: false,
            error: None,
        }
    }

    /// True while no data has ever arrived and a fetch is outstanding.
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.error.is_none()
    }

    /// Whether a refetch should be dispatched now. Stale entries with a
    /// fetch already in flight are left alone; a second invalidation
    /// collapses into the outstanding one.
    pub fn needs_fetch(&self) -> bool {
        self.stale && !self.in_flight
    }

    /// Claim the outstanding refetch slot. Clears the stale mark so an
    /// invalidation arriving mid-flight re-queues exactly one more fetch.
    pub fn claim_fetch(&mut self) {
        self.stale = false;
        self.in_flight = true;
    }

    fn invalidate(&mut self) {
        self.stale = true;
    }

    fn settle(&mut self, result: Result<T, ApiError>) {
        self.in_flight = false;
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
            }
            Err(e) => {
                self.error = Some(e.to_string());
            }
        }
    }
}

/// The shared client-side cache plus the invalidation rules applied after
/// mutations. Only this coordinator marks entries stale.
#[derive(Debug)]
pub struct QueryCache {
    pub list: QueryState<UserList>,
    details: HashMap<String, QueryState<User>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            list: QueryState::new(),
            details: HashMap::new(),
        }
    }

    pub fn detail(&self, id: &str) -> Option<&QueryState<User>> {
        self.details.get(id)
    }

    /// Entry for the given id, created stale on first access.
    pub fn detail_mut(&mut self, id: &str) -> &mut QueryState<User> {
        self.details.entry(id.to_string()).or_insert_with(QueryState::new)
    }

    /// Invalidate the key set affected by a successful mutation: the list
    /// always, and the detail entry only when the mutated id is the
    /// currently selected one.
    pub fn invalidate_after_mutation(&mut self, mutated_id: Option<&str>, selected_id: Option<&str>) {
        debug!(?mutated_id, ?selected_id, "invalidating after mutation");
        self.list.invalidate();
        if let (Some(mutated), Some(selected)) = (mutated_id, selected_id) {
            if mutated == selected {
                if let Some(entry) = self.details.get_mut(mutated) {
                    entry.invalidate();
                }
            }
        }
    }

    /// Forget a detail entry entirely (the resource no longer exists).
    pub fn drop_detail(&mut self, id: &str) {
        self.details.remove(id);
    }

    pub fn settle_list(&mut self, result: ApiResult<UserList>) {
        self.list.settle(result);
    }

    pub fn settle_detail(&mut self, id: &str, result: ApiResult<User>) {
        // A settlement for an entry dropped in the meantime has no target.
        if let Some(entry) = self.details.get_mut(id) {
            entry.settle(result);
        }
    }
}
