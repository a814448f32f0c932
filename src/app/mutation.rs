//! Mutation lifecycle tracking: one tracker per write kind, one in-flight
//! operation per tracker.

use tracing::{info, warn};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    pub fn verb(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Error text when the server gave none.
    pub fn fallback_error(self) -> &'static str {
        match self {
            Self::Create => "Failed to create user",
            Self::Update => "Failed to update user",
            Self::Delete => "Failed to delete user",
        }
    }

    pub fn success_notice(self) -> &'static str {
        match self {
            Self::Create => "User created successfully!",
            Self::Update => "User updated successfully!",
            Self::Delete => "User deleted successfully!",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

/// Lifecycle state for one mutation kind. Admission control: `begin` admits
/// at most one in-flight operation; settlements carry the sequence number
/// they were admitted under and are dropped when it no longer matches (the
/// tracker was reset, or the app was rebuilt).
#[derive(Debug)]
pub struct MutationTracker {
    kind: MutationKind,
    status: MutationStatus,
    error: Option<String>,
    seq: u64,
}

impl MutationTracker {
    pub fn new(kind: MutationKind) -> Self {
        Self {
            kind,
            status: MutationStatus::Idle,
            error: None,
            seq: 0,
        }
    }

    pub fn status(&self) -> MutationStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status == MutationStatus::Pending
    }

    /// Last settlement error, retained until the next admission.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Admit a new operation. Returns the sequence number to stamp on the
    /// request, or `None` while one is already in flight (re-invocation is
    /// rejected, not queued).
    pub fn begin(&mut self) -> Option<u64> {
        if self.is_pending() {
            warn!(kind = self.kind.verb(), "mutation already in flight, rejecting");
            return None;
        }
        self.seq += 1;
        self.status = MutationStatus::Pending;
        self.error = None;
        info!(kind = self.kind.verb(), seq = self.seq, "mutation dispatched");
        Some(self.seq)
    }

    /// Apply a success settlement. Returns false (no state change) when the
    /// sequence number is stale.
    pub fn settle_ok(&mut self, seq: u64) -> bool {
        if !self.accepts(seq) {
            return false;
        }
        self.status = MutationStatus::Success;
        self.error = None;
        info!(kind = self.kind.verb(), seq, "mutation succeeded");
        true
    }

    /// Apply an error settlement, falling back to the generic message when
    /// the error text is empty. Returns false when the sequence is stale.
    pub fn settle_err(&mut self, seq: u64, message: String) -> bool {
        if !self.accepts(seq) {
            return false;
        }
        self.status = MutationStatus::Error;
        let message = if message.is_empty() {
            self.kind.fallback_error().to_string()
        } else {
            message
        };
        warn!(kind = self.kind.verb(), seq, %message, "mutation failed");
        self.error = Some(message);
        true
    }

    /// Dismiss a surfaced error without admitting anything new.
    pub fn dismiss_error(&mut self) {
        if self.status == MutationStatus::Error {
            self.status = MutationStatus::Idle;
            self.error = None;
        }
    }

    /// Invalidate any in-flight settlement, e.g. when the owning view goes
    /// away. The next settlement for an old sequence becomes a no-op.
    pub fn reset(&mut self) {
        self.seq += 1;
        self.status = MutationStatus::Idle;
        self.error = None;
    }

    fn accepts(&self, seq: u64) -> bool {
        self.status == MutationStatus::Pending && seq == self.seq
    }
}
