//! Query tokens.
//!
//! A new query may be issued while an older one is still fetching. Results
//! carry the ticket they were issued under and are accepted only if no newer
//! ticket exists, so stale fetches never overwrite the current display state.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::QueryRequest;

/// Handle for one issued query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryTicket {
    pub token: u64,
    pub request: QueryRequest,
}

#[derive(Debug, Default)]
pub struct QuerySession {
    latest: AtomicU64,
}

impl QuerySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket that supersedes every earlier one.
    pub fn issue(&self, request: QueryRequest) -> QueryTicket {
        let token = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(token, "query issued");
        QueryTicket { token, request }
    }

    pub fn is_current(&self, ticket: &QueryTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.token
    }

    /// `Some(result)` only for the most recently issued ticket.
    pub fn accept<T>(&self, ticket: &QueryTicket, result: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(result)
        } else {
            tracing::info!(token = ticket.token, "discarding stale query result");
            None
        }
    }
}
