//! Single-flight access token renewal
//!
//! The first request that finds its access token expired becomes the leader
//! and performs the refresh call. Requests that hit the same condition while
//! the leader is in flight are queued as `PendingRequest`s and suspend on a
//! oneshot receiver until the leader settles. Settling drains the queue in
//! arrival order and resets the state in one critical section, so at most one
//! refresh call is ever outstanding and the queue is never left non-empty
//! while idle.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::oneshot;

use crate::error::{FeedError, Result};

/// A request suspended until the in-flight refresh settles
#[derive(Debug)]
pub struct PendingRequest {
    id: u64,
    completion: oneshot::Sender<Result<String>>,
}

#[derive(Debug, Default)]
struct RefreshState {
    refreshing: bool,
    queue: VecDeque<PendingRequest>,
}

/// Outcome of `RefreshCoordinator::begin`
#[derive(Debug)]
pub enum Ticket<'a> {
    /// Caller must perform the refresh and settle the lease
    Leader(RefreshLease<'a>),
    /// A refresh is already running; await its outcome
    Waiter(Waiter),
}

#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
    next_id: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter `Refreshing`, or join the queue if a refresh is already in flight
    pub fn begin(&self) -> Ticket<'_> {
        let mut state = self.state.lock();
        if state.refreshing {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let (completion, receiver) = oneshot::channel();
            state.queue.push_back(PendingRequest { id, completion });
            tracing::debug!("Refresh in flight; queued request #{} ({} waiting)", id, state.queue.len());
            Ticket::Waiter(Waiter { id, receiver })
        } else {
            debug_assert!(state.queue.is_empty());
            state.refreshing = true;
            tracing::debug!("Starting token refresh");
            Ticket::Leader(RefreshLease {
                coordinator: self,
                settled: false,
            })
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.state.lock().refreshing
    }

    pub fn queued(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Release every queued request with `outcome` and return to idle.
    /// Returns the ids released, in release order.
    fn settle(&self, outcome: &Result<String>) -> Vec<u64> {
        let mut state = self.state.lock();
        let mut released = Vec::with_capacity(state.queue.len());
        while let Some(pending) = state.queue.pop_front() {
            released.push(pending.id);
            // A waiter that went away has nothing left to resume
            let _ = pending.completion.send(outcome.clone());
        }
        state.refreshing = false;
        match outcome {
            Ok(_) => tracing::debug!("Token refresh succeeded; resumed {} request(s)", released.len()),
            Err(e) => tracing::debug!("Token refresh failed ({}); rejected {} request(s)", e, released.len()),
        }
        released
    }
}

/// Held by the leader for the duration of the refresh call
#[derive(Debug)]
pub struct RefreshLease<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl RefreshLease<'_> {
    pub fn settle(mut self, outcome: &Result<String>) -> Vec<u64> {
        self.settled = true;
        self.coordinator.settle(outcome)
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!("Token refresh abandoned before completion");
            self.coordinator
                .settle(&Err(FeedError::refresh_failed("Token refresh was abandoned", None)));
        }
    }
}

/// Completion side of a `PendingRequest`
#[derive(Debug)]
pub struct Waiter {
    id: u64,
    receiver: oneshot::Receiver<Result<String>>,
}

impl Waiter {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub async fn wait(self) -> Result<String> {
        self.receiver
            .await
            .map_err(|_| FeedError::internal("Token refresh ended without an outcome"))?
    }
}
