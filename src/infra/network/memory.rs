//! Scriptable in-process network client.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::{NetworkClient, PollStatus, RequestHandle};

/// A request captured by [`MockNetworkClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Endpoint the request was sent to.
    pub url: String,
    /// Request body.
    pub body: Vec<u8>,
}

#[derive(Debug)]
struct Exchange {
    submission: Submission,
    status: PollStatus,
    cancelled: bool,
    disposed: bool,
}

#[derive(Debug, Default)]
struct MockState {
    exchanges: Vec<Exchange>,
    auto_response: Option<PollStatus>,
}

/// Network client that records submissions and answers with scripted responses.
///
/// Clones share state, so a test keeps one clone to script responses while the queue
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct MockNetworkClient {
    state: Arc<Mutex<MockState>>,
}

impl MockNetworkClient {
    /// Client that answers every new request with `status` immediately.
    #[must_use]
    pub fn responding(status: PollStatus) -> Self {
        let client = Self::default();
        client.state.lock().auto_response = Some(status);
        client
    }

    /// Script the response of the `n`th request (zero based). Ignored if it does not exist.
    pub fn respond(&self, n: usize, status: PollStatus) {
        if let Some(exchange) = self.state.lock().exchanges.get_mut(n) {
            exchange.status = status;
        }
    }

    /// Script the response of the most recent request.
    pub fn respond_last(&self, status: PollStatus) {
        if let Some(exchange) = self.state.lock().exchanges.last_mut() {
            exchange.status = status;
        }
    }

    /// Number of requests sent so far.
    #[must_use]
    pub fn submission_count(&self) -> usize {
        self.state.lock().exchanges.len()
    }

    /// Every request sent so far, oldest first.
    #[must_use]
    pub fn submissions(&self) -> Vec<Submission> {
        self.state
            .lock()
            .exchanges
            .iter()
            .map(|e| e.submission.clone())
            .collect()
    }

    /// Whether the `n`th request was explicitly cancelled.
    #[must_use]
    pub fn was_cancelled(&self, n: usize) -> bool {
        self.state.lock().exchanges.get(n).is_some_and(|e| e.cancelled)
    }

    /// Whether the `n`th request's handle was cancelled or dropped.
    #[must_use]
    pub fn is_disposed(&self, n: usize) -> bool {
        self.state.lock().exchanges.get(n).is_some_and(|e| e.disposed)
    }
}

impl NetworkClient for MockNetworkClient {
    type Handle = MockRequestHandle;

    fn submit(&mut self, url: &str, body: Vec<u8>) -> MockRequestHandle {
        let mut state = self.state.lock();
        let status = state.auto_response.clone().unwrap_or(PollStatus::Pending);
        state.exchanges.push(Exchange {
            submission: Submission {
                url: url.to_owned(),
                body,
            },
            status,
            cancelled: false,
            disposed: false,
        });
        MockRequestHandle {
            state: Arc::clone(&self.state),
            index: state.exchanges.len() - 1,
        }
    }
}

/// Handle for one [`MockNetworkClient`] request.
#[derive(Debug)]
pub struct MockRequestHandle {
    state: Arc<Mutex<MockState>>,
    index: usize,
}

impl RequestHandle for MockRequestHandle {
    fn poll(&mut self) -> PollStatus {
        let state = self.state.lock();
        match state.exchanges.get(self.index) {
            Some(e) if !e.disposed => e.status.clone(),
            _ => PollStatus::Pending,
        }
    }

    fn cancel(&mut self) {
        if let Some(e) = self.state.lock().exchanges.get_mut(self.index) {
            e.cancelled = true;
            e.disposed = true;
        }
    }
}

impl Drop for MockRequestHandle {
    fn drop(&mut self) {
        if let Some(e) = self.state.lock().exchanges.get_mut(self.index) {
            e.disposed = true;
        }
    }
}
