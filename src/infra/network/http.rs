//! HTTP network client backed by `reqwest` on a tokio runtime.

use reqwest::header::CONTENT_TYPE;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::core::{NetworkClient, PollStatus, RequestHandle};

/// Posts request bodies as JSON and exposes completion through non-blocking handles.
#[derive(Debug, Clone)]
pub struct HttpNetworkClient {
    client: reqwest::Client,
    runtime: Handle,
}

impl HttpNetworkClient {
    /// Create a client that spawns requests on `runtime`.
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        Self::with_client(reqwest::Client::new(), runtime)
    }

    /// Use a preconfigured `reqwest` client (proxies, transport timeouts).
    #[must_use]
    pub const fn with_client(client: reqwest::Client, runtime: Handle) -> Self {
        Self { client, runtime }
    }
}

async fn post(client: reqwest::Client, url: String, body: Vec<u8>) -> Result<Vec<u8>, String> {
    let response = client
        .post(&url)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| e.to_string())?;
    let bytes = response.bytes().await.map_err(|e| e.to_string())?;
    Ok(bytes.to_vec())
}

impl NetworkClient for HttpNetworkClient {
    type Handle = HttpRequestHandle;

    fn submit(&mut self, url: &str, body: Vec<u8>) -> HttpRequestHandle {
        let (tx, rx) = oneshot::channel();
        let client = self.client.clone();
        let url = url.to_owned();
        let task = self.runtime.spawn(async move {
            let result = post(client, url, body).await;
            // Receiver gone means the handle was disposed.
            let _ = tx.send(result);
        });
        HttpRequestHandle { rx, task }
    }
}

/// Handle for one in-flight HTTP request. Dropping it aborts the request task.
#[derive(Debug)]
pub struct HttpRequestHandle {
    rx: oneshot::Receiver<Result<Vec<u8>, String>>,
    task: JoinHandle<()>,
}

impl RequestHandle for HttpRequestHandle {
    fn poll(&mut self) -> PollStatus {
        match self.rx.try_recv() {
            Ok(Ok(bytes)) => PollStatus::Done(bytes),
            Ok(Err(message)) => PollStatus::Failed(message),
            Err(TryRecvError::Empty) => PollStatus::Pending,
            Err(TryRecvError::Closed) => {
                PollStatus::Failed("request task ended without a response".to_owned())
            }
        }
    }

    fn cancel(&mut self) {
        debug!("aborting http request");
        self.task.abort();
        self.rx.close();
    }
}

impl Drop for HttpRequestHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
