use crate::domain::ports::{TransportConnector, TransportHandle, WebServiceTransport};
use crate::error::{RedsysError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, RwLock};
use url::Url;

/// A scripted web-service transport.
///
/// Answers petitions from a queue of canned responses and records every
/// request it receives. Ideal for testing without network access.
#[derive(Default, Clone)]
pub struct InMemoryTransport {
    responses: Arc<Mutex<VecDeque<Result<String>>>>,
    requests: Arc<RwLock<Vec<String>>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for the next petition.
    pub async fn push_response(&self, response: impl Into<String>) {
        self.responses.lock().await.push_back(Ok(response.into()));
    }

    /// Queues a transport failure for the next petition.
    pub async fn push_failure(&self, message: impl Into<String>) {
        let message: String = message.into();
        let err = RedsysError::Transport(message.into());
        self.responses.lock().await.push_back(Err(err));
    }

    /// Every request received so far, oldest first.
    pub async fn requests(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl WebServiceTransport for InMemoryTransport {
    async fn process_petition(&self, request: &str) -> Result<String> {
        self.requests.write().await.push(request.to_string());
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(RedsysError::Transport("no response queued".into())))
    }
}

/// Hands out a shared [`InMemoryTransport`] and counts connections.
#[derive(Default, Clone)]
pub struct InMemoryConnector {
    transport: InMemoryTransport,
    connects: Arc<AtomicUsize>,
}

impl InMemoryConnector {
    pub fn new(transport: InMemoryTransport) -> Self {
        Self {
            transport,
            connects: Arc::default(),
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransportConnector for InMemoryConnector {
    async fn connect(&self, url: &Url) -> Result<TransportHandle> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        // Lets concurrent first callers overlap.
        tokio::task::yield_now().await;
        tracing::debug!(%url, "connected in-memory transport");
        Ok(Arc::new(self.transport.clone()))
    }
}
