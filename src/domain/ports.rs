use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

/// The gateway's web-service operation (`trataPeticion`): one XML string in,
/// one XML string out.
///
/// Implementations own timeouts and cancellation. Failures should be
/// returned as `RedsysError::Transport` and are propagated unchanged.
#[async_trait]
pub trait WebServiceTransport: Send + Sync {
    async fn process_petition(&self, request: &str) -> Result<String>;
}

/// Creates a transport for a web-service URL. Called at most once per client.
#[async_trait]
pub trait TransportConnector: Send + Sync {
    async fn connect(&self, url: &Url) -> Result<TransportHandle>;
}

pub type TransportHandle = Arc<dyn WebServiceTransport>;
pub type TransportConnectorBox = Box<dyn TransportConnector>;
