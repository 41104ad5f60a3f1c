// Transport port and events for the sensor feed
use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::domain::dashboard::ConnectionStatus;
use crate::domain::reading::Reading;

/// Raw inbound frames from one open feed connection. The stream ends when
/// the peer closes; item-level errors are reported but non-terminal.
pub type RawFrameStream = BoxStream<'static, Result<String, TransportError>>;

#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection attempt itself failed.
    #[error("feed connect failed")]
    Connect(#[source] anyhow::Error),
    /// An error on an open connection.
    #[error("feed stream error")]
    Stream(#[source] anyhow::Error),
}

/// Transport port for the measurement feed. Implementations own the
/// underlying handle; it is never exposed to other components.
#[async_trait]
pub trait FeedTransport: Send + Sync {
    async fn open(&self) -> Result<RawFrameStream, TransportError>;
}

/// Lifecycle and data events emitted by the connection manager, consumed by
/// the dashboard state drive loop in arrival order.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    Status(ConnectionStatus),
    Reading(Reading),
}
