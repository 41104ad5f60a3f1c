// WebSocket feed transport
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use crate::application::feed::{FeedTransport, RawFrameStream, TransportError};

/// WebSocket client for the device feed. Display-only: it never sends
/// application messages, it only answers pings. Dropping the returned frame
/// stream closes the socket.
#[derive(Debug, Clone)]
pub struct WsFeedTransport {
    endpoint: String,
}

impl WsFeedTransport {
    pub fn new(endpoint: String) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl FeedTransport for WsFeedTransport {
    async fn open(&self) -> Result<RawFrameStream, TransportError> {
        let (socket, _response) = connect_async(self.endpoint.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.into()))?;
        debug!("websocket open: {}", self.endpoint);

        let frames = async_stream::stream! {
            let (mut write, mut read) = socket.split();
            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => yield Ok(text.to_string()),
                    Ok(Message::Ping(payload)) => {
                        if write.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        yield Err(TransportError::Stream(e.into()));
                        break;
                    }
                }
            }
        };
        Ok(Box::pin(frames))
    }
}
