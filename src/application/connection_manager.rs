// Feed connection state machine with fixed-delay reconnect
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::application::feed::{FeedEvent, FeedTransport};
use crate::domain::dashboard::ConnectionStatus;
use crate::infrastructure::decoder::decode_frame;

/// Owns the feed transport and drives the connect / reconnect lifecycle,
/// emitting lifecycle and reading events in arrival order.
///
/// The retry loop is sequential: one connection epoch at a time, one awaited
/// reconnect sleep between epochs. A second pending reconnect timer is
/// therefore unrepresentable, whatever close/error signals the transport
/// produces. Retries continue forever with a fixed, non-exponential delay.
pub struct ConnectionManager {
    transport: Arc<dyn FeedTransport>,
    events: mpsc::Sender<FeedEvent>,
    reconnect_delay: Duration,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    pub fn new(
        transport: Arc<dyn FeedTransport>,
        events: mpsc::Sender<FeedEvent>,
        reconnect_delay: Duration,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            transport,
            events,
            reconnect_delay,
            shutdown,
            task: None,
        }
    }

    /// Starts the connection loop. A no-op while a previous loop is alive.
    pub fn start(&mut self) {
        if self.task.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }
        let transport = self.transport.clone();
        let events = self.events.clone();
        let delay = self.reconnect_delay;
        let shutdown = self.shutdown.subscribe();
        self.task = Some(tokio::spawn(run(transport, events, delay, shutdown)));
    }

    /// Stops the loop. Cancels a pending reconnect sleep or an in-flight
    /// connect attempt; dropping the frame stream closes the socket.
    pub async fn stop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

async fn run(
    transport: Arc<dyn FeedTransport>,
    events: mpsc::Sender<FeedEvent>,
    delay: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if emit(&events, FeedEvent::Status(ConnectionStatus::Connecting))
            .await
            .is_err()
        {
            return;
        }
        let opened = tokio::select! {
            _ = shutdown.changed() => return,
            opened = transport.open() => opened,
        };
        match opened {
            Ok(mut frames) => {
                info!("feed connected");
                if emit(&events, FeedEvent::Status(ConnectionStatus::Connected))
                    .await
                    .is_err()
                {
                    return;
                }
                loop {
                    let frame = tokio::select! {
                        _ = shutdown.changed() => return,
                        frame = frames.next() => frame,
                    };
                    match frame {
                        Some(Ok(raw)) => match decode_frame(&raw) {
                            Ok(reading) => {
                                if emit(&events, FeedEvent::Reading(reading)).await.is_err() {
                                    return;
                                }
                            }
                            // A malformed frame is dropped; the feed stays up
                            // and the next frame is processed normally.
                            Err(e) => warn!("dropping malformed frame: {e}"),
                        },
                        // Errors on an open connection do not change state;
                        // only the stream ending does.
                        Some(Err(e)) => warn!("feed error: {e}"),
                        None => break,
                    }
                }
                info!("feed closed");
            }
            Err(e) => warn!("feed connect failed: {e}"),
        }
        if emit(&events, FeedEvent::Status(ConnectionStatus::Disconnected))
            .await
            .is_err()
        {
            return;
        }
        tokio::select! {
            _ = shutdown.changed() => return,
            _ = tokio::time::sleep(delay) => {}
        }
        if emit(&events, FeedEvent::Status(ConnectionStatus::Reconnecting))
            .await
            .is_err()
        {
            return;
        }
    }
}

async fn emit(events: &mpsc::Sender<FeedEvent>, event: FeedEvent) -> Result<(), ()> {
    events.send(event).await.map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::feed::{RawFrameStream, TransportError};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Attempt {
        /// Frames delivered on an accepted connection before the peer closes.
        Frames(Vec<Result<String, TransportError>>),
        /// A connect attempt that never resolves.
        Hangs,
    }

    /// Replays a scripted sequence of connection attempts; once the script
    /// is exhausted every further attempt is refused.
    struct ScriptedTransport {
        attempts: Mutex<VecDeque<Attempt>>,
        opens: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(attempts: Vec<Attempt>) -> Self {
            Self {
                attempts: Mutex::new(attempts.into()),
                opens: AtomicUsize::new(0),
            }
        }

        fn refusing() -> Self {
            Self::new(Vec::new())
        }

        fn opens(&self) -> usize {
            self.opens.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FeedTransport for ScriptedTransport {
        async fn open(&self) -> Result<RawFrameStream, TransportError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            let attempt = self.attempts.lock().unwrap().pop_front();
            match attempt {
                Some(Attempt::Frames(frames)) => Ok(futures::stream::iter(frames).boxed()),
                Some(Attempt::Hangs) => futures::future::pending().await,
                None => Err(TransportError::Connect(anyhow::anyhow!(
                    "connection refused"
                ))),
            }
        }
    }

    async fn next_status(rx: &mut mpsc::Receiver<FeedEvent>) -> ConnectionStatus {
        match rx.recv().await {
            Some(FeedEvent::Status(status)) => status,
            other => panic!("expected status event, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_endpoint_cycles_through_retry_states() {
        let transport = Arc::new(ScriptedTransport::refusing());
        let (tx, mut rx) = mpsc::channel(16);
        let mut manager =
            ConnectionManager::new(transport.clone(), tx, Duration::from_millis(1200));
        manager.start();

        let mut statuses = Vec::new();
        for _ in 0..7 {
            statuses.push(next_status(&mut rx).await);
        }
        assert_eq!(
            statuses,
            vec![
                ConnectionStatus::Connecting,
                ConnectionStatus::Disconnected,
                ConnectionStatus::Reconnecting,
                ConnectionStatus::Connecting,
                ConnectionStatus::Disconnected,
                ConnectionStatus::Reconnecting,
                ConnectionStatus::Connecting,
            ]
        );
        assert_eq!(transport.opens(), 3);
        manager.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_frame_does_not_block_the_next_one() {
        let transport = Arc::new(ScriptedTransport::new(vec![Attempt::Frames(vec![
            Ok(r#"{"temp": 21.5, "humidity": 40, "rpm": 60}"#.to_string()),
            Ok("not json at all".to_string()),
            Ok(r#"{"temp": 22.0, "humidity": 41, "rpm": 90}"#.to_string()),
        ])]));
        let (tx, mut rx) = mpsc::channel(16);
        let mut manager = ConnectionManager::new(transport, tx, Duration::from_millis(1200));
        manager.start();

        assert_eq!(next_status(&mut rx).await, ConnectionStatus::Connecting);
        assert_eq!(next_status(&mut rx).await, ConnectionStatus::Connected);
        let first = match rx.recv().await {
            Some(FeedEvent::Reading(reading)) => reading,
            other => panic!("expected reading, got {other:?}"),
        };
        assert_eq!(first.fan_rpm, 60.0);
        // The malformed frame was dropped, not forwarded.
        let second = match rx.recv().await {
            Some(FeedEvent::Reading(reading)) => reading,
            other => panic!("expected reading, got {other:?}"),
        };
        assert_eq!(second.fan_rpm, 90.0);
        assert_eq!(next_status(&mut rx).await, ConnectionStatus::Disconnected);
        manager.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_error_is_logged_without_a_state_change() {
        let transport = Arc::new(ScriptedTransport::new(vec![Attempt::Frames(vec![
            Ok(r#"{"temp": 21.5}"#.to_string()),
            Err(TransportError::Stream(anyhow::anyhow!("hiccup"))),
            Ok(r#"{"temp": 22.5}"#.to_string()),
        ])]));
        let (tx, mut rx) = mpsc::channel(16);
        let mut manager = ConnectionManager::new(transport, tx, Duration::from_millis(1200));
        manager.start();

        assert_eq!(next_status(&mut rx).await, ConnectionStatus::Connecting);
        assert_eq!(next_status(&mut rx).await, ConnectionStatus::Connected);
        assert!(matches!(rx.recv().await, Some(FeedEvent::Reading(_))));
        // The error between the two frames produced no status event.
        assert!(matches!(rx.recv().await, Some(FeedEvent::Reading(_))));
        assert_eq!(next_status(&mut rx).await, ConnectionStatus::Disconnected);
        manager.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent_while_running() {
        let transport = Arc::new(ScriptedTransport::new(vec![Attempt::Hangs]));
        let (tx, mut rx) = mpsc::channel(16);
        let mut manager =
            ConnectionManager::new(transport.clone(), tx, Duration::from_millis(1200));
        manager.start();
        manager.start();

        assert_eq!(next_status(&mut rx).await, ConnectionStatus::Connecting);
        let extra = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(extra.is_err(), "second start opened a second connection");
        assert_eq!(transport.opens(), 1);
        manager.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_a_pending_reconnect() {
        let transport = Arc::new(ScriptedTransport::refusing());
        let (tx, mut rx) = mpsc::channel(16);
        let mut manager = ConnectionManager::new(transport, tx, Duration::from_secs(3600));
        manager.start();

        assert_eq!(next_status(&mut rx).await, ConnectionStatus::Connecting);
        assert_eq!(next_status(&mut rx).await, ConnectionStatus::Disconnected);
        // The loop is now parked on the reconnect sleep.
        manager.stop().await;
        assert!(rx.try_recv().is_err(), "reconnect fired after stop");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_an_inflight_connect_attempt() {
        let transport = Arc::new(ScriptedTransport::new(vec![Attempt::Hangs]));
        let (tx, mut rx) = mpsc::channel(16);
        let mut manager = ConnectionManager::new(transport, tx, Duration::from_millis(1200));
        manager.start();

        assert_eq!(next_status(&mut rx).await, ConnectionStatus::Connecting);
        manager.stop().await;
        assert!(rx.try_recv().is_err());
    }
}
