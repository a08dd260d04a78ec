//! The server loop

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::dispatch::{Dispatcher, Outcome};
use crate::transport::{Transport, Wake};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerStats {
    pub requests: u64,
    pub wakeups: u64,
    pub watchdog_stops: u64,
}

/// Drives one [`Dispatcher`] from one [`Transport`].
///
/// Each iteration waits for a request for at most the poll interval, runs the
/// capture watchdog, then handles the request if one arrived. The poll
/// interval is therefore also the watchdog's resolution.
pub struct Server<T> {
    dispatcher: Dispatcher,
    transport: T,
    poll_interval: Duration,
}

impl<T> Server<T>
where
    T: Transport,
{
    pub fn new(dispatcher: Dispatcher, transport: T, poll_interval: Duration) -> Self {
        Self { dispatcher, transport, poll_interval }
    }

    /// Serve until `cancel` fires, a `quit` request arrives or the transport closes.
    ///
    /// Every camera is closed and the SDK released before this returns.
    pub async fn run(mut self, cancel: CancellationToken) -> ServerStats {
        info!(poll_interval_ms = self.poll_interval.as_millis() as u64, "Server loop started");
        let mut stats = ServerStats::default();

        loop {
            if cancel.is_cancelled() {
                info!("Shutdown requested");
                break;
            }

            let wake = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Server loop cancelled while waiting");
                    break;
                }
                wake = self.transport.next_request(self.poll_interval) => wake,
            };
            stats.wakeups += 1;

            let stopped = self.dispatcher.sweep(Instant::now());
            stats.watchdog_stops += stopped.len() as u64;

            match wake {
                Wake::Timeout => {}
                Wake::Closed => {
                    info!("Request source closed");
                    break;
                }
                Wake::Request(envelope) => {
                    stats.requests += 1;
                    let (reply, outcome) = self.dispatcher.handle_text(envelope.payload());
                    if !envelope.respond(reply) {
                        debug!("Client went away before the reply was sent");
                    }
                    if outcome == Outcome::Shutdown {
                        cancel.cancel();
                    }
                }
            }
        }

        info!("Server loop ended after {} requests", stats.requests);
        self.dispatcher.into_registry().shutdown();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{request, simulated_dispatcher};
    use crate::transport::channel;
    use crate::types::{CommandType, NetPacket, ReturnCode};

    #[tokio::test(start_paused = true)]
    async fn quit_stops_the_loop_and_releases_cameras() {
        let (sdk, dispatcher) = simulated_dispatcher(2);
        let (sender, queue) = channel(4);
        let cancel = CancellationToken::new();
        let server = Server::new(dispatcher, queue, DEFAULT_POLL_INTERVAL);
        let server = tokio::spawn(server.run(cancel.clone()));

        let start = request(CommandType::StartCaptureAll).encode().unwrap();
        let reply = NetPacket::decode(&sender.request(start).await.unwrap()).unwrap();
        assert_eq!(reply.return_code(), ReturnCode::SUCCESS);

        let quit = request(CommandType::Quit).encode().unwrap();
        let reply = NetPacket::decode(&sender.request(quit).await.unwrap()).unwrap();
        assert_eq!(reply.return_code(), ReturnCode::SUCCESS);

        let stats = server.await.unwrap();
        assert!(cancel.is_cancelled());
        assert_eq!(stats.requests, 2);
        for camera in &sdk.config().cameras {
            assert!(!sdk.is_open(&camera.id_string));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn idle_wakeups_enforce_the_capture_limit() {
        let (sdk, dispatcher) = simulated_dispatcher(1);
        let id = sdk.config().cameras[0].id_string.clone();
        let (sender, queue) = channel(4);
        let cancel = CancellationToken::new();
        let server = Server::new(dispatcher, queue, DEFAULT_POLL_INTERVAL);
        let server = tokio::spawn(server.run(cancel.clone()));

        sender.request(request(CommandType::StartCaptureAll).encode().unwrap()).await.unwrap();
        assert!(sdk.is_capturing(&id));

        // default limit is 5 s; the sweep after the sixth idle second stops it
        tokio::time::sleep(Duration::from_millis(4500)).await;
        assert!(sdk.is_capturing(&id));
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert!(!sdk.is_capturing(&id));

        cancel.cancel();
        let stats = server.await.unwrap();
        assert_eq!(stats.watchdog_stops, 1);
        assert!(stats.wakeups >= 6);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_transport_ends_the_loop() {
        let (_sdk, dispatcher) = simulated_dispatcher(1);
        let (sender, queue) = channel(1);
        drop(sender);
        let server = Server::new(dispatcher, queue, DEFAULT_POLL_INTERVAL);
        let stats = server.run(CancellationToken::new()).await;
        assert_eq!(stats.requests, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_requests_do_not_stop_the_loop() {
        let (_sdk, dispatcher) = simulated_dispatcher(1);
        let (sender, queue) = channel(1);
        let cancel = CancellationToken::new();
        let server = Server::new(dispatcher, queue, DEFAULT_POLL_INTERVAL);
        let server = tokio::spawn(server.run(cancel.clone()));

        let reply = NetPacket::decode(&sender.request("garbage").await.unwrap()).unwrap();
        assert_eq!(reply.return_code(), ReturnCode::BAD_PARAMETER);
        let list = request(CommandType::List).encode().unwrap();
        let reply = NetPacket::decode(&sender.request(list).await.unwrap()).unwrap();
        assert_eq!(reply.retargs.len(), 1);

        cancel.cancel();
        assert_eq!(server.await.unwrap().requests, 2);
    }
}
