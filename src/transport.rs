//! Request/reply transport
//!
//! A [`Transport`] hands the server loop one request at a time, or reports
//! that its wait timed out. Every request carries a one-shot reply slot; the
//! sender waits on it before submitting anything else, which gives the
//! protocol strict request/reply pairing.
//!
//! [`TcpTransport`] speaks newline-delimited JSON. Each connection gets its
//! own task, and all of them feed the same bounded queue, so the dispatcher
//! still sees requests strictly one after another.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::{Framed, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Result, ServerError};

/// Longest request line accepted before the connection is dropped.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

const QUEUE_DEPTH: usize = 32;

/// One request waiting for its reply.
#[derive(Debug)]
pub struct Envelope {
    payload: String,
    reply: oneshot::Sender<String>,
}

impl Envelope {
    pub fn new(payload: impl Into<String>) -> (Self, oneshot::Receiver<String>) {
        let (reply, rx) = oneshot::channel();
        (Self { payload: payload.into(), reply }, rx)
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Send the reply. Returns `false` if the requester has gone away.
    pub fn respond(self, reply: String) -> bool {
        self.reply.send(reply).is_ok()
    }
}

/// Why the server loop woke up.
#[derive(Debug)]
pub enum Wake {
    /// The wait elapsed without a request
    Timeout,
    Request(Envelope),
    /// No request can ever arrive again
    Closed,
}

/// Source of requests for the server loop.
#[async_trait::async_trait]
pub trait Transport: Send + 'static {
    /// Wait up to `wait` for the next request.
    ///
    /// Must be cancel safe: dropping the future loses no request.
    async fn next_request(&mut self, wait: Duration) -> Wake;
}

/// Receiving end of an in-process request queue.
#[derive(Debug)]
pub struct RequestQueue {
    rx: mpsc::Receiver<Envelope>,
}

/// Submitting end of a [`RequestQueue`].
#[derive(Debug, Clone)]
pub struct RequestSender {
    tx: mpsc::Sender<Envelope>,
}

/// Create a bounded request queue.
pub fn channel(capacity: usize) -> (RequestSender, RequestQueue) {
    let (tx, rx) = mpsc::channel(capacity);
    (RequestSender { tx }, RequestQueue { rx })
}

impl RequestSender {
    /// Submit a request and wait for its reply.
    pub async fn request(&self, payload: impl Into<String>) -> Result<String> {
        let (envelope, reply) = Envelope::new(payload);
        self.tx
            .send(envelope)
            .await
            .map_err(|_| ServerError::transport("server loop has stopped"))?;
        reply.await.map_err(|_| ServerError::transport("request dropped without a reply"))
    }
}

#[async_trait::async_trait]
impl Transport for RequestQueue {
    async fn next_request(&mut self, wait: Duration) -> Wake {
        match tokio::time::timeout(wait, self.rx.recv()).await {
            Err(_) => Wake::Timeout,
            Ok(Some(envelope)) => Wake::Request(envelope),
            Ok(None) => Wake::Closed,
        }
    }
}

/// Newline-delimited JSON over TCP.
#[derive(Debug)]
pub struct TcpTransport {
    queue: RequestQueue,
    local_addr: SocketAddr,
    cancel: CancellationToken,
}

impl TcpTransport {
    /// Bind the listener and start accepting connections.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener =
            TcpListener::bind(addr).await.map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr =
            listener.local_addr().map_err(|source| ServerError::Bind { addr, source })?;
        let (sender, queue) = channel(QUEUE_DEPTH);
        let cancel = CancellationToken::new();

        tokio::spawn(accept_loop(listener, sender, cancel.clone()));
        info!(%local_addr, "Listening for clients");
        Ok(Self { queue, local_addr, cancel })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn next_request(&mut self, wait: Duration) -> Wake {
        self.queue.next_request(wait).await
    }
}

async fn accept_loop(listener: TcpListener, sender: RequestSender, cancel: CancellationToken) {
    loop {
        let accepted = tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => accepted,
        };
        match accepted {
            Ok((stream, peer)) => {
                info!(%peer, "Client connected");
                tokio::spawn(serve_connection(stream, peer, sender.clone(), cancel.child_token()));
            }
            Err(e) => warn!("Failed to accept connection: {}", e),
        }
    }
    debug!("Accept loop stopped");
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    sender: RequestSender,
    cancel: CancellationToken,
) {
    let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = framed.next() => line,
        };
        let line = match line {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                warn!(%peer, "Dropping connection: {}", e);
                break;
            }
            None => break,
        };
        if line.trim().is_empty() {
            continue;
        }
        let reply = match sender.request(line).await {
            Ok(reply) => reply,
            Err(e) => {
                debug!(%peer, "{}", e);
                break;
            }
        };
        if let Err(e) = framed.send(reply).await {
            warn!(%peer, "Failed to send reply: {}", e);
            break;
        }
    }
    info!(%peer, "Client disconnected");
}
