//! Async client for the control protocol

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::{Framed, LinesCodec};
use tracing::debug;

use crate::error::{Result, ServerError};
use crate::transport::MAX_LINE_LENGTH;
use crate::types::{CommandCode, CommandType, Fingerprint, NetPacket, ReturnCode};

/// One connection to a camera server.
///
/// Requests are strictly sequential: each call waits for its reply.
#[derive(Debug)]
pub struct CameraClient {
    framed: Framed<TcpStream, LinesCodec>,
    timeout: Option<Duration>,
}

impl CameraClient {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
        Ok(Self { framed, timeout: None })
    }

    /// Fail requests whose reply takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Send a request and wait for the reply.
    pub async fn request(&mut self, packet: &NetPacket) -> Result<NetPacket> {
        let text = packet
            .encode()
            .map_err(|e| ServerError::transport_with_source("encode request", e))?;
        debug!(request = %text, "Sending request");
        self.framed
            .send(text)
            .await
            .map_err(|e| ServerError::transport_with_source("send request", e))?;

        let next = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.framed.next())
                .await
                .map_err(|_| ServerError::transport(format!("no reply within {limit:?}")))?,
            None => self.framed.next().await,
        };
        let line = match next {
            Some(Ok(line)) => line,
            Some(Err(e)) => return Err(ServerError::transport_with_source("read reply", e)),
            None => return Err(ServerError::transport("server closed the connection")),
        };
        NetPacket::decode(&line).map_err(|e| ServerError::transport_with_source("decode reply", e))
    }

    /// Fingerprints of every registered camera, in discovery order.
    pub async fn list(&mut self) -> Result<Vec<Fingerprint>> {
        let reply = self.request(&NetPacket::new(CommandType::List)).await?;
        reply
            .retargs
            .iter()
            .map(|s| {
                s.parse()
                    .map_err(|e| ServerError::transport_with_source("malformed fingerprint", e))
            })
            .collect()
    }

    /// Status of one camera, or of all cameras when `camera` is `None`.
    pub async fn status(&mut self, camera: Option<Fingerprint>) -> Result<NetPacket> {
        self.request(&addressed(CommandType::Status, camera)).await
    }

    /// Start capture on one camera, or on all cameras when `camera` is `None`.
    pub async fn start_capture(&mut self, camera: Option<Fingerprint>) -> Result<ReturnCode> {
        let cmd = match camera {
            Some(_) => CommandType::StartCapture,
            None => CommandType::StartCaptureAll,
        };
        Ok(self.request(&addressed(cmd, camera)).await?.return_code())
    }

    /// Stop capture on one camera, or on all cameras when `camera` is `None`.
    pub async fn stop_capture(&mut self, camera: Option<Fingerprint>) -> Result<ReturnCode> {
        let cmd = match camera {
            Some(_) => CommandType::StopCapture,
            None => CommandType::StopCaptureAll,
        };
        Ok(self.request(&addressed(cmd, camera)).await?.return_code())
    }

    pub async fn get(&mut self, camera: Fingerprint, code: CommandCode) -> Result<NetPacket> {
        self.request(&NetPacket::new(CommandType::Get).with_camera(camera).with_command(code)).await
    }

    pub async fn set<I, S>(
        &mut self,
        camera: Fingerprint,
        code: CommandCode,
        arguments: I,
    ) -> Result<NetPacket>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let packet = NetPacket::new(CommandType::Set)
            .with_camera(camera)
            .with_command(code)
            .with_arguments(arguments);
        self.request(&packet).await
    }

    /// Ask the server to shut down.
    pub async fn quit(&mut self) -> Result<ReturnCode> {
        Ok(self.request(&NetPacket::new(CommandType::Quit)).await?.return_code())
    }
}

fn addressed(cmd: CommandType, camera: Option<Fingerprint>) -> NetPacket {
    let packet = NetPacket::new(cmd);
    match camera {
        Some(fingerprint) => packet.with_camera(fingerprint),
        None => packet,
    }
}
