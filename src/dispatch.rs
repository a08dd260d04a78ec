//! Request routing
//!
//! The [`Dispatcher`] owns the registry and the watchdog and turns one
//! decoded request into one reply. Request-level failures never escape as
//! errors: they are folded into the reply's `retcode`.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::dio::PORT_WIDTH;
use crate::property::{CompositeProperty, Property, read_pair, read_range, write_pair};
use crate::registry::SessionRegistry;
use crate::sdk::{SdkResult, feature};
use crate::session::CameraSession;
use crate::types::{
    CommandType, Fingerprint, NetPacket, ReturnCode, format_bool, format_float, parse_int,
};
use crate::watchdog::CaptureWatchdog;

/// What the server loop should do after a reply is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Shutdown,
}

pub struct Dispatcher {
    registry: SessionRegistry,
    watchdog: CaptureWatchdog,
}

impl Dispatcher {
    pub fn new(registry: SessionRegistry, watchdog: CaptureWatchdog) -> Self {
        Self { registry, watchdog }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SessionRegistry {
        &mut self.registry
    }

    pub fn watchdog(&self) -> &CaptureWatchdog {
        &self.watchdog
    }

    pub fn into_registry(self) -> SessionRegistry {
        self.registry
    }

    /// Run the capture watchdog over every session.
    pub fn sweep(&mut self, now: Instant) -> Vec<Fingerprint> {
        self.watchdog.sweep(&mut self.registry, now)
    }

    /// Decode a wire request, handle it and encode the reply.
    ///
    /// Text that does not decode gets a `BadParameter` reply.
    pub fn handle_text(&mut self, text: &str) -> (String, Outcome) {
        let (reply, outcome) = match NetPacket::decode(text) {
            Ok(request) => self.handle(request),
            Err(e) => {
                warn!("Malformed request: {}", e);
                let reply = NetPacket::default().into_reply(ReturnCode::BAD_PARAMETER, Vec::new());
                (reply, Outcome::Continue)
            }
        };
        (encode_reply(&reply), outcome)
    }

    pub fn handle(&mut self, mut request: NetPacket) -> (NetPacket, Outcome) {
        request.retargs.clear();
        let command = request.cmd_type.parse::<CommandType>();
        let outcome = match command {
            Ok(CommandType::Quit) => Outcome::Shutdown,
            _ => Outcome::Continue,
        };

        let result = match command {
            Ok(kind) => self.route(kind, &request),
            Err(e) => {
                warn!("{}", e);
                Err(ReturnCode::BAD_PARAMETER)
            }
        };

        let (code, retargs) = match result {
            Ok(retargs) => (ReturnCode::SUCCESS, retargs),
            Err(code) => (code, Vec::new()),
        };
        info!(
            cmd = %request.cmd_type,
            cam_id = %request.cam_id,
            command = request.command,
            "{} -> {}",
            request.cmd_type,
            code
        );
        (request.into_reply(code, retargs), outcome)
    }

    fn route(&mut self, kind: CommandType, request: &NetPacket) -> SdkResult<Vec<String>> {
        match kind {
            CommandType::Quit => {
                info!("Received quit command");
                Ok(Vec::new())
            }
            CommandType::List => {
                Ok(self.registry.fingerprints().iter().map(Fingerprint::to_string).collect())
            }
            CommandType::Status if request.is_broadcast() => self.status_all(),
            CommandType::Status => status(self.target(request)?).map(|(capturing, source, temp)| {
                vec![capturing, source, temp]
            }),
            CommandType::StartCapture => {
                self.target_mut(request)?.start_capture().map(|()| Vec::new())
            }
            CommandType::StopCapture => {
                self.target_mut(request)?.stop_capture().map(|()| Vec::new())
            }
            CommandType::StartCaptureAll => {
                for (fingerprint, session) in self.registry.iter_mut() {
                    session.start_capture().inspect_err(|code| {
                        warn!(fingerprint = %fingerprint, "start_capture_all stopped: {}", code);
                    })?;
                }
                Ok(Vec::new())
            }
            CommandType::StopCaptureAll => {
                for (fingerprint, session) in self.registry.iter_mut() {
                    session.stop_capture().inspect_err(|code| {
                        warn!(fingerprint = %fingerprint, "stop_capture_all stopped: {}", code);
                    })?;
                }
                Ok(Vec::new())
            }
            CommandType::Get => self.get(request),
            CommandType::Set => self.set(request),
        }
    }

    fn target(&self, request: &NetPacket) -> SdkResult<&CameraSession> {
        self.registry
            .resolve(&request.cam_id)
            .and_then(|fingerprint| self.registry.lookup(fingerprint))
            .ok_or(ReturnCode::NOT_FOUND)
    }

    fn target_mut(&mut self, request: &NetPacket) -> SdkResult<&mut CameraSession> {
        let fingerprint = self.registry.resolve(&request.cam_id).ok_or(ReturnCode::NOT_FOUND)?;
        self.registry.lookup_mut(fingerprint).ok_or(ReturnCode::NOT_FOUND)
    }

    fn status_all(&self) -> SdkResult<Vec<String>> {
        let mut retargs = Vec::with_capacity(self.registry.len() * 5);
        for (fingerprint, session) in self.registry.iter() {
            let (capturing, source, temp) = status(session)?;
            let id = session.identity().id_string.clone();
            retargs.extend([fingerprint.to_string(), id, capturing, source, temp]);
        }
        Ok(retargs)
    }

    fn get(&self, request: &NetPacket) -> SdkResult<Vec<String>> {
        let session = self.target(request)?;
        let property = Property::lookup(request.command).ok_or(ReturnCode::WRONG_TYPE)?;
        let composite = match property {
            Property::Simple(descriptor) => return descriptor.read(session),
            Property::Composite(composite) => composite,
        };
        match composite {
            CompositeProperty::ImageSize
            | CompositeProperty::ImageOffset
            | CompositeProperty::SensorSize => {
                let features = composite.feature_pair().ok_or(ReturnCode::WRONG_TYPE)?;
                read_pair(session, features)
            }
            CompositeProperty::ThroughputLimitRange => {
                read_range(session, feature::THROUGHPUT_LIMIT)
            }
            CompositeProperty::CameraInfo => Ok(vec![session.identity().to_string()]),
            CompositeProperty::DigitalBit => {
                let bit = session.digital_bit().map_or(-1, i64::from);
                Ok(vec![bit.to_string()])
            }
            CompositeProperty::CaptureTimeLimit => {
                Ok(vec![self.watchdog.limit().as_millis().to_string()])
            }
        }
    }

    fn set(&mut self, request: &NetPacket) -> SdkResult<Vec<String>> {
        let Some(argument) = request.arguments.first() else {
            warn!("No data to set");
            return Err(ReturnCode::NO_DATA);
        };
        let fingerprint = self.registry.resolve(&request.cam_id).ok_or(ReturnCode::NOT_FOUND)?;
        let property = Property::lookup(request.command).ok_or(ReturnCode::WRONG_TYPE)?;
        let composite = match property {
            Property::Simple(descriptor) => {
                let session = self.registry.lookup(fingerprint).ok_or(ReturnCode::NOT_FOUND)?;
                return descriptor.write(session, argument);
            }
            Property::Composite(composite) if composite.is_writable() => composite,
            Property::Composite(_) => return Err(ReturnCode::WRONG_TYPE),
        };
        match composite {
            CompositeProperty::ImageSize | CompositeProperty::ImageOffset => {
                let session = self.registry.lookup(fingerprint).ok_or(ReturnCode::NOT_FOUND)?;
                let features = composite.feature_pair().ok_or(ReturnCode::WRONG_TYPE)?;
                write_pair(session, features, &request.arguments)
            }
            CompositeProperty::DigitalBit => {
                let bit = digital_bit(parse_int(argument)?)?;
                let session = self.registry.lookup_mut(fingerprint).ok_or(ReturnCode::NOT_FOUND)?;
                session.set_digital_bit(bit);
                info!(camera = %session.identity().id_string, bit = ?bit, "Digital bit assigned");
                Ok(vec![bit.map_or(-1, i64::from).to_string()])
            }
            CompositeProperty::CaptureTimeLimit => {
                let millis = parse_int(argument)?.max(0) as u64;
                let limit = self.watchdog.set_limit(Duration::from_millis(millis));
                Ok(vec![limit.as_millis().to_string()])
            }
            _ => Err(ReturnCode::WRONG_TYPE),
        }
    }
}

/// Capturing flag, temperature source and temperature for one session.
fn status(session: &CameraSession) -> SdkResult<(String, String, String)> {
    let (source, temperature) = session.temperature()?;
    Ok((format_bool(session.is_capturing()).to_string(), source, format_float(temperature)))
}

/// Negative values unassign; anything past the port width is rejected.
fn digital_bit(value: i64) -> SdkResult<Option<u8>> {
    match value {
        v if v < 0 => Ok(None),
        v if v < i64::from(PORT_WIDTH) => Ok(Some(v as u8)),
        _ => Err(ReturnCode::INVALID_VALUE),
    }
}

fn encode_reply(reply: &NetPacket) -> String {
    reply.encode().unwrap_or_else(|e| {
        error!("Failed to encode reply: {}", e);
        format!(r#"{{"retcode":{}}}"#, ReturnCode::INTERNAL_FAULT.code())
    })
}
