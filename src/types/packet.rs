//! The request/reply record exchanged with clients

use serde::{Deserialize, Serialize};

use super::{CommandCode, CommandType, Fingerprint, ReturnCode};

/// One request or reply.
///
/// Requests fill `cmd_type`, `cam_id`, `command` and `arguments`; the server
/// echoes the record back with `retcode` and `retargs` populated. Every field
/// is optional when decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetPacket {
    pub cmd_type: String,
    /// Decimal fingerprint, or empty to address every camera
    pub cam_id: String,
    pub command: i32,
    pub arguments: Vec<String>,
    pub retcode: i32,
    pub retargs: Vec<String>,
}

impl NetPacket {
    pub fn new(cmd_type: CommandType) -> Self {
        Self { cmd_type: cmd_type.as_str().to_string(), ..Self::default() }
    }

    pub fn with_camera(mut self, fingerprint: Fingerprint) -> Self {
        self.cam_id = fingerprint.to_string();
        self
    }

    pub fn with_command(mut self, code: CommandCode) -> Self {
        self.command = code.code();
        self
    }

    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn return_code(&self) -> ReturnCode {
        ReturnCode(self.retcode)
    }

    /// Whether the request addresses every camera rather than one.
    pub fn is_broadcast(&self) -> bool {
        self.cam_id.is_empty()
    }

    /// Turn a request into its reply, keeping the echoed fields.
    pub fn into_reply(mut self, code: ReturnCode, retargs: Vec<String>) -> Self {
        self.retcode = code.code();
        self.retargs = retargs;
        self
    }
}
