//! Frame-completion events raised by the hardware layer

/// Notification that the SDK finished delivering one frame.
///
/// Only the metadata crosses into the server; pixel data stays with the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameEvent {
    /// SDK-assigned frame id, monotonic within one capture
    pub frame_id: u64,

    /// Size of the delivered buffer in bytes
    pub payload_len: usize,
}

impl FrameEvent {
    pub fn new(frame_id: u64, payload_len: usize) -> Self {
        Self { frame_id, payload_len }
    }
}
