//! Digital I/O board used for per-frame synchronization pulses

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{error, info, warn};

/// Port whose bits are bound to camera sessions.
pub const PULSE_PORT: u8 = 0;

/// Number of bits on one port.
pub const PORT_WIDTH: u8 = 8;

pub type DioResult<T> = std::result::Result<T, DioError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DioError {
    #[error("Failed to open digital I/O device {minor}: {reason}")]
    Open { minor: u32, reason: String },

    #[error("Digital I/O write to port {port} failed: {reason}")]
    Write { port: u8, reason: String },

    #[error("Bit {bit} is outside the {PORT_WIDTH}-bit port")]
    BitOutOfRange { bit: u8 },
}

/// Driver for a byte-wide digital I/O board.
pub trait DigitalIo: Send {
    /// Configure bit directions of `port`; a set bit in `outputs` makes that line an output.
    fn load_port_direction(&mut self, port: u8, outputs: u8) -> DioResult<()>;

    fn write_bit(&mut self, port: u8, bit: u8, high: bool) -> DioResult<()>;

    fn write_port(&mut self, port: u8, value: u8) -> DioResult<()>;
}

/// Shared handle to the digital I/O board.
///
/// Every session with an assigned bit holds a clone. Writes from all of them
/// go through one lock, so frame callbacks on different SDK threads never
/// interleave on the device.
#[derive(Clone)]
pub struct DigitalPort {
    device: Arc<Mutex<Box<dyn DigitalIo>>>,
}

impl DigitalPort {
    pub fn new(device: Box<dyn DigitalIo>) -> Self {
        Self { device: Arc::new(Mutex::new(device)) }
    }

    /// Wrap an opened device and drive the pulse port as all-outputs, all-low.
    ///
    /// Configuration errors are logged; the port is returned regardless.
    pub fn initialize(device: Box<dyn DigitalIo>) -> Self {
        let port = Self::new(device);
        match port.configure_outputs() {
            Ok(()) => {
                info!(port = PULSE_PORT, "Digital I/O port configured as output, all bits low")
            }
            Err(e) => error!("Could not configure digital I/O port {}: {}", PULSE_PORT, e),
        }
        port
    }

    /// Turn the outcome of opening a device into an optional port.
    ///
    /// A device that fails to open disables synchronization pulses but is
    /// not fatal.
    pub fn open_optional(opened: DioResult<Box<dyn DigitalIo>>) -> Option<Self> {
        match opened {
            Ok(device) => Some(Self::initialize(device)),
            Err(e) => {
                warn!("{}; digital I/O features will be disabled", e);
                None
            }
        }
    }

    fn configure_outputs(&self) -> DioResult<()> {
        let mut device = self.lock();
        device.load_port_direction(PULSE_PORT, 0xFF)?;
        device.write_port(PULSE_PORT, 0)
    }

    pub fn write_bit(&self, bit: u8, high: bool) -> DioResult<()> {
        if bit >= PORT_WIDTH {
            return Err(DioError::BitOutOfRange { bit });
        }
        self.lock().write_bit(PULSE_PORT, bit, high)
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn DigitalIo>> {
        self.device.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for DigitalPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigitalPort").finish_non_exhaustive()
    }
}
