//! Simulated hardware backends
//!
//! Stand-ins for the vendor camera SDK and the digital I/O board. The server
//! binary runs against them when no vendor binding is linked, and every test
//! in the crate uses them as the hardware layer.

mod camera;
mod dio;

pub use camera::{
    EXPOSURE_MAX_US, EXPOSURE_MIN_US, FRAME_RATE_MAX, FRAME_RATE_MIN, SIZE_INCREMENT, SimConfig,
    SimulatedSdk, THROUGHPUT_MAX, THROUGHPUT_MIN,
};
pub use dio::SimulatedDigitalIo;
