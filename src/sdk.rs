//! Camera SDK abstraction
//!
//! The server never talks to vendor code directly; everything goes through
//! [`CameraSdk`]. A vendor binding implements it over FFI, and
//! [`SimulatedSdk`](crate::simulated::SimulatedSdk) implements it in memory.

use std::path::Path;
use std::sync::Arc;

use crate::types::{CameraIdentity, FeatureValue, FrameEvent, ReturnCode, ValueKind};

/// Result of a vendor call. Errors are the vendor's own status codes.
pub type SdkResult<T> = std::result::Result<T, ReturnCode>;

/// Opaque handle to an opened camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraHandle(pub u64);

/// GenICam feature names used by the server.
pub mod feature {
    pub const PIXEL_FORMAT: &str = "PixelFormat";
    pub const SENSOR_BIT_DEPTH: &str = "SensorBitDepth";
    pub const LINE_SELECTOR: &str = "LineSelector";
    pub const LINE_MODE: &str = "LineMode";
    pub const LINE_SOURCE: &str = "LineSource";
    pub const EXPOSURE_TIME: &str = "ExposureTime";
    pub const FRAME_RATE: &str = "AcquisitionFrameRate";
    pub const FRAME_RATE_ENABLE: &str = "AcquisitionFrameRateEnable";
    pub const PAYLOAD_SIZE: &str = "PayloadSize";
    pub const WIDTH: &str = "Width";
    pub const HEIGHT: &str = "Height";
    pub const OFFSET_X: &str = "OffsetX";
    pub const OFFSET_Y: &str = "OffsetY";
    pub const SENSOR_WIDTH: &str = "SensorWidth";
    pub const SENSOR_HEIGHT: &str = "SensorHeight";
    pub const THROUGHPUT_LIMIT: &str = "DeviceLinkThroughputLimit";
    pub const TEMPERATURE: &str = "DeviceTemperature";
    pub const TEMPERATURE_SOURCE: &str = "DeviceTemperatureSelector";

    /// `LineMode` value that drives a trigger line as an output.
    pub const LINE_MODE_OUTPUT: &str = "Output";
}

/// Receiver for frame-completion events.
///
/// Called by the SDK from its own thread, once per completed frame, for as
/// long as the capture runs. Implementations must not block.
pub trait FrameSink: Send + Sync {
    fn on_frame(&self, event: FrameEvent);
}

/// Vendor camera API.
///
/// All methods take `&self`; implementations use interior mutability so the
/// SDK can be shared as `Arc<dyn CameraSdk>` between sessions.
pub trait CameraSdk: Send + Sync {
    /// Start the API, loading transport layers from `search_path` if given.
    fn init(&self, search_path: Option<&Path>) -> SdkResult<()>;

    /// Release the API. Called once after every camera is closed.
    fn shutdown(&self);

    /// Enumerate reachable cameras in discovery order.
    fn list_cameras(&self) -> SdkResult<Vec<CameraIdentity>>;

    fn open(&self, id_string: &str) -> SdkResult<CameraHandle>;

    fn close(&self, handle: CameraHandle) -> SdkResult<()>;

    /// Begin streaming; `sink` receives one event per completed frame.
    fn start_capture(&self, handle: CameraHandle, sink: Arc<dyn FrameSink>) -> SdkResult<()>;

    /// Stop streaming. No frame events are delivered after this returns.
    fn stop_capture(&self, handle: CameraHandle) -> SdkResult<()>;

    fn get_feature(
        &self,
        handle: CameraHandle,
        name: &str,
        kind: ValueKind,
    ) -> SdkResult<FeatureValue>;

    fn set_feature(&self, handle: CameraHandle, name: &str, value: &FeatureValue) -> SdkResult<()>;

    /// Values an enumeration feature accepts.
    fn feature_options(&self, handle: CameraHandle, name: &str) -> SdkResult<Vec<String>>;

    /// Inclusive range of an integer feature.
    fn int_range(&self, handle: CameraHandle, name: &str) -> SdkResult<(i64, i64)>;
}
