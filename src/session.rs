//! Per-camera session state and capture lifecycle

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, trace, warn};

use crate::dio::DigitalPort;
use crate::sdk::{CameraHandle, CameraSdk, FrameSink, SdkResult, feature};
use crate::types::{CameraIdentity, FeatureValue, FrameEvent, ReturnCode, ValueKind};

/// An opened hardware camera.
///
/// Dropping it stops any running capture and closes the handle, so the
/// camera is released on every exit path.
struct OpenCamera {
    sdk: Arc<dyn CameraSdk>,
    handle: CameraHandle,
    streaming: bool,
}

impl Drop for OpenCamera {
    fn drop(&mut self) {
        if self.streaming {
            if let Err(code) = self.sdk.stop_capture(self.handle) {
                warn!("Stopping capture on release failed: {}", code);
            }
        }
        if let Err(code) = self.sdk.close(self.handle) {
            warn!("Closing camera handle failed: {}", code);
        }
    }
}

#[derive(Debug, Default)]
struct Pulse {
    bit: Option<u8>,
    level: bool,
}

/// Frame-event receiver shared between a session and the SDK.
///
/// Counts frames and, when a digital bit is assigned and the board is
/// present, toggles that bit once per frame.
#[derive(Debug)]
pub struct FrameEvents {
    frames: AtomicU64,
    pulse: Mutex<Pulse>,
    port: Option<DigitalPort>,
}

impl FrameEvents {
    fn new(port: Option<DigitalPort>) -> Self {
        Self { frames: AtomicU64::new(0), pulse: Mutex::new(Pulse::default()), port }
    }

    pub fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    fn reset(&self) {
        self.frames.store(0, Ordering::Release);
        self.pulse.lock().unwrap_or_else(PoisonError::into_inner).level = false;
    }

    fn bit(&self) -> Option<u8> {
        self.pulse.lock().unwrap_or_else(PoisonError::into_inner).bit
    }

    fn assign_bit(&self, bit: Option<u8>) {
        let mut pulse = self.pulse.lock().unwrap_or_else(PoisonError::into_inner);
        pulse.bit = bit;
        pulse.level = false;
    }

    /// Drive the assigned bit to its rest level.
    fn rest(&self) {
        let mut pulse = self.pulse.lock().unwrap_or_else(PoisonError::into_inner);
        pulse.level = false;
        if let (Some(port), Some(bit)) = (&self.port, pulse.bit) {
            if let Err(e) = port.write_bit(bit, false) {
                warn!("Failed to reset digital bit {}: {}", bit, e);
            }
        }
    }
}

impl FrameSink for FrameEvents {
    fn on_frame(&self, event: FrameEvent) {
        let count = self.frames.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(frame_id = event.frame_id, payload = event.payload_len, count, "Frame received");

        let Some(port) = &self.port else {
            return;
        };
        let mut pulse = self.pulse.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bit) = pulse.bit {
            pulse.level = !pulse.level;
            if let Err(e) = port.write_bit(bit, pulse.level) {
                warn!("Failed to pulse digital bit {}: {}", bit, e);
            }
        }
    }
}

/// State for one physical camera.
///
/// Moves through `Closed -> Open -> Capturing -> Open -> Closed`. The
/// capture start time is present exactly while capturing.
pub struct CameraSession {
    identity: CameraIdentity,
    sdk: Arc<dyn CameraSdk>,
    camera: Option<OpenCamera>,
    capture_start: Option<Instant>,
    events: Arc<FrameEvents>,
}

impl CameraSession {
    /// A closed session for `identity`.
    pub fn new(
        identity: CameraIdentity,
        sdk: Arc<dyn CameraSdk>,
        port: Option<DigitalPort>,
    ) -> Self {
        Self {
            identity,
            sdk,
            camera: None,
            capture_start: None,
            events: Arc::new(FrameEvents::new(port)),
        }
    }

    pub fn identity(&self) -> &CameraIdentity {
        &self.identity
    }

    pub fn is_open(&self) -> bool {
        self.camera.is_some()
    }

    pub fn is_capturing(&self) -> bool {
        self.capture_start.is_some()
    }

    pub fn frame_count(&self) -> u64 {
        self.events.frame_count()
    }

    /// Open the hardware camera, then switch every trigger line to output.
    ///
    /// Trigger-line setup is best effort; only the open itself can fail.
    pub fn open(&mut self) -> SdkResult<()> {
        if self.camera.is_some() {
            return Ok(());
        }
        let handle = self.sdk.open(&self.identity.id_string)?;
        self.camera = Some(OpenCamera { sdk: self.sdk.clone(), handle, streaming: false });
        info!(camera = %self.identity.id_string, "Camera opened");

        if let Err(code) = self.configure_trigger_lines(handle) {
            warn!(camera = %self.identity.id_string, "Trigger line setup failed: {}", code);
        }
        Ok(())
    }

    fn configure_trigger_lines(&self, handle: CameraHandle) -> SdkResult<()> {
        let selected = self.sdk.get_feature(handle, feature::LINE_SELECTOR, ValueKind::String)?;
        let output = FeatureValue::String(feature::LINE_MODE_OUTPUT.to_string());
        for line in self.sdk.feature_options(handle, feature::LINE_SELECTOR)? {
            self.sdk.set_feature(handle, feature::LINE_SELECTOR, &FeatureValue::String(line))?;
            self.sdk.set_feature(handle, feature::LINE_MODE, &output)?;
        }
        self.sdk.set_feature(handle, feature::LINE_SELECTOR, &selected)
    }

    /// Start capturing. Succeeds without effect if already capturing.
    pub fn start_capture(&mut self) -> SdkResult<()> {
        if self.is_capturing() {
            return Ok(());
        }
        let camera = self.camera.as_mut().ok_or(ReturnCode::DEVICE_NOT_OPEN)?;
        self.events.reset();
        let sink: Arc<dyn FrameSink> = self.events.clone();
        camera.sdk.start_capture(camera.handle, sink)?;
        camera.streaming = true;
        self.capture_start = Some(Instant::now());
        info!(camera = %self.identity.id_string, "Capture started");
        Ok(())
    }

    /// Stop capturing. Succeeds without effect if not capturing.
    ///
    /// The session leaves the capturing state even when the SDK reports an
    /// error; that error is still returned.
    pub fn stop_capture(&mut self) -> SdkResult<()> {
        if !self.is_capturing() {
            return Ok(());
        }
        let result = match self.camera.as_mut() {
            Some(camera) => {
                camera.streaming = false;
                camera.sdk.stop_capture(camera.handle)
            }
            None => Ok(()),
        };
        self.events.rest();
        self.capture_start = None;
        info!(camera = %self.identity.id_string, frames = self.frame_count(), "Capture stopped");
        result
    }

    /// Time since capture started, or `None` when not capturing.
    pub fn capture_elapsed(&self, now: Instant) -> Option<Duration> {
        self.capture_start.map(|start| now.saturating_duration_since(start))
    }

    /// Stop any capture and release the camera. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.camera.is_none() {
            return;
        }
        if let Err(code) = self.stop_capture() {
            warn!(camera = %self.identity.id_string, "Stop during close failed: {}", code);
        }
        self.camera = None;
        info!(camera = %self.identity.id_string, "Camera closed");
    }

    pub fn digital_bit(&self) -> Option<u8> {
        self.events.bit()
    }

    /// Bind a digital output bit to this camera's frame events, or unbind with `None`.
    pub fn set_digital_bit(&mut self, bit: Option<u8>) {
        self.events.assign_bit(bit);
    }

    fn handle(&self) -> SdkResult<CameraHandle> {
        self.camera.as_ref().map(|camera| camera.handle).ok_or(ReturnCode::DEVICE_NOT_OPEN)
    }

    pub fn get_feature(&self, name: &str, kind: ValueKind) -> SdkResult<FeatureValue> {
        self.sdk.get_feature(self.handle()?, name, kind)
    }

    pub fn set_feature(&self, name: &str, value: &FeatureValue) -> SdkResult<()> {
        self.sdk.set_feature(self.handle()?, name, value)
    }

    pub fn feature_options(&self, name: &str) -> SdkResult<Vec<String>> {
        self.sdk.feature_options(self.handle()?, name)
    }

    pub fn int_range(&self, name: &str) -> SdkResult<(i64, i64)> {
        self.sdk.int_range(self.handle()?, name)
    }

    /// Temperature source name and reading.
    pub fn temperature(&self) -> SdkResult<(String, f64)> {
        let source = self.get_feature(feature::TEMPERATURE_SOURCE, ValueKind::String)?;
        let value = self.get_feature(feature::TEMPERATURE, ValueKind::Float64)?;
        Ok((source.to_wire(), value.as_float().unwrap_or_default()))
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("id", &self.identity.id_string)
            .field("open", &self.is_open())
            .field("capturing", &self.is_capturing())
            .field("frames", &self.frame_count())
            .finish()
    }
}
