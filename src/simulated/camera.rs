//! In-memory camera SDK
//!
//! Models a handful of GenICam cameras closely enough to drive the server end
//! to end: enumeration, exclusive open, typed feature access with the
//! vendor's error codes, clamping of numeric features, enumeration option
//! lists, per-line trigger modes and frame delivery.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use crate::sdk::{CameraHandle, CameraSdk, FrameSink, SdkResult, feature};
use crate::types::{CameraIdentity, FeatureValue, FrameEvent, ReturnCode, ValueKind};

pub const EXPOSURE_MIN_US: f64 = 20.0;
pub const EXPOSURE_MAX_US: f64 = 10_000_000.0;
pub const FRAME_RATE_MIN: f64 = 1.0;
pub const FRAME_RATE_MAX: f64 = 200.0;
pub const THROUGHPUT_MIN: i64 = 4_000_000;
pub const THROUGHPUT_MAX: i64 = 450_000_000;
/// Width and height snap down to this increment.
pub const SIZE_INCREMENT: i64 = 8;

const PIXEL_FORMATS: &[&str] = &["Mono8", "Mono10", "Mono12", "Mono16"];
const BIT_DEPTHS: &[&str] = &["Adaptive", "Bpp8", "Bpp10", "Bpp12"];
const LINES: &[&str] = &["Line0", "Line1", "Line2", "Line3"];
const LINE_MODES: &[&str] = &["Input", "Output"];
const LINE_SOURCES: &[&str] =
    &["Off", "ExposureActive", "FrameTriggerWait", "FrameActive", "AcquisitionActive"];
const TEMPERATURE_SOURCES: &[&str] = &["Sensor", "Mainboard"];

/// Static description of the simulated fleet.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub cameras: Vec<CameraIdentity>,
    pub sensor_width: i64,
    pub sensor_height: i64,
    /// Frame period of the background generator; `None` delivers frames only
    /// through [`SimulatedSdk::deliver_frames`].
    pub frame_interval: Option<Duration>,
}

impl SimConfig {
    /// `count` cameras with vendor-style identity strings.
    pub fn with_cameras(count: usize) -> Self {
        let cameras = (0..count)
            .map(|i| {
                let serial = format!("{:05X}", 0x41B + i);
                CameraIdentity::new(
                    format!("DEV_1AB22C{serial}"),
                    format!("Allied Vision 1800 U-240m #{i}"),
                    "1800 U-240m",
                    serial,
                )
            })
            .collect();
        Self { cameras, sensor_width: 1936, sensor_height: 1216, frame_interval: None }
    }

    /// Generate frames in the background at `fps` while capturing.
    ///
    /// Rates that give no representable, non-zero period disable the
    /// generator.
    pub fn with_frame_rate(mut self, fps: f64) -> Self {
        self.frame_interval = Duration::try_from_secs_f64(1.0 / fps)
            .ok()
            .filter(|interval| fps > 0.0 && !interval.is_zero());
        self
    }
}

/// Simulated vendor SDK.
pub struct SimulatedSdk {
    config: SimConfig,
    state: Mutex<SimState>,
}

#[derive(Default)]
struct SimState {
    initialized: bool,
    next_handle: u64,
    open: HashMap<CameraHandle, SimCamera>,
    faults: Faults,
}

#[derive(Default)]
struct Faults {
    init: Option<ReturnCode>,
    list: Option<ReturnCode>,
    open: HashMap<String, ReturnCode>,
    start: HashMap<String, ReturnCode>,
    stop: HashMap<String, ReturnCode>,
}

struct SimCamera {
    id: String,
    index: usize,
    features: HashMap<&'static str, FeatureValue>,
    line_modes: HashMap<String, String>,
    capture: Option<Capture>,
}

struct Capture {
    sink: Arc<dyn FrameSink>,
    next_frame_id: u64,
    generator: Option<FrameGenerator>,
}

struct FrameGenerator {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl FrameGenerator {
    fn spawn(sink: Arc<dyn FrameSink>, interval: Duration, payload_len: usize) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let thread = std::thread::spawn(move || {
            let mut frame_id = 0u64;
            while wait_period(&flag, interval) {
                sink.on_frame(FrameEvent::new(frame_id, payload_len));
                frame_id += 1;
            }
        });
        Self { stop, thread }
    }

    fn halt(self) {
        self.stop.store(true, Ordering::Release);
        self.thread.thread().unpark();
        if self.thread.join().is_err() {
            debug!("Frame generator thread panicked");
        }
    }
}

/// Park for one frame period. Returns `false` as soon as `stop` is set.
fn wait_period(stop: &AtomicBool, interval: Duration) -> bool {
    let deadline = Instant::now() + interval;
    loop {
        if stop.load(Ordering::Acquire) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::park_timeout(deadline - now);
    }
}

/// Access rules for one feature.
enum Rule {
    ReadOnly,
    Enumeration(&'static [&'static str]),
    FloatRange(f64, f64),
    IntRange(i64, i64),
    Width,
    Height,
    OffsetX,
    OffsetY,
    Free,
}

fn rule(name: &str) -> Rule {
    match name {
        feature::PIXEL_FORMAT => Rule::Enumeration(PIXEL_FORMATS),
        feature::SENSOR_BIT_DEPTH => Rule::Enumeration(BIT_DEPTHS),
        feature::LINE_SELECTOR => Rule::Enumeration(LINES),
        feature::LINE_MODE => Rule::Enumeration(LINE_MODES),
        feature::LINE_SOURCE => Rule::Enumeration(LINE_SOURCES),
        feature::TEMPERATURE_SOURCE => Rule::Enumeration(TEMPERATURE_SOURCES),
        feature::EXPOSURE_TIME => Rule::FloatRange(EXPOSURE_MIN_US, EXPOSURE_MAX_US),
        feature::FRAME_RATE => Rule::FloatRange(FRAME_RATE_MIN, FRAME_RATE_MAX),
        feature::THROUGHPUT_LIMIT => Rule::IntRange(THROUGHPUT_MIN, THROUGHPUT_MAX),
        feature::WIDTH => Rule::Width,
        feature::HEIGHT => Rule::Height,
        feature::OFFSET_X => Rule::OffsetX,
        feature::OFFSET_Y => Rule::OffsetY,
        feature::PAYLOAD_SIZE
        | feature::SENSOR_WIDTH
        | feature::SENSOR_HEIGHT
        | feature::TEMPERATURE => {
            Rule::ReadOnly
        }
        _ => Rule::Free,
    }
}

fn bytes_per_pixel(format: &str) -> i64 {
    if format == "Mono8" { 1 } else { 2 }
}

impl SimCamera {
    fn new(id: &str, index: usize, config: &SimConfig) -> Self {
        let mut features = HashMap::new();
        features.insert(feature::PIXEL_FORMAT, FeatureValue::String("Mono8".into()));
        features.insert(feature::SENSOR_BIT_DEPTH, FeatureValue::String("Adaptive".into()));
        features.insert(feature::LINE_SELECTOR, FeatureValue::String("Line0".into()));
        features.insert(feature::LINE_SOURCE, FeatureValue::String("ExposureActive".into()));
        features.insert(feature::EXPOSURE_TIME, FeatureValue::Float64(5000.0));
        features.insert(feature::FRAME_RATE, FeatureValue::Float64(30.0));
        features.insert(feature::FRAME_RATE_ENABLE, FeatureValue::Bool(false));
        features.insert(feature::WIDTH, FeatureValue::Int64(config.sensor_width));
        features.insert(feature::HEIGHT, FeatureValue::Int64(config.sensor_height));
        features.insert(feature::OFFSET_X, FeatureValue::Int64(0));
        features.insert(feature::OFFSET_Y, FeatureValue::Int64(0));
        features.insert(feature::SENSOR_WIDTH, FeatureValue::Int64(config.sensor_width));
        features.insert(feature::SENSOR_HEIGHT, FeatureValue::Int64(config.sensor_height));
        features.insert(feature::THROUGHPUT_LIMIT, FeatureValue::Int64(THROUGHPUT_MAX));
        features.insert(feature::TEMPERATURE_SOURCE, FeatureValue::String("Sensor".into()));
        features.insert(feature::TEMPERATURE, FeatureValue::Float64(38.5 + index as f64));
        let line_modes = LINES.iter().map(|line| (line.to_string(), "Input".to_string())).collect();
        Self { id: id.to_string(), index, features, line_modes, capture: None }
    }

    fn int(&self, name: &str) -> i64 {
        self.features.get(name).and_then(FeatureValue::as_int).unwrap_or_default()
    }

    fn selected_line(&self) -> String {
        self.features
            .get(feature::LINE_SELECTOR)
            .and_then(FeatureValue::as_str)
            .unwrap_or(LINES[0])
            .to_string()
    }

    fn payload_size(&self) -> i64 {
        let format = self
            .features
            .get(feature::PIXEL_FORMAT)
            .and_then(FeatureValue::as_str)
            .unwrap_or("Mono8");
        self.int(feature::WIDTH) * self.int(feature::HEIGHT) * bytes_per_pixel(format)
    }

    fn read(&self, name: &str) -> SdkResult<FeatureValue> {
        match name {
            feature::PAYLOAD_SIZE => Ok(FeatureValue::Int64(self.payload_size())),
            feature::LINE_MODE => {
                let mode = self
                    .line_modes
                    .get(&self.selected_line())
                    .cloned()
                    .unwrap_or_else(|| "Input".into());
                Ok(FeatureValue::String(mode))
            }
            _ => self.features.get(name).cloned().ok_or(ReturnCode::NOT_FOUND),
        }
    }

    fn int_bounds(&self, name: &str) -> SdkResult<(i64, i64)> {
        let sensor_w = self.int(feature::SENSOR_WIDTH);
        let sensor_h = self.int(feature::SENSOR_HEIGHT);
        match rule(name) {
            Rule::IntRange(min, max) => Ok((min, max)),
            Rule::Width => Ok((SIZE_INCREMENT, sensor_w - self.int(feature::OFFSET_X))),
            Rule::Height => Ok((SIZE_INCREMENT, sensor_h - self.int(feature::OFFSET_Y))),
            Rule::OffsetX => Ok((0, sensor_w - self.int(feature::WIDTH))),
            Rule::OffsetY => Ok((0, sensor_h - self.int(feature::HEIGHT))),
            _ => match self.read(name)? {
                FeatureValue::Int64(v) => Ok((v, v)),
                _ => Err(ReturnCode::WRONG_TYPE),
            },
        }
    }

    fn write(&mut self, name: &str, value: &FeatureValue) -> SdkResult<()> {
        let current = self.read(name)?;
        if current.kind() != value.kind() {
            return Err(ReturnCode::WRONG_TYPE);
        }
        let stored = match (rule(name), value) {
            (Rule::ReadOnly, _) => return Err(ReturnCode::INVALID_ACCESS),
            (Rule::Enumeration(options), FeatureValue::String(s)) => {
                if !options.contains(&s.as_str()) {
                    return Err(ReturnCode::INVALID_VALUE);
                }
                value.clone()
            }
            (Rule::FloatRange(min, max), FeatureValue::Float64(v)) => {
                if !v.is_finite() {
                    return Err(ReturnCode::INVALID_VALUE);
                }
                FeatureValue::Float64(v.clamp(min, max))
            }
            (Rule::Width | Rule::Height, FeatureValue::Int64(v)) => {
                let (min, max) = self.int_bounds(name)?;
                let snapped = (*v).clamp(min, max.max(min)) / SIZE_INCREMENT * SIZE_INCREMENT;
                FeatureValue::Int64(snapped)
            }
            (Rule::IntRange(..) | Rule::OffsetX | Rule::OffsetY, FeatureValue::Int64(v)) => {
                let (min, max) = self.int_bounds(name)?;
                FeatureValue::Int64((*v).clamp(min, max.max(min)))
            }
            _ => value.clone(),
        };

        if name == feature::LINE_MODE {
            let line = self.selected_line();
            let mode = stored.as_str().unwrap_or_default().to_string();
            self.line_modes.insert(line, mode);
            return Ok(());
        }
        if let Some(slot) = self.features.get_mut(name) {
            *slot = stored;
        }
        Ok(())
    }

    fn halt_capture(&mut self) {
        if let Some(capture) = self.capture.take() {
            if let Some(generator) = capture.generator {
                generator.halt();
            }
        }
    }
}

impl SimulatedSdk {
    pub fn new(config: SimConfig) -> Self {
        Self { config, state: Mutex::new(SimState::default()) }
    }

    /// Simulator with `count` cameras and no background frames.
    pub fn with_cameras(count: usize) -> Self {
        Self::new(SimConfig::with_cameras(count))
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_camera<T>(
        &self,
        handle: CameraHandle,
        f: impl FnOnce(&mut SimCamera) -> SdkResult<T>,
    ) -> SdkResult<T> {
        let mut state = self.lock();
        if !state.initialized {
            return Err(ReturnCode::API_NOT_STARTED);
        }
        let camera = state.open.get_mut(&handle).ok_or(ReturnCode::BAD_HANDLE)?;
        f(camera)
    }

    fn find_open<T>(&self, id: &str, f: impl FnOnce(&mut SimCamera) -> T) -> Option<T> {
        let mut state = self.lock();
        state.open.values_mut().find(|camera| camera.id == id).map(f)
    }

    /// Make the next `init` fail with `code`.
    pub fn fail_init(&self, code: ReturnCode) {
        self.lock().faults.init = Some(code);
    }

    /// Make the next `list_cameras` fail with `code`.
    pub fn fail_list(&self, code: ReturnCode) {
        self.lock().faults.list = Some(code);
    }

    /// Make the next `open` of `id` fail with `code`.
    pub fn fail_open(&self, id: &str, code: ReturnCode) {
        self.lock().faults.open.insert(id.to_string(), code);
    }

    /// Make the next `start_capture` on `id` fail with `code`.
    pub fn fail_next_start(&self, id: &str, code: ReturnCode) {
        self.lock().faults.start.insert(id.to_string(), code);
    }

    /// Make the next `stop_capture` on `id` report `code`. Streaming still stops.
    pub fn fail_next_stop(&self, id: &str, code: ReturnCode) {
        self.lock().faults.stop.insert(id.to_string(), code);
    }

    /// Synchronously deliver `count` frames to the sink of a capturing camera.
    ///
    /// Returns the number delivered, zero if `id` is not capturing.
    pub fn deliver_frames(&self, id: &str, count: usize) -> usize {
        let target = self.find_open(id, |camera| {
            let payload = camera.payload_size() as usize;
            camera.capture.as_mut().map(|capture| {
                let first = capture.next_frame_id;
                capture.next_frame_id += count as u64;
                (capture.sink.clone(), first, payload)
            })
        });
        let Some(Some((sink, first, payload))) = target else {
            return 0;
        };
        // Sinks run without the SDK lock held, as on a vendor callback thread.
        for frame_id in first..first + count as u64 {
            sink.on_frame(FrameEvent::new(frame_id, payload));
        }
        trace!(camera = id, count, "Delivered simulated frames");
        count
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.find_open(id, |_| ()).is_some()
    }

    pub fn is_capturing(&self, id: &str) -> bool {
        self.find_open(id, |camera| camera.capture.is_some()).unwrap_or(false)
    }

    /// Current value of a feature on an open camera.
    pub fn feature(&self, id: &str, name: &str) -> Option<FeatureValue> {
        self.find_open(id, |camera| camera.read(name).ok()).flatten()
    }

    /// Mode of a trigger line on an open camera.
    pub fn line_mode(&self, id: &str, line: &str) -> Option<String> {
        self.find_open(id, |camera| camera.line_modes.get(line).cloned()).flatten()
    }
}

impl CameraSdk for SimulatedSdk {
    fn init(&self, search_path: Option<&Path>) -> SdkResult<()> {
        let mut state = self.lock();
        if let Some(code) = state.faults.init.take() {
            return Err(code);
        }
        state.initialized = true;
        info!(
            search_path = ?search_path,
            cameras = self.config.cameras.len(),
            "Simulated camera API started"
        );
        Ok(())
    }

    fn shutdown(&self) {
        let mut state = self.lock();
        for camera in state.open.values_mut() {
            camera.halt_capture();
        }
        state.open.clear();
        state.initialized = false;
        debug!("Simulated camera API shut down");
    }

    fn list_cameras(&self) -> SdkResult<Vec<CameraIdentity>> {
        let mut state = self.lock();
        if !state.initialized {
            return Err(ReturnCode::API_NOT_STARTED);
        }
        if let Some(code) = state.faults.list.take() {
            return Err(code);
        }
        Ok(self.config.cameras.clone())
    }

    fn open(&self, id_string: &str) -> SdkResult<CameraHandle> {
        let mut state = self.lock();
        if !state.initialized {
            return Err(ReturnCode::API_NOT_STARTED);
        }
        if let Some(code) = state.faults.open.remove(id_string) {
            return Err(code);
        }
        let index = self
            .config
            .cameras
            .iter()
            .position(|c| c.id_string == id_string)
            .ok_or(ReturnCode::NOT_FOUND)?;
        if state.open.values().any(|camera| camera.id == id_string) {
            return Err(ReturnCode::IN_USE);
        }
        state.next_handle += 1;
        let handle = CameraHandle(state.next_handle);
        state.open.insert(handle, SimCamera::new(id_string, index, &self.config));
        Ok(handle)
    }

    fn close(&self, handle: CameraHandle) -> SdkResult<()> {
        let mut state = self.lock();
        let mut camera = state.open.remove(&handle).ok_or(ReturnCode::BAD_HANDLE)?;
        camera.halt_capture();
        Ok(())
    }

    fn start_capture(&self, handle: CameraHandle, sink: Arc<dyn FrameSink>) -> SdkResult<()> {
        let interval = self.config.frame_interval;
        let mut state = self.lock();
        let camera = state.open.get_mut(&handle).ok_or(ReturnCode::BAD_HANDLE)?;
        let id = camera.id.clone();
        if camera.capture.is_some() {
            return Err(ReturnCode::BUSY);
        }
        if let Some(code) = state.faults.start.remove(&id) {
            return Err(code);
        }
        let camera = state.open.get_mut(&handle).ok_or(ReturnCode::BAD_HANDLE)?;
        let payload_len = camera.payload_size() as usize;
        let generator =
            interval.map(|every| FrameGenerator::spawn(sink.clone(), every, payload_len));
        camera.capture = Some(Capture { sink, next_frame_id: 0, generator });
        debug!(camera = %camera.id, index = camera.index, "Simulated capture started");
        Ok(())
    }

    fn stop_capture(&self, handle: CameraHandle) -> SdkResult<()> {
        let mut state = self.lock();
        let camera = state.open.get_mut(&handle).ok_or(ReturnCode::BAD_HANDLE)?;
        let id = camera.id.clone();
        if camera.capture.is_none() {
            return Err(ReturnCode::INVALID_CALL);
        }
        camera.halt_capture();
        match state.faults.stop.remove(&id) {
            Some(code) => Err(code),
            None => Ok(()),
        }
    }

    fn get_feature(
        &self,
        handle: CameraHandle,
        name: &str,
        kind: ValueKind,
    ) -> SdkResult<FeatureValue> {
        self.with_camera(handle, |camera| {
            let value = camera.read(name)?;
            if value.kind() == kind { Ok(value) } else { Err(ReturnCode::WRONG_TYPE) }
        })
    }

    fn set_feature(&self, handle: CameraHandle, name: &str, value: &FeatureValue) -> SdkResult<()> {
        self.with_camera(handle, |camera| camera.write(name, value))
    }

    fn feature_options(&self, handle: CameraHandle, name: &str) -> SdkResult<Vec<String>> {
        self.with_camera(handle, |camera| {
            camera.read(name)?;
            match rule(name) {
                Rule::Enumeration(options) => Ok(options.iter().map(|s| s.to_string()).collect()),
                _ => Err(ReturnCode::WRONG_TYPE),
            }
        })
    }

    fn int_range(&self, handle: CameraHandle, name: &str) -> SdkResult<(i64, i64)> {
        self.with_camera(handle, |camera| camera.int_bounds(name))
    }
}

impl std::fmt::Debug for SimulatedSdk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedSdk")
            .field("cameras", &self.config.cameras.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    #[derive(Default)]
    struct CountingSink(AtomicU64);

    impl FrameSink for CountingSink {
        fn on_frame(&self, _event: FrameEvent) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn opened() -> (SimulatedSdk, CameraHandle, String) {
        let sdk = SimulatedSdk::with_cameras(1);
        sdk.init(None).unwrap();
        let id = sdk.list_cameras().unwrap()[0].id_string.clone();
        let handle = sdk.open(&id).unwrap();
        (sdk, handle, id)
    }

    #[test]
    fn api_must_be_started() {
        let sdk = SimulatedSdk::with_cameras(1);
        assert_eq!(sdk.list_cameras(), Err(ReturnCode::API_NOT_STARTED));
    }

    #[test]
    fn cameras_open_exclusively() {
        let (sdk, _handle, id) = opened();
        assert_eq!(sdk.open(&id), Err(ReturnCode::IN_USE));
        assert_eq!(sdk.open("DEV_MISSING"), Err(ReturnCode::NOT_FOUND));
    }

    #[test]
    fn numeric_features_are_clamped() {
        let (sdk, handle, _) = opened();
        sdk.set_feature(handle, feature::EXPOSURE_TIME, &FeatureValue::Float64(1.0)).unwrap();
        assert_eq!(
            sdk.get_feature(handle, feature::EXPOSURE_TIME, ValueKind::Float64),
            Ok(FeatureValue::Float64(EXPOSURE_MIN_US))
        );

        sdk.set_feature(handle, feature::WIDTH, &FeatureValue::Int64(643)).unwrap();
        assert_eq!(
            sdk.get_feature(handle, feature::WIDTH, ValueKind::Int64),
            Ok(FeatureValue::Int64(640))
        );

        sdk.set_feature(handle, feature::OFFSET_X, &FeatureValue::Int64(100_000)).unwrap();
        assert_eq!(
            sdk.get_feature(handle, feature::OFFSET_X, ValueKind::Int64),
            Ok(FeatureValue::Int64(1936 - 640))
        );
    }

    #[test]
    fn access_errors_use_vendor_codes() {
        let (sdk, handle, _) = opened();
        assert_eq!(
            sdk.set_feature(handle, feature::PAYLOAD_SIZE, &FeatureValue::Int64(1)),
            Err(ReturnCode::INVALID_ACCESS)
        );
        assert_eq!(
            sdk.set_feature(handle, feature::PIXEL_FORMAT, &FeatureValue::String("RGB8".into())),
            Err(ReturnCode::INVALID_VALUE)
        );
        assert_eq!(
            sdk.set_feature(handle, feature::EXPOSURE_TIME, &FeatureValue::Int64(5)),
            Err(ReturnCode::WRONG_TYPE)
        );
        assert_eq!(sdk.get_feature(handle, "Gain", ValueKind::Float64), Err(ReturnCode::NOT_FOUND));
        assert_eq!(
            sdk.feature_options(handle, feature::EXPOSURE_TIME),
            Err(ReturnCode::WRONG_TYPE)
        );
    }

    #[test]
    fn payload_follows_geometry_and_format() {
        let (sdk, handle, _) = opened();
        sdk.set_feature(handle, feature::WIDTH, &FeatureValue::Int64(100)).unwrap();
        sdk.set_feature(handle, feature::HEIGHT, &FeatureValue::Int64(50)).unwrap();
        let mono12 = FeatureValue::String("Mono12".into());
        sdk.set_feature(handle, feature::PIXEL_FORMAT, &mono12).unwrap();
        assert_eq!(
            sdk.get_feature(handle, feature::PAYLOAD_SIZE, ValueKind::Int64),
            Ok(FeatureValue::Int64(96 * 48 * 2))
        );
    }

    #[test]
    fn line_mode_tracks_the_selected_line() {
        let (sdk, handle, id) = opened();
        let line2 = FeatureValue::String("Line2".into());
        sdk.set_feature(handle, feature::LINE_SELECTOR, &line2).unwrap();
        let output = FeatureValue::String("Output".into());
        sdk.set_feature(handle, feature::LINE_MODE, &output).unwrap();
        assert_eq!(sdk.line_mode(&id, "Line2").as_deref(), Some("Output"));
        assert_eq!(sdk.line_mode(&id, "Line0").as_deref(), Some("Input"));
    }

    #[test]
    fn frames_reach_the_sink_only_while_capturing() {
        let (sdk, handle, id) = opened();
        let sink = Arc::new(CountingSink::default());
        assert_eq!(sdk.deliver_frames(&id, 3), 0);

        sdk.start_capture(handle, sink.clone()).unwrap();
        assert_eq!(sdk.start_capture(handle, sink.clone()), Err(ReturnCode::BUSY));
        assert_eq!(sdk.deliver_frames(&id, 3), 3);
        sdk.stop_capture(handle).unwrap();

        assert_eq!(sdk.deliver_frames(&id, 3), 0);
        assert_eq!(sink.0.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn background_generator_stops_with_capture() {
        let sdk = SimulatedSdk::new(SimConfig::with_cameras(1).with_frame_rate(500.0));
        sdk.init(None).unwrap();
        let id = sdk.config().cameras[0].id_string.clone();
        let handle = sdk.open(&id).unwrap();
        let sink = Arc::new(CountingSink::default());

        sdk.start_capture(handle, sink.clone()).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        sdk.stop_capture(handle).unwrap();

        let after_stop = sink.0.load(Ordering::Relaxed);
        assert!(after_stop > 0);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(sink.0.load(Ordering::Relaxed), after_stop);
    }

    #[test]
    fn slow_generator_stops_without_waiting_a_period() {
        let sdk = SimulatedSdk::new(SimConfig::with_cameras(1).with_frame_rate(0.1));
        sdk.init(None).unwrap();
        let id = sdk.config().cameras[0].id_string.clone();
        let handle = sdk.open(&id).unwrap();

        sdk.start_capture(handle, Arc::new(CountingSink::default())).unwrap();
        let started = Instant::now();
        sdk.stop_capture(handle).unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(!sdk.is_capturing(&id));
    }

    #[test]
    fn unrepresentable_frame_rates_disable_the_generator() {
        for fps in [0.0, -5.0, 1e-30, f64::NAN, f64::INFINITY] {
            let config = SimConfig::with_cameras(1).with_frame_rate(fps);
            assert_eq!(config.frame_interval, None, "fps = {fps}");
        }
        let config = SimConfig::with_cameras(1).with_frame_rate(4.0);
        assert_eq!(config.frame_interval, Some(Duration::from_millis(250)));
    }

    #[test]
    fn injected_stop_failure_still_stops_streaming() {
        let (sdk, handle, id) = opened();
        sdk.start_capture(handle, Arc::new(CountingSink::default())).unwrap();
        sdk.fail_next_stop(&id, ReturnCode::IO);
        assert_eq!(sdk.stop_capture(handle), Err(ReturnCode::IO));
        assert!(!sdk.is_capturing(&id));
    }
}
