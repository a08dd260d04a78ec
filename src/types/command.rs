//! Command families and property codes

use std::fmt;
use std::str::FromStr;

/// The `cmd_type` field of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    Quit,
    List,
    Status,
    StartCapture,
    StopCapture,
    StartCaptureAll,
    StopCaptureAll,
    Get,
    Set,
}

impl CommandType {
    pub const ALL: [CommandType; 9] = [
        CommandType::Quit,
        CommandType::List,
        CommandType::Status,
        CommandType::StartCapture,
        CommandType::StopCapture,
        CommandType::StartCaptureAll,
        CommandType::StopCaptureAll,
        CommandType::Get,
        CommandType::Set,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            CommandType::Quit => "quit",
            CommandType::List => "list",
            CommandType::Status => "status",
            CommandType::StartCapture => "start_capture",
            CommandType::StopCapture => "stop_capture",
            CommandType::StartCaptureAll => "start_capture_all",
            CommandType::StopCaptureAll => "stop_capture_all",
            CommandType::Get => "get",
            CommandType::Set => "set",
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when `cmd_type` names no known command family.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command type '{0}'")]
pub struct UnknownCommand(pub String);

impl FromStr for CommandType {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownCommand(s.to_string()))
    }
}

/// Numeric property codes carried in the `command` field of `get`/`set`.
///
/// Codes are stable within a build; clients resolve them from the same table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum CommandCode {
    DigitalBit = 10,
    ImageFormat = 100,
    SensorBitDepth = 101,
    TriggerLine = 102,
    TriggerLineMode = 103,
    TriggerLineSource = 104,
    ExposureUs = 105,
    AcquisitionFramerate = 106,
    AcquisitionFramerateAuto = 107,
    FrameSize = 108,
    ImageSize = 200,
    ImageOffset = 201,
    SensorSize = 202,
    ThroughputLimit = 300,
    ThroughputLimitRange = 301,
    CameraInfo = 302,
    TriggerLineSources = 303,
    TriggerLines = 304,
    ImageFormats = 305,
    SensorBitDepths = 306,
    CaptureTimeLimit = 400,
}

impl CommandCode {
    pub const ALL: [CommandCode; 21] = [
        CommandCode::DigitalBit,
        CommandCode::ImageFormat,
        CommandCode::SensorBitDepth,
        CommandCode::TriggerLine,
        CommandCode::TriggerLineMode,
        CommandCode::TriggerLineSource,
        CommandCode::ExposureUs,
        CommandCode::AcquisitionFramerate,
        CommandCode::AcquisitionFramerateAuto,
        CommandCode::FrameSize,
        CommandCode::ImageSize,
        CommandCode::ImageOffset,
        CommandCode::SensorSize,
        CommandCode::ThroughputLimit,
        CommandCode::ThroughputLimitRange,
        CommandCode::CameraInfo,
        CommandCode::TriggerLineSources,
        CommandCode::TriggerLines,
        CommandCode::ImageFormats,
        CommandCode::SensorBitDepths,
        CommandCode::CaptureTimeLimit,
    ];

    pub const fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        CommandCode::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Name used in logs and by the command-line client.
    pub const fn name(self) -> &'static str {
        match self {
            CommandCode::DigitalBit => "digital_bit",
            CommandCode::ImageFormat => "image_format",
            CommandCode::SensorBitDepth => "sensor_bit_depth",
            CommandCode::TriggerLine => "trigline",
            CommandCode::TriggerLineMode => "trigline_mode",
            CommandCode::TriggerLineSource => "trigline_src",
            CommandCode::ExposureUs => "exposure_us",
            CommandCode::AcquisitionFramerate => "acq_framerate",
            CommandCode::AcquisitionFramerateAuto => "acq_framerate_auto",
            CommandCode::FrameSize => "frame_size",
            CommandCode::ImageSize => "image_size",
            CommandCode::ImageOffset => "image_offset",
            CommandCode::SensorSize => "sensor_size",
            CommandCode::ThroughputLimit => "throughput_limit",
            CommandCode::ThroughputLimitRange => "throughput_limit_range",
            CommandCode::CameraInfo => "camera_info",
            CommandCode::TriggerLineSources => "trigline_src_list",
            CommandCode::TriggerLines => "trigline_list",
            CommandCode::ImageFormats => "image_format_list",
            CommandCode::SensorBitDepths => "sensor_bit_depth_list",
            CommandCode::CaptureTimeLimit => "capture_time_limit",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        CommandCode::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
