//! Property descriptor table
//!
//! Simple properties map one command code onto one SDK feature and are
//! handled generically from [`PROPERTIES`]. Everything else is a
//! [`CompositeProperty`] with its own read and write rules.

use crate::sdk::{SdkResult, feature};
use crate::session::CameraSession;
use crate::types::{CommandCode, FeatureValue, ReturnCode, ValueKind, parse_int};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

/// How one simple property maps onto an SDK feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub code: CommandCode,
    pub feature: &'static str,
    pub kind: ValueKind,
    pub access: Access,
}

const fn rw(code: CommandCode, feature: &'static str, kind: ValueKind) -> PropertyDescriptor {
    PropertyDescriptor { code, feature, kind, access: Access::ReadWrite }
}

const fn ro(code: CommandCode, feature: &'static str, kind: ValueKind) -> PropertyDescriptor {
    PropertyDescriptor { code, feature, kind, access: Access::ReadOnly }
}

pub static PROPERTIES: &[PropertyDescriptor] = &[
    rw(CommandCode::ImageFormat, feature::PIXEL_FORMAT, ValueKind::String),
    rw(CommandCode::SensorBitDepth, feature::SENSOR_BIT_DEPTH, ValueKind::String),
    rw(CommandCode::TriggerLine, feature::LINE_SELECTOR, ValueKind::String),
    rw(CommandCode::TriggerLineMode, feature::LINE_MODE, ValueKind::String),
    rw(CommandCode::TriggerLineSource, feature::LINE_SOURCE, ValueKind::String),
    rw(CommandCode::ExposureUs, feature::EXPOSURE_TIME, ValueKind::Float64),
    rw(CommandCode::AcquisitionFramerate, feature::FRAME_RATE, ValueKind::Float64),
    rw(CommandCode::AcquisitionFramerateAuto, feature::FRAME_RATE_ENABLE, ValueKind::Bool),
    ro(CommandCode::FrameSize, feature::PAYLOAD_SIZE, ValueKind::Int64),
    rw(CommandCode::ThroughputLimit, feature::THROUGHPUT_LIMIT, ValueKind::Int64),
    ro(CommandCode::TriggerLineSources, feature::LINE_SOURCE, ValueKind::Options),
    ro(CommandCode::TriggerLines, feature::LINE_SELECTOR, ValueKind::Options),
    ro(CommandCode::ImageFormats, feature::PIXEL_FORMAT, ValueKind::Options),
    ro(CommandCode::SensorBitDepths, feature::SENSOR_BIT_DEPTH, ValueKind::Options),
];

impl PropertyDescriptor {
    pub fn is_writable(&self) -> bool {
        self.access == Access::ReadWrite
    }

    pub fn read(&self, session: &CameraSession) -> SdkResult<Vec<String>> {
        match self.kind {
            ValueKind::Options => session.feature_options(self.feature),
            kind => Ok(vec![session.get_feature(self.feature, kind)?.to_wire()]),
        }
    }

    /// Write `argument` and return the value the camera kept.
    pub fn write(&self, session: &CameraSession, argument: &str) -> SdkResult<Vec<String>> {
        if !self.is_writable() {
            return Err(ReturnCode::WRONG_TYPE);
        }
        let value = FeatureValue::parse(self.kind, argument)?;
        session.set_feature(self.feature, &value)?;
        self.read(session)
    }
}

/// Properties that span several features or live outside the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeProperty {
    ImageSize,
    ImageOffset,
    SensorSize,
    ThroughputLimitRange,
    CameraInfo,
    DigitalBit,
    CaptureTimeLimit,
}

impl CompositeProperty {
    pub fn from_code(code: CommandCode) -> Option<Self> {
        match code {
            CommandCode::ImageSize => Some(Self::ImageSize),
            CommandCode::ImageOffset => Some(Self::ImageOffset),
            CommandCode::SensorSize => Some(Self::SensorSize),
            CommandCode::ThroughputLimitRange => Some(Self::ThroughputLimitRange),
            CommandCode::CameraInfo => Some(Self::CameraInfo),
            CommandCode::DigitalBit => Some(Self::DigitalBit),
            CommandCode::CaptureTimeLimit => Some(Self::CaptureTimeLimit),
            _ => None,
        }
    }

    /// Feature pair behind a two-value geometry property.
    pub fn feature_pair(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::ImageSize => Some((feature::WIDTH, feature::HEIGHT)),
            Self::ImageOffset => Some((feature::OFFSET_X, feature::OFFSET_Y)),
            Self::SensorSize => Some((feature::SENSOR_WIDTH, feature::SENSOR_HEIGHT)),
            _ => None,
        }
    }

    pub fn is_writable(self) -> bool {
        matches!(
            self,
            Self::ImageSize | Self::ImageOffset | Self::DigitalBit | Self::CaptureTimeLimit
        )
    }
}

/// A resolved `command` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Simple(&'static PropertyDescriptor),
    Composite(CompositeProperty),
}

impl Property {
    pub fn lookup(code: i32) -> Option<Self> {
        let code = CommandCode::from_code(code)?;
        if let Some(descriptor) = PROPERTIES.iter().find(|d| d.code == code) {
            return Some(Property::Simple(descriptor));
        }
        CompositeProperty::from_code(code).map(Property::Composite)
    }
}

/// Read two integer features as a pair of wire values.
pub fn read_pair(session: &CameraSession, (first, second): (&str, &str)) -> SdkResult<Vec<String>> {
    let a = session.get_feature(first, ValueKind::Int64)?;
    let b = session.get_feature(second, ValueKind::Int64)?;
    Ok(vec![a.to_wire(), b.to_wire()])
}

/// Write two integer features in order, then read back what the camera kept.
///
/// Exactly two arguments are required.
pub fn write_pair(
    session: &CameraSession,
    features: (&str, &str),
    arguments: &[String],
) -> SdkResult<Vec<String>> {
    let [first, second] = arguments else {
        return Err(ReturnCode::WRONG_TYPE);
    };
    let a = parse_int(first)?;
    let b = parse_int(second)?;
    session.set_feature(features.0, &FeatureValue::Int64(a))?;
    session.set_feature(features.1, &FeatureValue::Int64(b))?;
    read_pair(session, features)
}

/// Inclusive range of an integer feature as two wire values.
pub fn read_range(session: &CameraSession, feature: &str) -> SdkResult<Vec<String>> {
    let (min, max) = session.int_range(feature)?;
    Ok(vec![min.to_string(), max.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_code_resolves_exactly_once() {
        let simple: HashSet<_> = PROPERTIES.iter().map(|d| d.code).collect();
        assert_eq!(simple.len(), PROPERTIES.len());
        for code in CommandCode::ALL {
            let composite = CompositeProperty::from_code(code).is_some();
            assert!(simple.contains(&code) ^ composite, "{code} must be simple or composite");
            assert!(Property::lookup(code.code()).is_some());
        }
        assert_eq!(Property::lookup(999), None);
    }

    #[test]
    fn option_lists_and_frame_size_are_read_only() {
        for descriptor in PROPERTIES {
            let read_only =
                descriptor.kind == ValueKind::Options || descriptor.code == CommandCode::FrameSize;
            assert_eq!(descriptor.is_writable(), !read_only, "{}", descriptor.code);
        }
    }

    #[test]
    fn only_geometry_composites_have_feature_pairs() {
        assert!(CompositeProperty::ImageSize.feature_pair().is_some());
        assert!(CompositeProperty::SensorSize.feature_pair().is_some());
        assert!(!CompositeProperty::SensorSize.is_writable());
        assert_eq!(CompositeProperty::CameraInfo.feature_pair(), None);
    }
}
