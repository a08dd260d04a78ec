//! Camera feature value kinds and their wire representation

use super::ReturnCode;

/// Kinds of value a camera feature can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Enumeration or free-form string
    String,
    /// 64-bit floating point
    Float64,
    /// Boolean flag
    Bool,
    /// 64-bit signed integer
    Int64,
    /// The list of values an enumeration feature accepts (read-only)
    Options,
}

/// Runtime value of a single camera feature.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    String(String),
    Float64(f64),
    Bool(bool),
    Int64(i64),
}

impl FeatureValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            FeatureValue::String(_) => ValueKind::String,
            FeatureValue::Float64(_) => ValueKind::Float64,
            FeatureValue::Bool(_) => ValueKind::Bool,
            FeatureValue::Int64(_) => ValueKind::Int64,
        }
    }

    /// Parse a wire argument into a value of the given kind.
    ///
    /// Booleans are `true` case-insensitively and `false` otherwise. Integers
    /// also accept a float-formatted string and truncate it.
    pub fn parse(kind: ValueKind, argument: &str) -> Result<Self, ReturnCode> {
        match kind {
            ValueKind::String => Ok(FeatureValue::String(argument.to_string())),
            ValueKind::Float64 => parse_float(argument).map(FeatureValue::Float64),
            ValueKind::Bool => Ok(FeatureValue::Bool(argument.trim().eq_ignore_ascii_case("true"))),
            ValueKind::Int64 => parse_int(argument).map(FeatureValue::Int64),
            ValueKind::Options => Err(ReturnCode::WRONG_TYPE),
        }
    }

    /// Format for the `retargs` list.
    pub fn to_wire(&self) -> String {
        match self {
            FeatureValue::String(s) => s.clone(),
            FeatureValue::Float64(v) => format_float(*v),
            FeatureValue::Bool(b) => format_bool(*b).to_string(),
            FeatureValue::Int64(v) => v.to_string(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FeatureValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            FeatureValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FeatureValue::String(s) => Some(s),
            _ => None,
        }
    }
}

pub fn format_float(value: f64) -> String {
    format!("{value:.6}")
}

pub fn format_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

pub fn parse_float(argument: &str) -> Result<f64, ReturnCode> {
    argument.trim().parse::<f64>().map_err(|_| ReturnCode::INVALID_VALUE)
}

pub fn parse_int(argument: &str) -> Result<i64, ReturnCode> {
    let trimmed = argument.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Ok(v);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= i64::MIN as f64 && v <= i64::MAX as f64 => {
            Ok(v.trunc() as i64)
        }
        _ => Err(ReturnCode::INVALID_VALUE),
    }
}
