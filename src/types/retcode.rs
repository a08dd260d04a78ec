//! Vendor return codes carried in the `retcode` field of every reply

use std::fmt;

/// A vendor SDK status code.
///
/// Hardware calls return these verbatim and the dispatcher forwards them to
/// the client unchanged. The server's own protocol errors (`NOT_FOUND`,
/// `BAD_PARAMETER`, `WRONG_TYPE`, `NO_DATA`) reuse the vendor numbering so a
/// client only ever deals with one code space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReturnCode(pub i32);

impl ReturnCode {
    pub const SUCCESS: Self = Self(0);
    pub const INTERNAL_FAULT: Self = Self(-1);
    pub const API_NOT_STARTED: Self = Self(-2);
    pub const NOT_FOUND: Self = Self(-3);
    pub const BAD_HANDLE: Self = Self(-4);
    pub const DEVICE_NOT_OPEN: Self = Self(-5);
    pub const INVALID_ACCESS: Self = Self(-6);
    pub const BAD_PARAMETER: Self = Self(-7);
    pub const WRONG_TYPE: Self = Self(-10);
    pub const INVALID_VALUE: Self = Self(-11);
    pub const TIMEOUT: Self = Self(-12);
    pub const OTHER: Self = Self(-13);
    pub const INVALID_CALL: Self = Self(-15);
    pub const NO_TRANSPORT_LAYER: Self = Self(-16);
    pub const NOT_SUPPORTED: Self = Self(-18);
    pub const IO: Self = Self(-20);
    pub const BUSY: Self = Self(-24);
    pub const NO_DATA: Self = Self(-25);
    pub const IN_USE: Self = Self(-27);
    pub const NOT_AVAILABLE: Self = Self(-30);
    pub const ALREADY: Self = Self(-33);

    /// Raw integer as sent on the wire.
    pub const fn code(self) -> i32 {
        self.0
    }

    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    /// Convert to a `Result`, treating anything but `SUCCESS` as an error.
    pub fn into_result(self) -> Result<(), ReturnCode> {
        if self.is_success() { Ok(()) } else { Err(self) }
    }

    /// Symbolic name for log output.
    pub fn name(self) -> &'static str {
        match self.0 {
            0 => "Success",
            -1 => "InternalFault",
            -2 => "ApiNotStarted",
            -3 => "NotFound",
            -4 => "BadHandle",
            -5 => "DeviceNotOpen",
            -6 => "InvalidAccess",
            -7 => "BadParameter",
            -8 => "StructSize",
            -9 => "MoreData",
            -10 => "WrongType",
            -11 => "InvalidValue",
            -12 => "Timeout",
            -13 => "Other",
            -14 => "Resources",
            -15 => "InvalidCall",
            -16 => "NoTL",
            -17 => "NotImplemented",
            -18 => "NotSupported",
            -19 => "Incomplete",
            -20 => "IO",
            -24 => "Busy",
            -25 => "NoData",
            -27 => "InUse",
            -28 => "Unknown",
            -30 => "NotAvailable",
            -31 => "NotInitialized",
            -33 => "Already",
            _ => "Vendor",
        }
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

impl std::error::Error for ReturnCode {}

impl Default for ReturnCode {
    fn default() -> Self {
        Self::SUCCESS
    }
}

impl From<ReturnCode> for i32 {
    fn from(code: ReturnCode) -> Self {
        code.0
    }
}

impl From<i32> for ReturnCode {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_codes_match_vendor_numbering() {
        assert_eq!(ReturnCode::NOT_FOUND.code(), -3);
        assert_eq!(ReturnCode::BAD_PARAMETER.code(), -7);
        assert_eq!(ReturnCode::WRONG_TYPE.code(), -10);
        assert_eq!(ReturnCode::NO_DATA.code(), -25);
    }

    #[test]
    fn unknown_codes_pass_through() {
        let code = ReturnCode::from(-99);
        assert_eq!(code.name(), "Vendor");
        assert_eq!(i32::from(code), -99);
        assert!(code.to_string().contains("-99"));
    }

    #[test]
    fn into_result_treats_only_zero_as_success() {
        assert!(ReturnCode::SUCCESS.into_result().is_ok());
        assert_eq!(ReturnCode::BUSY.into_result(), Err(ReturnCode::BUSY));
    }
}
