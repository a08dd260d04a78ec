//! Camera identity records and fingerprints

use std::fmt;
use std::str::FromStr;

/// Identity of one enumerated camera.
///
/// Produced once by the SDK at enumeration time and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CameraIdentity {
    /// Vendor-unique identifier used to open the camera
    pub id_string: String,
    pub name: String,
    pub model: String,
    pub serial: String,
}

impl CameraIdentity {
    pub fn new(
        id_string: impl Into<String>,
        name: impl Into<String>,
        model: impl Into<String>,
        serial: impl Into<String>,
    ) -> Self {
        Self {
            id_string: id_string.into(),
            name: name.into(),
            model: model.into(),
            serial: serial.into(),
        }
    }
}

impl fmt::Display for CameraIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {},\nName: {},\nModel: {},\nSerial: {},\n",
            self.id_string, self.name, self.model, self.serial
        )
    }
}

/// Process-local routing key for a camera.
///
/// Derived from [`CameraIdentity::id_string`] by the
/// [`IdentityHasher`](crate::IdentityHasher); not stable across restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub u32);

impl Fingerprint {
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(Fingerprint)
    }
}

impl From<u32> for Fingerprint {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_info_format() {
        let identity =
            CameraIdentity::new("DEV_1AB22C00041B", "Alvium 1800 U-240m", "1800 U-240m", "0041B");
        assert_eq!(
            identity.to_string(),
            concat!(
                "ID: DEV_1AB22C00041B,\n",
                "Name: Alvium 1800 U-240m,\n",
                "Model: 1800 U-240m,\n",
                "Serial: 0041B,\n",
            )
        );
    }

    #[test]
    fn fingerprint_parsing() {
        assert_eq!("4294967295".parse::<Fingerprint>(), Ok(Fingerprint(u32::MAX)));
        assert_eq!(" 17 ".parse::<Fingerprint>(), Ok(Fingerprint(17)));
        assert!("".parse::<Fingerprint>().is_err());
        assert!("4294967296".parse::<Fingerprint>().is_err());
        assert!("-1".parse::<Fingerprint>().is_err());
    }
}
