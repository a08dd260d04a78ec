//! Error types for server bootstrap and transport.
//!
//! Request-level failures never surface here: the dispatcher folds them into
//! the reply's `retcode` (see [`ReturnCode`]). [`ServerError`] covers the
//! failures that stop the process or the transport instead.
//!
//! ## Error Categories
//!
//! - **Hardware API Errors**: SDK initialization or enumeration failed
//! - **Discovery Errors**: no cameras, a camera that will not open, or two
//!   identities hashing to the same fingerprint
//! - **Transport Errors**: the listener could not bind or a connection broke
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use camserver::ServerError;
//!
//! let error = ServerError::NoCameras;
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::{Fingerprint, ReturnCode};

/// Result type alias for server operations.
pub type Result<T, E = ServerError> = std::result::Result<T, E>;

/// Process-level error.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ServerError {
    #[error("Failed to initialize camera API (search path {path:?}): {code}")]
    SdkInit { path: Option<PathBuf>, code: ReturnCode },

    #[error("Failed to list cameras: {code}")]
    Enumeration { code: ReturnCode },

    #[error("No cameras found")]
    NoCameras,

    #[error("Camera '{id}' not found among {available} enumerated cameras")]
    FilterMismatch { id: String, available: usize },

    #[error("Failed to open camera '{id}': {code}")]
    CameraOpen { id: String, code: ReturnCode },

    #[error("Cameras '{first}' and '{second}' share fingerprint {fingerprint}")]
    FingerprintCollision { fingerprint: Fingerprint, first: String, second: String },

    #[error("Failed to bind {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Transport failure: {reason}")]
    Transport {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ServerError {
    /// Returns whether restarting the server may clear this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServerError::SdkInit { .. } => false,
            ServerError::Enumeration { .. } => true,
            ServerError::NoCameras => true,
            ServerError::FilterMismatch { .. } => true,
            ServerError::CameraOpen { .. } => true,
            // the substitution table is re-randomized on every start
            ServerError::FingerprintCollision { .. } => true,
            ServerError::Bind { .. } => true,
            ServerError::Transport { .. } => true,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            ServerError::SdkInit { .. } => vec![
                "Check the hardware-interface search path (-d)",
                "Verify the transport layer files are installed",
                "Check permissions on the camera devices",
            ],
            ServerError::Enumeration { .. } => vec![
                "Check camera cabling and power",
                "Restart the server once the cameras are reachable",
            ],
            ServerError::NoCameras => vec![
                "Check camera cabling and power",
                "Verify the cameras are visible to the vendor viewer",
            ],
            ServerError::FilterMismatch { .. } => vec![
                "Check the camera id passed with -c",
                "Start without a filter to list the available ids",
            ],
            ServerError::CameraOpen { .. } => vec![
                "Close other applications holding the camera",
                "Power-cycle the camera",
            ],
            ServerError::FingerprintCollision { .. } => {
                vec!["Restart the server to draw a new fingerprint table"]
            }
            ServerError::Bind { .. } => vec![
                "Choose a different port with -p",
                "Stop the process already listening on the port",
            ],
            ServerError::Transport { .. } => {
                vec!["Check network connectivity", "Reconnect the client"]
            }
        }
    }

    /// Helper constructor for transport errors.
    pub fn transport(reason: impl Into<String>) -> Self {
        ServerError::Transport { reason: reason.into(), source: None }
    }

    /// Helper constructor for transport errors with source.
    pub fn transport_with_source(
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ServerError::Transport { reason: reason.into(), source: Some(Box::new(source)) }
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::transport_with_source("I/O error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
          #[test]
          fn messages_carry_their_context(
            id in "[A-Z_0-9]{1,24}",
            other in "[A-Z_0-9]{1,24}",
            fingerprint in any::<u32>(),
            code in -64i32..0
          ) {
            let open = ServerError::CameraOpen { id: id.clone(), code: ReturnCode(code) };
            prop_assert!(open.to_string().contains(&id));
            prop_assert!(open.to_string().contains(&code.to_string()));

            let collision = ServerError::FingerprintCollision {
              fingerprint: Fingerprint(fingerprint),
              first: id.clone(),
              second: other.clone(),
            };
            let msg = collision.to_string();
            prop_assert!(msg.contains(&fingerprint.to_string()));
            prop_assert!(msg.contains(&id));
            prop_assert!(msg.contains(&other));
          }

          #[test]
          fn transport_sources_are_chained(reason in ".*", base in ".*") {
            let source = std::io::Error::other(base.clone());
            let err = ServerError::transport_with_source(reason.clone(), source);
            let source = std::error::Error::source(&err).map(|s| s.to_string());
            prop_assert_eq!(source, Some(base));
            prop_assert!(err.to_string().contains(&reason));
          }
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<ServerError>();

        let error = ServerError::NoCameras;
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn recovery_methods_work() {
        let errors = [
            ServerError::SdkInit { path: None, code: ReturnCode::NO_TRANSPORT_LAYER },
            ServerError::NoCameras,
            ServerError::FingerprintCollision {
                fingerprint: Fingerprint(1),
                first: "a".into(),
                second: "b".into(),
            },
            ServerError::transport("closed"),
        ];

        assert!(!errors[0].is_retryable());
        assert!(errors[1].is_retryable());
        assert!(errors[2].is_retryable());

        for error in &errors {
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty());
            for suggestion in suggestions {
                assert!(suggestion.len() > 5);
            }
        }
    }

    #[test]
    fn io_errors_become_transport_errors() {
        let err: ServerError = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe").into();
        assert!(matches!(err, ServerError::Transport { source: Some(_), .. }));
    }
}
