//! Core types shared by the server, the client and the hardware traits.
//!
//! ## Overview
//!
//! - [`NetPacket`] is the single record shape used for requests and replies
//! - [`CommandType`] names the command family in `cmd_type`
//! - [`CommandCode`] names the property addressed by `get`/`set`
//! - [`ReturnCode`] is the vendor status code space used for every `retcode`
//! - [`CameraIdentity`] and [`Fingerprint`] identify cameras
//! - [`FeatureValue`] and [`ValueKind`] carry typed feature values
//! - [`FrameEvent`] is what the SDK reports per delivered frame
//!
//! ## Usage Example
//!
//! ```rust
//! use camserver::types::{CommandCode, CommandType, Fingerprint, NetPacket, ReturnCode};
//!
//! let request = NetPacket::new(CommandType::Set)
//!     .with_camera(Fingerprint(3_141_592))
//!     .with_command(CommandCode::ExposureUs)
//!     .with_arguments(["2500"]);
//!
//! let text = request.encode().unwrap();
//! let decoded = NetPacket::decode(&text).unwrap();
//! assert_eq!(decoded.cam_id, "3141592");
//! assert_eq!(decoded.return_code(), ReturnCode::SUCCESS);
//! ```

mod command;
mod frame;
mod identity;
mod packet;
mod retcode;
mod value;

pub use command::{CommandCode, CommandType, UnknownCommand};
pub use frame::FrameEvent;
pub use identity::{CameraIdentity, Fingerprint};
pub use packet::NetPacket;
pub use retcode::ReturnCode;
pub use value::{FeatureValue, ValueKind, format_bool, format_float, parse_float, parse_int};
