//! Request/reply control server for a fleet of machine-vision cameras.
//!
//! Clients address cameras by a process-local fingerprint and ask the server
//! to list cameras, report status, start and stop captures, and read or write
//! camera properties. A digital-I/O board can emit one pulse per frame on a
//! bit bound to each camera.
//!
//! # Architecture
//!
//! - [`SessionRegistry`] owns one [`CameraSession`] per discovered camera
//! - [`Dispatcher`] turns a [`NetPacket`] request into a reply, using the
//!   [`property`] table for generic get/set
//! - [`CaptureWatchdog`] stops captures that run past the time limit
//! - [`Server`] drives the dispatcher from a [`Transport`] until shutdown
//! - Hardware sits behind [`CameraSdk`] and [`DigitalIo`]; the [`simulated`]
//!   module implements both
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use camserver::simulated::SimulatedSdk;
//! use camserver::{
//!     CaptureWatchdog, DiscoveryOptions, Dispatcher, Server, SessionRegistry, TcpTransport,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> camserver::Result<()> {
//!     let sdk = Arc::new(SimulatedSdk::with_cameras(2));
//!     let registry = SessionRegistry::bootstrap(sdk, &DiscoveryOptions::default(), None)?;
//!     let transport = TcpTransport::bind("127.0.0.1:5555".parse().unwrap()).await?;
//!     let dispatcher = Dispatcher::new(registry, CaptureWatchdog::default());
//!
//!     let server = Server::new(dispatcher, transport, Duration::from_secs(1));
//!     let stats = server.run(CancellationToken::new()).await;
//!     println!("served {} requests", stats.requests);
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
pub mod hasher;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Hardware seams
pub mod dio;
pub mod sdk;
pub mod simulated;

// Camera state and request handling
pub mod dispatch;
pub mod property;
pub mod registry;
pub mod session;
pub mod watchdog;

// Serving
pub mod client;
pub mod config;
pub mod server;
pub mod transport;

pub use error::*;
pub use types::*;

pub use client::CameraClient;
pub use config::{ServerArgs, ServerConfig};
pub use dio::{DigitalIo, DigitalPort, DioError};
pub use dispatch::{Dispatcher, Outcome};
pub use hasher::IdentityHasher;
pub use registry::{DiscoveryOptions, SessionRegistry};
pub use sdk::{CameraHandle, CameraSdk, FrameSink};
pub use server::{Server, ServerStats};
pub use session::CameraSession;
pub use transport::{RequestQueue, RequestSender, TcpTransport, Transport};
pub use watchdog::CaptureWatchdog;
