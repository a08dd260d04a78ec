//! Fixtures shared by unit tests and benchmarks
//!
//! Everything here runs against the simulated hardware and uses a fixed
//! fingerprint seed, so repeated runs see the same routing keys.

#![cfg(any(test, feature = "benchmark"))]

use std::sync::Arc;

use crate::dispatch::Dispatcher;
use crate::registry::{DiscoveryOptions, SessionRegistry};
use crate::simulated::SimulatedSdk;
use crate::types::{CommandCode, CommandType, Fingerprint, NetPacket};
use crate::watchdog::CaptureWatchdog;

/// Seed used for every fixture registry.
pub const FIXTURE_SEED: u64 = 0x5EED;

/// A registry of `cameras` opened simulated cameras.
///
/// # Panics
///
/// Panics if bootstrap fails, which for the simulator means `cameras == 0`.
pub fn simulated_registry(cameras: usize) -> (Arc<SimulatedSdk>, SessionRegistry) {
    let sdk = Arc::new(SimulatedSdk::with_cameras(cameras));
    let options = DiscoveryOptions { seed: Some(FIXTURE_SEED), ..Default::default() };
    let registry =
        SessionRegistry::bootstrap(sdk.clone(), &options, None).expect("simulated bootstrap");
    (sdk, registry)
}

/// A dispatcher over [`simulated_registry`] with the default capture limit.
pub fn simulated_dispatcher(cameras: usize) -> (Arc<SimulatedSdk>, Dispatcher) {
    let (sdk, registry) = simulated_registry(cameras);
    (sdk, Dispatcher::new(registry, CaptureWatchdog::default()))
}

pub fn request(cmd: CommandType) -> NetPacket {
    NetPacket::new(cmd)
}

pub fn get(camera: Fingerprint, code: CommandCode) -> NetPacket {
    NetPacket::new(CommandType::Get).with_camera(camera).with_command(code)
}

pub fn set<I, S>(camera: Fingerprint, code: CommandCode, arguments: I) -> NetPacket
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    NetPacket::new(CommandType::Set)
        .with_camera(camera)
        .with_command(code)
        .with_arguments(arguments)
}
