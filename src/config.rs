//! Command-line configuration for the server binary

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::registry::DiscoveryOptions;
use crate::simulated::SimConfig;
use crate::watchdog::CaptureWatchdog;

pub const DEFAULT_PORT: u16 = 5555;

/// Lowest poll interval accepted; shorter values would spin the loop.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Camera control server.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "camserver",
    version,
    about = "Request/reply control server for machine-vision cameras"
)]
pub struct ServerArgs {
    /// Serve only the camera with this identity string
    #[arg(short = 'c', long = "camera-id")]
    pub camera_id: Option<String>,

    /// Minor number of the digital I/O device
    #[arg(short = 'a', long = "adio-minor", default_value_t = 0)]
    pub adio_minor: u32,

    /// TCP port to listen on
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT,
          value_parser = clap::value_parser!(u16).range(5000..=65535))]
    pub port: u16,

    /// Search path for camera transport-layer files
    #[arg(short = 'd', long = "cti-path")]
    pub cti_path: Option<PathBuf>,

    /// Address to bind
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Longest wait for a request before the capture watchdog runs
    #[arg(long = "poll-interval-ms", default_value_t = 1000)]
    pub poll_interval_ms: u64,

    /// Initial capture time limit in milliseconds (at least 1000)
    #[arg(long = "capture-limit-ms", default_value_t = 5000)]
    pub capture_limit_ms: u64,

    /// Number of simulated cameras
    #[arg(long = "sim-cameras", default_value_t = 2)]
    pub sim_cameras: usize,

    /// Frame rate of the simulated cameras; 0 disables frame generation
    #[arg(long = "sim-fps", default_value_t = 10.0, value_parser = parse_frame_rate)]
    pub sim_fps: f64,

    /// Fixed seed for camera fingerprints
    #[arg(long)]
    pub seed: Option<u64>,
}

fn parse_frame_rate(text: &str) -> Result<f64, String> {
    let fps: f64 = text.parse().map_err(|e| format!("{e}"))?;
    if fps.is_finite() && fps >= 0.0 {
        Ok(fps)
    } else {
        Err(format!("frame rate must be a finite, non-negative number, got {fps}"))
    }
}

/// Validated server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub poll_interval: Duration,
    pub watchdog: CaptureWatchdog,
    pub adio_minor: u32,
    pub discovery: DiscoveryOptions,
    pub simulator: SimConfig,
}

impl From<ServerArgs> for ServerConfig {
    fn from(args: ServerArgs) -> Self {
        Self {
            listen: SocketAddr::new(args.bind, args.port),
            poll_interval: Duration::from_millis(args.poll_interval_ms).max(MIN_POLL_INTERVAL),
            watchdog: CaptureWatchdog::new(Duration::from_millis(args.capture_limit_ms)),
            adio_minor: args.adio_minor,
            discovery: DiscoveryOptions {
                search_path: args.cti_path,
                camera_filter: args.camera_id,
                seed: args.seed,
            },
            simulator: SimConfig::with_cameras(args.sim_cameras).with_frame_rate(args.sim_fps),
        }
    }
}
