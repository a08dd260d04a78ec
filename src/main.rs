use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use camserver::simulated::{SimulatedDigitalIo, SimulatedSdk};
use camserver::{
    DigitalPort, Dispatcher, Server, ServerArgs, ServerConfig, SessionRegistry, TcpTransport,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("camserver=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::from(ServerArgs::parse());
    info!(listen = %config.listen, "Starting camera server");

    let port = DigitalPort::open_optional(SimulatedDigitalIo::open(config.adio_minor));
    let sdk = Arc::new(SimulatedSdk::new(config.simulator.clone()));
    let registry = match SessionRegistry::bootstrap(sdk, &config.discovery, port) {
        Ok(registry) => registry,
        Err(e) => {
            error!("{}", e);
            for suggestion in e.recovery_suggestions() {
                error!("  - {}", suggestion);
            }
            return Err(e).context("camera discovery failed");
        }
    };

    let transport = match TcpTransport::bind(config.listen).await {
        Ok(transport) => transport,
        Err(e) => {
            registry.shutdown();
            return Err(e).context("failed to start listener");
        }
    };
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt");
            on_signal.cancel();
        }
    });

    let dispatcher = Dispatcher::new(registry, config.watchdog);
    let stats = Server::new(dispatcher, transport, config.poll_interval).run(cancel).await;
    info!(
        requests = stats.requests,
        watchdog_stops = stats.watchdog_stops,
        "Camera server stopped"
    );
    Ok(())
}
