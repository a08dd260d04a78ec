//! Command-line client for the camera server

use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use camserver::{CameraClient, CommandCode, Fingerprint, NetPacket, ReturnCode};

#[derive(Parser, Debug)]
#[command(name = "camctl", version, about = "Control a camera server")]
struct Cli {
    #[arg(long, default_value = "localhost")]
    host: String,

    #[arg(short = 'p', long, default_value_t = 5555)]
    port: u16,

    /// Reply timeout in milliseconds
    #[arg(long = "timeout-ms", default_value_t = 1000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List camera fingerprints
    List,
    /// Show capture state and temperature
    Status { camera: Option<Fingerprint> },
    /// Start capture on one camera, or all when omitted
    Start { camera: Option<Fingerprint> },
    /// Stop capture on one camera, or all when omitted
    Stop { camera: Option<Fingerprint> },
    /// Read a property, e.g. `exposure_us`
    Get { camera: Fingerprint, property: String },
    /// Write a property
    Set {
        camera: Fingerprint,
        property: String,
        #[arg(required = true, allow_hyphen_values = true)]
        values: Vec<String>,
    },
    /// List property names and codes
    Properties,
    /// Shut the server down
    Quit,
}

fn property(name: &str) -> anyhow::Result<CommandCode> {
    if let Some(code) = CommandCode::from_name(name) {
        return Ok(code);
    }
    match name.parse::<i32>().ok().and_then(CommandCode::from_code) {
        Some(code) => Ok(code),
        None => bail!("unknown property '{name}' (see `camctl properties`)"),
    }
}

fn print_reply(reply: &NetPacket) -> anyhow::Result<()> {
    for value in &reply.retargs {
        println!("{value}");
    }
    report(reply.return_code())
}

fn report(code: ReturnCode) -> anyhow::Result<()> {
    if code.is_success() { Ok(()) } else { bail!("server replied {code}") }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    if let Command::Properties = cli.command {
        for code in CommandCode::ALL {
            println!("{:>4}  {}", code.code(), code.name());
        }
        return Ok(());
    }

    let mut client = CameraClient::connect((cli.host.as_str(), cli.port))
        .await
        .with_context(|| format!("failed to connect to {}:{}", cli.host, cli.port))?
        .with_timeout(Duration::from_millis(cli.timeout_ms));

    match cli.command {
        Command::List => {
            for fingerprint in client.list().await? {
                println!("{fingerprint}");
            }
            Ok(())
        }
        Command::Status { camera } => print_reply(&client.status(camera).await?),
        Command::Start { camera } => report(client.start_capture(camera).await?),
        Command::Stop { camera } => report(client.stop_capture(camera).await?),
        Command::Get { camera, property: name } => {
            print_reply(&client.get(camera, property(&name)?).await?)
        }
        Command::Set { camera, property: name, values } => {
            print_reply(&client.set(camera, property(&name)?, values).await?)
        }
        Command::Properties => Ok(()),
        Command::Quit => report(client.quit().await?),
    }
}
