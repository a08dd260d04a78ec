//! End-to-end tests: simulated hardware, real TCP, the library client.

use std::sync::Arc;
use std::time::Duration;

use camserver::dio::PULSE_PORT;
use camserver::simulated::{SimulatedDigitalIo, SimulatedSdk};
use camserver::{
    CameraClient, CaptureWatchdog, CommandCode, DigitalPort, DiscoveryOptions, Dispatcher,
    Fingerprint, NetPacket, ReturnCode, Server, ServerStats, SessionRegistry, TcpTransport,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct Harness {
    sdk: Arc<SimulatedSdk>,
    board: SimulatedDigitalIo,
    addr: std::net::SocketAddr,
    cancel: CancellationToken,
    server: JoinHandle<ServerStats>,
}

async fn start(cameras: usize, poll_interval: Duration) -> Harness {
    let _ = tracing_subscriber::fmt::try_init();

    let sdk = Arc::new(SimulatedSdk::with_cameras(cameras));
    let board = SimulatedDigitalIo::new();
    let port = DigitalPort::initialize(Box::new(board.clone()));
    let options = DiscoveryOptions { seed: Some(42), ..Default::default() };
    let registry = SessionRegistry::bootstrap(sdk.clone(), &options, Some(port)).unwrap();

    let transport = TcpTransport::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let addr = transport.local_addr();
    let cancel = CancellationToken::new();
    let dispatcher = Dispatcher::new(registry, CaptureWatchdog::default());
    let server = Server::new(dispatcher, transport, poll_interval);
    let server = tokio::spawn(server.run(cancel.clone()));
    Harness { sdk, board, addr, cancel, server }
}

async fn connect(harness: &Harness) -> CameraClient {
    CameraClient::connect(harness.addr).await.unwrap().with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn list_and_status_over_tcp() {
    let harness = start(3, Duration::from_millis(50)).await;
    let mut client = connect(&harness).await;

    let cameras = client.list().await.unwrap();
    assert_eq!(cameras.len(), 3);
    assert_eq!(client.list().await.unwrap(), cameras);

    let status = client.status(Some(cameras[0])).await.unwrap();
    assert_eq!(status.return_code(), ReturnCode::SUCCESS);
    assert_eq!(status.retargs.len(), 3);
    assert_eq!(status.retargs[0], "False");

    let all = client.status(None).await.unwrap();
    assert_eq!(all.retargs.len(), 15);
    let ids: Vec<_> = all.retargs.chunks(5).map(|row| row[1].clone()).collect();
    let expected: Vec<_> =
        harness.sdk.config().cameras.iter().map(|c| c.id_string.clone()).collect();
    assert_eq!(ids, expected);

    assert_eq!(client.quit().await.unwrap(), ReturnCode::SUCCESS);
    harness.server.await.unwrap();
}

#[tokio::test]
async fn capture_pulses_the_assigned_bit() {
    let harness = start(2, Duration::from_millis(50)).await;
    let mut client = connect(&harness).await;
    let cameras = client.list().await.unwrap();
    let id = harness.sdk.config().cameras[0].id_string.clone();

    let reply = client.set(cameras[0], CommandCode::DigitalBit, ["2"]).await.unwrap();
    assert_eq!(reply.retargs, vec!["2".to_string()]);

    assert_eq!(client.start_capture(Some(cameras[0])).await.unwrap(), ReturnCode::SUCCESS);
    assert_eq!(harness.sdk.deliver_frames(&id, 3), 3);
    assert!(harness.board.bit(PULSE_PORT, 2));

    let status = client.status(Some(cameras[0])).await.unwrap();
    assert_eq!(status.retargs[0], "True");

    assert_eq!(client.stop_capture(Some(cameras[0])).await.unwrap(), ReturnCode::SUCCESS);
    assert!(!harness.board.bit(PULSE_PORT, 2));
    assert!(!harness.sdk.is_capturing(&id));

    harness.cancel.cancel();
    harness.server.await.unwrap();
}

#[tokio::test]
async fn property_round_trip_reports_clamped_values() {
    let harness = start(1, Duration::from_millis(50)).await;
    let mut client = connect(&harness).await;
    let camera = client.list().await.unwrap()[0];

    let reply = client.set(camera, CommandCode::AcquisitionFramerate, ["1000"]).await.unwrap();
    assert_eq!(reply.retargs, vec!["200.000000".to_string()]);

    let reply = client.set(camera, CommandCode::ImageFormat, ["Mono12"]).await.unwrap();
    assert_eq!(reply.retargs, vec!["Mono12".to_string()]);

    let reply = client.set(camera, CommandCode::ImageFormat, ["Bayer"]).await.unwrap();
    assert_eq!(reply.return_code(), ReturnCode::INVALID_VALUE);

    let reply = client.get(camera, CommandCode::ImageFormats).await.unwrap();
    assert!(reply.retargs.contains(&"Mono12".to_string()));

    let reply = client.set(camera, CommandCode::ImageSize, ["100"]).await.unwrap();
    assert_eq!(reply.return_code(), ReturnCode::WRONG_TYPE);

    let reply = client.set(camera, CommandCode::ExposureUs, Vec::<String>::new()).await.unwrap();
    assert_eq!(reply.return_code(), ReturnCode::NO_DATA);

    harness.cancel.cancel();
    harness.server.await.unwrap();
}

#[tokio::test]
async fn unknown_camera_changes_nothing() {
    let harness = start(2, Duration::from_millis(50)).await;
    let mut client = connect(&harness).await;
    let cameras = client.list().await.unwrap();
    let missing = Fingerprint(cameras[0].value() ^ cameras[1].value() ^ 1);

    assert_eq!(client.start_capture(Some(missing)).await.unwrap(), ReturnCode::NOT_FOUND);
    for camera in &harness.sdk.config().cameras {
        assert!(!harness.sdk.is_capturing(&camera.id_string));
    }

    harness.cancel.cancel();
    harness.server.await.unwrap();
}

#[tokio::test]
async fn capture_limit_stops_runaway_captures() {
    let harness = start(1, Duration::from_millis(50)).await;
    let mut client = connect(&harness).await;
    let camera = client.list().await.unwrap()[0];
    let id = harness.sdk.config().cameras[0].id_string.clone();

    let reply = client.set(camera, CommandCode::CaptureTimeLimit, ["1000.0"]).await.unwrap();
    assert_eq!(reply.retargs, vec!["1000".to_string()]);

    assert_eq!(client.start_capture(None).await.unwrap(), ReturnCode::SUCCESS);
    assert!(harness.sdk.is_capturing(&id));

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!harness.sdk.is_capturing(&id));
    let status = client.status(Some(camera)).await.unwrap();
    assert_eq!(status.retargs[0], "False");

    harness.cancel.cancel();
    let stats = harness.server.await.unwrap();
    assert_eq!(stats.watchdog_stops, 1);
}

#[tokio::test]
async fn malformed_lines_get_bad_parameter() {
    let harness = start(1, Duration::from_millis(50)).await;
    let stream = TcpStream::connect(harness.addr).await.unwrap();
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();

    write.write_all(b"this is not json\n").await.unwrap();
    let reply = NetPacket::decode(&lines.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(reply.return_code(), ReturnCode::BAD_PARAMETER);

    write.write_all(b"{\"cmd_type\":\"list\"}\n").await.unwrap();
    let reply = NetPacket::decode(&lines.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(reply.return_code(), ReturnCode::SUCCESS);
    assert_eq!(reply.retargs.len(), 1);

    harness.cancel.cancel();
    harness.server.await.unwrap();
}

#[tokio::test]
async fn clients_are_served_in_turn() {
    let harness = start(2, Duration::from_millis(50)).await;
    let mut handles = Vec::new();
    for _ in 0..4 {
        let mut client = connect(&harness).await;
        handles.push(tokio::spawn(async move {
            let mut seen = Vec::new();
            for _ in 0..10 {
                seen.push(client.list().await.unwrap());
            }
            seen
        }));
    }
    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.await.unwrap());
    }
    assert!(all.windows(2).all(|pair| pair[0] == pair[1]));

    harness.cancel.cancel();
    let stats = harness.server.await.unwrap();
    assert_eq!(stats.requests, 40);
}

#[tokio::test]
async fn shutdown_releases_cameras() {
    let harness = start(2, Duration::from_millis(50)).await;
    let mut client = connect(&harness).await;
    assert_eq!(client.start_capture(None).await.unwrap(), ReturnCode::SUCCESS);

    harness.cancel.cancel();
    harness.server.await.unwrap();
    for camera in &harness.sdk.config().cameras {
        assert!(!harness.sdk.is_open(&camera.id_string));
    }
}
