//! End-to-end session tests against a scripted mock reader
//!
//! The mock listens on loopback, speaks real LLRP frames through the
//! same codec, and follows a small behavior script per test: answer the
//! handshake, respond to commands, emit reports (optionally split at
//! arbitrary byte boundaries), and send keepalives that eventually stop.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use llrprust::{
    ConnectionState, Error, Reader, ReaderEvent, RequestedCapabilities, RoSpec, RoSpecState,
};
use llrprust_core::capabilities::{GeneralDeviceCapabilities, ReaderCapabilities};
use llrprust_core::events::{ConnectionAttemptStatus, ReaderEventNotificationData, Timestamp};
use llrprust_core::lifecycle::LifecycleError;
use llrprust_core::message::{Message, MessageBody};
use llrprust_core::report::TagReportData;
use llrprust_core::status::LlrpStatus;

#[derive(Clone, Default)]
struct MockBehavior {
    /// Deliver every frame in two fragments to exercise reassembly
    split_writes: bool,
    /// Refuse the connection in the handshake notification
    refuse_connection: bool,
    /// Emit a canned tag report after START_ROSPEC succeeds
    report_on_start: bool,
    /// Send this many keepalives after keepalive config, then go silent
    keepalive_count: usize,
    keepalive_period: Duration,
    /// Count KEEPALIVE_ACKs arriving from the client
    ack_counter: Option<Arc<AtomicUsize>>,
    /// Never answer GET_READER_CAPABILITIES (leaves the caller pending)
    ignore_capability_requests: bool,
}

async fn send_frame(writer: &Arc<tokio::sync::Mutex<OwnedWriteHalf>>, frame: &[u8], split: bool) {
    let mut w = writer.lock().await;
    if split && frame.len() > 3 {
        let mid = frame.len() / 2;
        w.write_all(&frame[..mid]).await.unwrap();
        w.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
        w.write_all(&frame[mid..]).await.unwrap();
    } else {
        w.write_all(frame).await.unwrap();
    }
    w.flush().await.unwrap();
}

async fn read_message(socket: &mut OwnedReadHalf, buf: &mut BytesMut) -> Option<Message> {
    loop {
        if let Some(message) = Message::decode(buf).unwrap() {
            return Some(message);
        }
        let mut chunk = [0u8; 1024];
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn canned_capabilities() -> ReaderCapabilities {
    ReaderCapabilities {
        general: Some(GeneralDeviceCapabilities {
            max_antennas: 4,
            can_set_antenna_properties: false,
            has_utc_clock: true,
            manufacturer_name: "Bluebird".into(),
            model_name: "FR900".into(),
            firmware_version: "2.1.3".into(),
        }),
        ..Default::default()
    }
}

fn canned_tag_report() -> TagReportData {
    let mut tag = TagReportData::new(
        hex_bytes("8504700013684D573243363207702205"),
    );
    tag.antenna_id = Some(2);
    tag.peak_rssi = Some(-77);
    tag
}

fn hex_bytes(s: &str) -> Vec<u8> {
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

/// Accept one connection and run the behavior script until the client
/// disconnects
async fn run_mock_reader(listener: TcpListener, behavior: MockBehavior) {
    let (socket, _) = listener.accept().await.unwrap();
    let (mut read_half, write_half) = socket.into_split();
    let writer = Arc::new(tokio::sync::Mutex::new(write_half));

    let hello_status = if behavior.refuse_connection {
        ConnectionAttemptStatus::FailedClientInitiatedConnectionExists
    } else {
        ConnectionAttemptStatus::Success
    };
    let mut hello = ReaderEventNotificationData::new(Timestamp::Uptime(1));
    hello.connection_attempt = Some(hello_status);
    let frame = Message::new(0, MessageBody::ReaderEventNotification { data: hello }).encode();
    send_frame(&writer, &frame, behavior.split_writes).await;

    let mut buf = BytesMut::new();
    while let Some(message) = read_message(&mut read_half, &mut buf).await {
        let id = message.message_id;
        let reply = |body: MessageBody| Message::new(id, body).encode();

        match message.body {
            MessageBody::GetReaderCapabilities { .. } => {
                if behavior.ignore_capability_requests {
                    continue;
                }
                let frame = reply(MessageBody::GetReaderCapabilitiesResponse {
                    status: LlrpStatus::success(),
                    capabilities: canned_capabilities(),
                });
                send_frame(&writer, &frame, behavior.split_writes).await;
            }
            MessageBody::SetReaderConfig { config } => {
                let frame = reply(MessageBody::SetReaderConfigResponse {
                    status: LlrpStatus::success(),
                });
                send_frame(&writer, &frame, behavior.split_writes).await;

                if config.keepalive.is_some() && behavior.keepalive_count > 0 {
                    let writer = Arc::clone(&writer);
                    let count = behavior.keepalive_count;
                    let period = behavior.keepalive_period;
                    let split = behavior.split_writes;
                    tokio::spawn(async move {
                        for i in 0..count {
                            tokio::time::sleep(period).await;
                            let ka =
                                Message::new(0x8000 + i as u32, MessageBody::Keepalive).encode();
                            send_frame(&writer, &ka, split).await;
                        }
                        // Then silence; the client watchdog should trip
                    });
                }
            }
            MessageBody::AddRoSpec { .. } => {
                let frame = reply(MessageBody::AddRoSpecResponse {
                    status: LlrpStatus::success(),
                });
                send_frame(&writer, &frame, behavior.split_writes).await;
            }
            MessageBody::EnableRoSpec { .. } => {
                let frame = reply(MessageBody::EnableRoSpecResponse {
                    status: LlrpStatus::success(),
                });
                send_frame(&writer, &frame, behavior.split_writes).await;
            }
            MessageBody::StartRoSpec { .. } => {
                let frame = reply(MessageBody::StartRoSpecResponse {
                    status: LlrpStatus::success(),
                });
                send_frame(&writer, &frame, behavior.split_writes).await;

                if behavior.report_on_start {
                    let frame = Message::new(0, MessageBody::RoAccessReport {
                        tag_reports: vec![canned_tag_report()],
                    })
                    .encode();
                    send_frame(&writer, &frame, behavior.split_writes).await;
                }
            }
            MessageBody::StopRoSpec { .. } => {
                let frame = reply(MessageBody::StopRoSpecResponse {
                    status: LlrpStatus::success(),
                });
                send_frame(&writer, &frame, behavior.split_writes).await;
            }
            MessageBody::DeleteRoSpec { .. } => {
                let frame = reply(MessageBody::DeleteRoSpecResponse {
                    status: LlrpStatus::success(),
                });
                send_frame(&writer, &frame, behavior.split_writes).await;
            }
            MessageBody::KeepaliveAck => {
                if let Some(counter) = &behavior.ack_counter {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            }
            MessageBody::CloseConnection => {
                let frame = reply(MessageBody::CloseConnectionResponse {
                    status: LlrpStatus::success(),
                });
                send_frame(&writer, &frame, behavior.split_writes).await;
                return;
            }
            other => panic!("mock reader got unexpected message: {other:?}"),
        }
    }
}

async fn start_mock(behavior: MockBehavior) -> (String, u16, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(run_mock_reader(listener, behavior));
    (addr.ip().to_string(), addr.port(), handle)
}

#[tokio::test]
async fn connect_handshake_and_capabilities() {
    let (host, port, mock) = start_mock(MockBehavior::default()).await;

    let mut reader = Reader::new(host, port);
    reader.connect().await.unwrap();
    assert_eq!(reader.state(), ConnectionState::Operational);

    let caps = reader.get_capabilities(RequestedCapabilities::All).await.unwrap();
    let general = caps.general.expect("general capabilities requested");
    assert_eq!(general.model_name, "FR900");
    assert_eq!(general.max_antennas, 4);
    // Groups the mock did not include stay absent
    assert!(caps.regulatory.is_none());

    reader.close().await.unwrap();
    assert_eq!(reader.state(), ConnectionState::Closed);

    mock.await.unwrap();
}

#[tokio::test]
async fn refused_handshake_surfaces_status() {
    let (host, port, _mock) = start_mock(MockBehavior {
        refuse_connection: true,
        ..Default::default()
    })
    .await;

    let mut reader = Reader::new(host, port);
    let result = reader.connect().await;

    match result {
        Err(Error::HandshakeRefused { status }) => assert_eq!(status, 2),
        other => panic!("expected handshake refusal, got {other:?}"),
    }
    assert_eq!(reader.state(), ConnectionState::Error);
}

#[tokio::test]
async fn rospec_lifecycle_with_state_validation() {
    let (host, port, mock) = start_mock(MockBehavior::default()).await;

    let mut reader = Reader::new(host, port);
    reader.connect().await.unwrap();

    reader
        .add_rospec(RoSpec::immediate_inventory(0x04D2, vec![1]))
        .await
        .unwrap();
    assert_eq!(reader.rospec_state(0x04D2), Some(RoSpecState::Disabled));

    // Start while Disabled is rejected locally; nothing reaches the wire
    // and the registry is unchanged
    match reader.start_rospec(0x04D2).await {
        Err(Error::Lifecycle(LifecycleError::InvalidRoSpecState {
            id: 0x04D2,
            state: RoSpecState::Disabled,
            action: "Start",
        })) => {}
        other => panic!("expected InvalidState, got {other:?}"),
    }
    assert_eq!(reader.rospec_state(0x04D2), Some(RoSpecState::Disabled));

    reader.enable_rospec(0x04D2).await.unwrap();
    reader.start_rospec(0x04D2).await.unwrap();
    assert_eq!(reader.rospec_state(0x04D2), Some(RoSpecState::Active));

    // Start while already Active is rejected too
    match reader.start_rospec(0x04D2).await {
        Err(Error::Lifecycle(LifecycleError::InvalidRoSpecState {
            state: RoSpecState::Active,
            ..
        })) => {}
        other => panic!("expected InvalidState, got {other:?}"),
    }

    // Commands for unknown ids fail with the spec-not-found class
    match reader.enable_rospec(0xBEEF).await {
        Err(Error::Lifecycle(LifecycleError::RoSpecNotFound(0xBEEF))) => {}
        other => panic!("expected RoSpecNotFound, got {other:?}"),
    }

    reader.stop_rospec(0x04D2).await.unwrap();
    reader.delete_rospec(0x04D2).await.unwrap();
    assert_eq!(reader.rospec_state(0x04D2), None);

    reader.close().await.unwrap();
    mock.await.unwrap();
}

#[tokio::test]
async fn tag_reports_arrive_across_split_frames() {
    let (host, port, mock) = start_mock(MockBehavior {
        split_writes: true,
        report_on_start: true,
        ..Default::default()
    })
    .await;

    let mut reader = Reader::new(host, port);
    reader.connect().await.unwrap();

    let mut tags = reader.tag_reports();

    reader.add_rospec(RoSpec::immediate_inventory(1, vec![0])).await.unwrap();
    reader.enable_rospec(1).await.unwrap();
    reader.start_rospec(1).await.unwrap();

    let tag = tokio::time::timeout(Duration::from_secs(2), tags.recv())
        .await
        .expect("report should arrive")
        .unwrap();

    assert_eq!(tag.epc_hex(), "8504700013684D573243363207702205");
    assert_eq!(tag.antenna_id, Some(2));
    assert_eq!(tag.peak_rssi, Some(-77));
    // Fields the reader did not include stay absent, never zero-valued
    assert_eq!(tag.pc_bits, None);
    assert_eq!(tag.seen_count, None);
    assert_eq!(tag.first_seen_utc, None);
    assert_eq!(tag.last_seen_utc, None);

    reader.close().await.unwrap();
    mock.await.unwrap();
}

#[tokio::test]
async fn keepalive_acks_then_loss_detection() {
    let acks = Arc::new(AtomicUsize::new(0));
    let (host, port, _mock) = start_mock(MockBehavior {
        keepalive_count: 2,
        keepalive_period: Duration::from_millis(50),
        ack_counter: Some(Arc::clone(&acks)),
        ignore_capability_requests: true,
        ..Default::default()
    })
    .await;

    let mut reader = Reader::new(host, port)
        .with_timeout(Duration::from_secs(5))
        .with_keepalive_grace(Duration::from_millis(40));
    reader.connect().await.unwrap();

    let mut events = reader.events();
    reader.enable_keepalive(Duration::from_millis(50)).await.unwrap();

    // Both keepalives get acknowledged while the link is alive
    tokio::time::sleep(Duration::from_millis(130)).await;
    assert!(acks.load(Ordering::SeqCst) >= 1, "keepalives were not acknowledged");

    // The mock has gone silent; a pending command must fail when the
    // watchdog declares the connection lost, not hang for the full
    // command timeout
    let started = std::time::Instant::now();
    let result = reader.get_capabilities(RequestedCapabilities::All).await;
    match result {
        Err(Error::ConnectionLost) => {}
        other => panic!("expected ConnectionLost, got {other:?}"),
    }
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "pending command hung past the keepalive window"
    );

    assert_eq!(reader.state(), ConnectionState::Error);

    // Observers are told
    let event = tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            match events.recv().await {
                Ok(ReaderEvent::ConnectionLost) => return ReaderEvent::ConnectionLost,
                Ok(_) => continue,
                Err(e) => panic!("event stream closed early: {e}"),
            }
        }
    })
    .await
    .expect("ConnectionLost event should be published");
    assert_eq!(event, ReaderEvent::ConnectionLost);

    // Further commands fail fast
    assert!(matches!(
        reader.get_capabilities(RequestedCapabilities::All).await,
        Err(Error::ConnectionLost)
    ));
}
