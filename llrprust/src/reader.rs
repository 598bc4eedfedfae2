//! High-level reader interface
//!
//! One [`Reader`] owns one LLRP connection. A dedicated receive task
//! continuously decodes the inbound byte stream and dispatches each
//! message: keepalives are answered inline, tag reports and reader
//! events go to broadcast observers, and everything else resolves the
//! pending request with the matching message id. Outbound frames are
//! serialized through a single writer so no two frames interleave.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use parking_lot::Mutex;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use llrprust_core::access::{AccessSpec, AccessSpecState};
use llrprust_core::capabilities::{ReaderCapabilities, RequestedCapabilities};
use llrprust_core::config::{ConfigRequest, KeepaliveSpec, ReaderConfig};
use llrprust_core::events::{ReaderEventNotificationData, RoSpecEventKind};
use llrprust_core::lifecycle::{AccessSpecRegistry, LifecycleError, RoSpecRegistry};
use llrprust_core::message::{Message, MessageBody};
use llrprust_core::report::TagReportData;
use llrprust_core::rospec::{RoSpec, RoSpecState};
use llrprust_core::session::{ConnectionState, Session};
use llrprust_transport::{LinkReader, LinkWriter, TcpTransport, Transport};
use llrprust_types::ReaderEvent;

use crate::error::{Error, Result};

/// LLRP reader client
///
/// # Examples
///
/// ```no_run
/// use llrprust::{Reader, RoSpec};
///
/// #[tokio::main]
/// async fn main() -> llrprust::Result<()> {
///     let mut reader = Reader::new("192.168.1.50", 5084);
///     reader.connect().await?;
///
///     let mut tags = reader.tag_reports();
///
///     reader.add_rospec(RoSpec::immediate_inventory(1, vec![0])).await?;
///     reader.enable_rospec(1).await?;
///     reader.start_rospec(1).await?;
///
///     while let Ok(tag) = tags.recv().await {
///         println!("{} at {:?} dBm", tag.epc_hex(), tag.peak_rssi);
///     }
///
///     reader.close().await?;
///     Ok(())
/// }
/// ```
pub struct Reader {
    transport: Box<dyn Transport>,
    command_timeout: Duration,
    keepalive_grace: Duration,
    shared: Arc<Shared>,
    tasks: Vec<JoinHandle<()>>,
}

struct Shared {
    session: Session,
    pending: Mutex<HashMap<u32, oneshot::Sender<Message>>>,
    writer: tokio::sync::Mutex<Option<Box<dyn LinkWriter>>>,
    reports: broadcast::Sender<TagReportData>,
    events: broadcast::Sender<ReaderEvent>,
    rospecs: Mutex<RoSpecRegistry>,
    access_specs: Mutex<AccessSpecRegistry>,
    keepalive_period: Mutex<Option<Duration>>,
}

impl Shared {
    /// Fail every waiter still pending; their callers observe the closed
    /// channel as `ConnectionLost`
    fn fail_pending(&self) {
        let mut pending = self.pending.lock();
        let count = pending.len();
        pending.clear();
        if count > 0 {
            debug!(count, "failed pending requests");
        }
    }

    /// One-shot teardown on fatal failure
    fn fail_connection(&self, reason: &str) {
        if self.session.fail() {
            warn!(reason, "connection failed");
            self.fail_pending();
            let _ = self.events.send(ReaderEvent::ConnectionLost);
        }
    }
}

impl Reader {
    /// Create a reader client for the given host and port (TCP)
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_transport(Box::new(TcpTransport::new(host, port)))
    }

    /// Create a reader client over a custom transport
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        let (reports, _) = broadcast::channel(256);
        let (events, _) = broadcast::channel(64);

        Self {
            transport,
            command_timeout: Duration::from_secs(5),
            keepalive_grace: Duration::from_secs(1),
            shared: Arc::new(Shared {
                session: Session::new(),
                pending: Mutex::new(HashMap::new()),
                writer: tokio::sync::Mutex::new(None),
                reports,
                events,
                rospecs: Mutex::new(RoSpecRegistry::new()),
                access_specs: Mutex::new(AccessSpecRegistry::new()),
                keepalive_period: Mutex::new(None),
            }),
            tasks: Vec::new(),
        }
    }

    /// Set the per-command timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the margin past the keepalive period before the session is
    /// declared lost
    pub fn with_keepalive_grace(mut self, grace: Duration) -> Self {
        self.keepalive_grace = grace;
        self
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.shared.session.state()
    }

    pub fn is_operational(&self) -> bool {
        self.shared.session.is_operational()
    }

    /// Subscribe to decoded tag reports
    ///
    /// The channel never blocks the receive path; a subscriber that
    /// falls behind loses the oldest reports and observes a lag error.
    pub fn tag_reports(&self) -> broadcast::Receiver<TagReportData> {
        self.shared.reports.subscribe()
    }

    /// Subscribe to reader and connection events
    pub fn events(&self) -> broadcast::Receiver<ReaderEvent> {
        self.shared.events.subscribe()
    }

    /// State of a tracked ROSpec
    pub fn rospec_state(&self, rospec_id: u32) -> Option<RoSpecState> {
        self.shared.rospecs.lock().state(rospec_id)
    }

    /// State of a tracked AccessSpec
    pub fn access_spec_state(&self, access_spec_id: u32) -> Option<AccessSpecState> {
        self.shared.access_specs.lock().state(access_spec_id)
    }

    /// Connect to the reader
    ///
    /// Establishes the TCP link, starts the receive path, and waits for
    /// the unsolicited ReaderEventNotification carrying a successful
    /// ConnectionAttemptEvent. Commands are rejected until that event
    /// arrives.
    pub async fn connect(&mut self) -> Result<()> {
        info!("Connecting to {}...", self.transport.remote_addr());

        // Subscribe before the receive path starts so the handshake event
        // cannot be missed
        let mut events_rx = self.shared.events.subscribe();

        let link = match self.transport.connect().await {
            Ok(link) => link,
            Err(e) => {
                self.shared.session.fail();
                return Err(e.into());
            }
        };

        self.shared.session.socket_connected()?;
        *self.shared.writer.lock().await = Some(link.writer);

        let shared = Arc::clone(&self.shared);
        self.tasks.push(tokio::spawn(receive_loop(shared, link.reader)));

        let shared = Arc::clone(&self.shared);
        let grace = self.keepalive_grace;
        self.tasks.push(tokio::spawn(keepalive_watchdog(shared, grace)));

        let handshake = tokio::time::timeout(self.command_timeout, async {
            loop {
                match events_rx.recv().await {
                    Ok(ReaderEvent::ConnectionAttempt { status }) => return Some(status),
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
        .await;

        match handshake {
            Ok(Some(0)) => {
                self.shared.session.operational()?;
                info!("Reader at {} is operational", self.transport.remote_addr());
                Ok(())
            }
            Ok(Some(status)) => {
                self.shared.fail_connection("reader refused connection");
                Err(Error::HandshakeRefused { status })
            }
            Ok(None) => Err(Error::ConnectionLost),
            Err(_) => {
                self.shared.fail_connection("no connection event from reader");
                Err(Error::Timeout { seconds: self.command_timeout.as_secs() })
            }
        }
    }

    /// Close the connection
    ///
    /// Two-phase shutdown: send CLOSE_CONNECTION, wait up to the command
    /// timeout for the response, then force-close the transport
    /// regardless.
    pub async fn close(&mut self) -> Result<()> {
        if self.shared.session.state().is_terminal() {
            return Ok(());
        }

        info!("Closing connection to {}...", self.transport.remote_addr());
        self.shared.session.begin_close()?;

        match self.request(MessageBody::CloseConnection).await {
            Ok(response) => {
                if let Err(e) = check_status(&response) {
                    warn!("CLOSE_CONNECTION rejected: {}", e);
                }
            }
            Err(e) => warn!("No CLOSE_CONNECTION response: {}", e),
        }

        if let Some(mut writer) = self.shared.writer.lock().await.take() {
            let _ = writer.shutdown().await;
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.shared.fail_pending();
        let _ = self.shared.session.closed();

        info!("Connection closed");
        Ok(())
    }

    /// Fetch the requested capability groups
    pub async fn get_capabilities(
        &self,
        requested: RequestedCapabilities,
    ) -> Result<ReaderCapabilities> {
        let response = self
            .request(MessageBody::GetReaderCapabilities { requested })
            .await?;
        check_status(&response)?;
        match response.body {
            MessageBody::GetReaderCapabilitiesResponse { capabilities, .. } => Ok(capabilities),
            other => Err(Error::UnexpectedResponse {
                message_type: other.message_type(),
            }),
        }
    }

    /// Fetch the requested configuration groups
    ///
    /// `antenna_id` 0 selects all antennas; an empty request selects
    /// every group the reader supports.
    pub async fn get_config(
        &self,
        antenna_id: u16,
        requested: ConfigRequest,
    ) -> Result<ReaderConfig> {
        let response = self
            .request(MessageBody::GetReaderConfig { antenna_id, requested })
            .await?;
        check_status(&response)?;
        match response.body {
            MessageBody::GetReaderConfigResponse { config, .. } => Ok(config),
            other => Err(Error::UnexpectedResponse {
                message_type: other.message_type(),
            }),
        }
    }

    /// Apply a partial configuration
    ///
    /// Only the pieces present in `config` change on the reader; the
    /// restore-factory-defaults flag supersedes everything else in the
    /// same call.
    pub async fn set_config(&self, config: ReaderConfig) -> Result<()> {
        let response = self.request(MessageBody::SetReaderConfig { config }).await?;
        check_status(&response)
    }

    /// Ask the reader to send keepalives and arm the liveness watchdog
    ///
    /// Missing keepalives for `period` plus the configured grace margin
    /// fails the session with `ConnectionLost`.
    pub async fn enable_keepalive(&self, period: Duration) -> Result<()> {
        let spec = KeepaliveSpec::periodic(period.as_millis() as u32);
        self.set_config(ReaderConfig::new().with_keepalive(spec)).await?;

        // Arm the window from now; the first keepalive refreshes it
        self.shared.session.touch_keepalive();
        *self.shared.keepalive_period.lock() = Some(period);

        debug!(period_ms = period.as_millis() as u64, "keepalive enabled");
        Ok(())
    }

    /// Add a ROSpec; it starts out Disabled
    pub async fn add_rospec(&self, rospec: RoSpec) -> Result<()> {
        {
            let registry = self.shared.rospecs.lock();
            if rospec.rospec_id == 0 {
                return Err(LifecycleError::ReservedId.into());
            }
            if registry.get(rospec.rospec_id).is_some() {
                return Err(LifecycleError::DuplicateId(rospec.rospec_id).into());
            }
        }

        let response = self
            .request(MessageBody::AddRoSpec { rospec: rospec.clone() })
            .await?;
        check_status(&response)?;

        self.shared.rospecs.lock().add(&rospec)?;
        debug!(rospec_id = rospec.rospec_id, "ROSpec added");
        Ok(())
    }

    /// Enable a ROSpec: `Disabled -> Inactive`
    pub async fn enable_rospec(&self, rospec_id: u32) -> Result<()> {
        self.ensure_rospec_state(rospec_id, RoSpecState::Disabled, "Enable")?;
        let response = self.request(MessageBody::EnableRoSpec { rospec_id }).await?;
        check_status(&response)?;
        self.shared.rospecs.lock().enable(rospec_id)?;
        Ok(())
    }

    /// Disable a ROSpec: `Inactive -> Disabled`
    pub async fn disable_rospec(&self, rospec_id: u32) -> Result<()> {
        self.ensure_rospec_state(rospec_id, RoSpecState::Inactive, "Disable")?;
        let response = self.request(MessageBody::DisableRoSpec { rospec_id }).await?;
        check_status(&response)?;
        self.shared.rospecs.lock().disable(rospec_id)?;
        Ok(())
    }

    /// Start a ROSpec: `Inactive -> Active`
    pub async fn start_rospec(&self, rospec_id: u32) -> Result<()> {
        self.ensure_rospec_state(rospec_id, RoSpecState::Inactive, "Start")?;
        let response = self.request(MessageBody::StartRoSpec { rospec_id }).await?;
        check_status(&response)?;
        self.shared.rospecs.lock().start(rospec_id)?;
        Ok(())
    }

    /// Stop a ROSpec: `Active -> Inactive`
    pub async fn stop_rospec(&self, rospec_id: u32) -> Result<()> {
        self.ensure_rospec_state(rospec_id, RoSpecState::Active, "Stop")?;
        let response = self.request(MessageBody::StopRoSpec { rospec_id }).await?;
        check_status(&response)?;
        self.shared.rospecs.lock().stop(rospec_id)?;
        Ok(())
    }

    /// Delete a ROSpec from any state; id 0 deletes all
    pub async fn delete_rospec(&self, rospec_id: u32) -> Result<()> {
        if rospec_id != 0 && self.shared.rospecs.lock().get(rospec_id).is_none() {
            return Err(LifecycleError::RoSpecNotFound(rospec_id).into());
        }
        let response = self.request(MessageBody::DeleteRoSpec { rospec_id }).await?;
        check_status(&response)?;
        self.shared.rospecs.lock().delete(rospec_id)?;
        Ok(())
    }

    /// Fetch the reader's ROSpec list and resynchronize the local mirror
    pub async fn get_rospecs(&self) -> Result<Vec<RoSpec>> {
        let response = self.request(MessageBody::GetRoSpecs).await?;
        check_status(&response)?;
        match response.body {
            MessageBody::GetRoSpecsResponse { rospecs, .. } => {
                self.shared.rospecs.lock().sync(&rospecs);
                Ok(rospecs)
            }
            other => Err(Error::UnexpectedResponse {
                message_type: other.message_type(),
            }),
        }
    }

    /// Add an AccessSpec; it starts out Disabled
    pub async fn add_access_spec(&self, access_spec: AccessSpec) -> Result<()> {
        {
            let registry = self.shared.access_specs.lock();
            if access_spec.access_spec_id == 0 {
                return Err(LifecycleError::ReservedId.into());
            }
            if registry.get(access_spec.access_spec_id).is_some() {
                return Err(LifecycleError::DuplicateId(access_spec.access_spec_id).into());
            }
        }

        let response = self
            .request(MessageBody::AddAccessSpec { access_spec: access_spec.clone() })
            .await?;
        check_status(&response)?;

        self.shared.access_specs.lock().add(&access_spec)?;
        debug!(access_spec_id = access_spec.access_spec_id, "AccessSpec added");
        Ok(())
    }

    /// Enable an AccessSpec
    pub async fn enable_access_spec(&self, access_spec_id: u32) -> Result<()> {
        self.ensure_access_spec_state(access_spec_id, AccessSpecState::Disabled, "Enable")?;
        let response = self
            .request(MessageBody::EnableAccessSpec { access_spec_id })
            .await?;
        check_status(&response)?;
        self.shared.access_specs.lock().enable(access_spec_id)?;
        Ok(())
    }

    /// Disable an AccessSpec
    pub async fn disable_access_spec(&self, access_spec_id: u32) -> Result<()> {
        self.ensure_access_spec_state(access_spec_id, AccessSpecState::Enabled, "Disable")?;
        let response = self
            .request(MessageBody::DisableAccessSpec { access_spec_id })
            .await?;
        check_status(&response)?;
        self.shared.access_specs.lock().disable(access_spec_id)?;
        Ok(())
    }

    /// Delete an AccessSpec from any state; id 0 deletes all
    pub async fn delete_access_spec(&self, access_spec_id: u32) -> Result<()> {
        if access_spec_id != 0 && self.shared.access_specs.lock().get(access_spec_id).is_none() {
            return Err(LifecycleError::AccessSpecNotFound(access_spec_id).into());
        }
        let response = self
            .request(MessageBody::DeleteAccessSpec { access_spec_id })
            .await?;
        check_status(&response)?;
        self.shared.access_specs.lock().delete(access_spec_id)?;
        Ok(())
    }

    /// Fetch the reader's AccessSpec list and resynchronize the mirror
    pub async fn get_access_specs(&self) -> Result<Vec<AccessSpec>> {
        let response = self.request(MessageBody::GetAccessSpecs).await?;
        check_status(&response)?;
        match response.body {
            MessageBody::GetAccessSpecsResponse { access_specs, .. } => {
                self.shared.access_specs.lock().sync(&access_specs);
                Ok(access_specs)
            }
            other => Err(Error::UnexpectedResponse {
                message_type: other.message_type(),
            }),
        }
    }

    /// Release held events and reports (no response message is defined)
    pub async fn enable_events_and_reports(&self) -> Result<()> {
        self.send(MessageBody::EnableEventsAndReports).await
    }

    /// Ask the reader to flush buffered reports (delivered as
    /// RO_ACCESS_REPORT, no direct response)
    pub async fn request_report(&self) -> Result<()> {
        self.send(MessageBody::GetReport).await
    }

    // Internal plumbing

    fn ensure_rospec_state(
        &self,
        rospec_id: u32,
        expected: RoSpecState,
        action: &'static str,
    ) -> Result<()> {
        let registry = self.shared.rospecs.lock();
        match registry.state(rospec_id) {
            None => Err(LifecycleError::RoSpecNotFound(rospec_id).into()),
            Some(state) if state == expected => Ok(()),
            Some(state) => Err(LifecycleError::InvalidRoSpecState {
                id: rospec_id,
                state,
                action,
            }
            .into()),
        }
    }

    fn ensure_access_spec_state(
        &self,
        access_spec_id: u32,
        expected: AccessSpecState,
        action: &'static str,
    ) -> Result<()> {
        let registry = self.shared.access_specs.lock();
        match registry.state(access_spec_id) {
            None => Err(LifecycleError::AccessSpecNotFound(access_spec_id).into()),
            Some(state) if state == expected => Ok(()),
            Some(state) => Err(LifecycleError::InvalidAccessSpecState {
                id: access_spec_id,
                state,
                action,
            }
            .into()),
        }
    }

    fn ensure_sendable(&self) -> Result<()> {
        match self.shared.session.state() {
            ConnectionState::Operational | ConnectionState::Closing => Ok(()),
            ConnectionState::Error => Err(Error::ConnectionLost),
            _ => Err(Error::NotConnected),
        }
    }

    /// Send a message without registering a waiter
    async fn send(&self, body: MessageBody) -> Result<()> {
        self.ensure_sendable()?;
        let message_id = self.shared.session.next_message_id();
        let frame = Message::new(message_id, body).encode();

        let mut writer = self.shared.writer.lock().await;
        match writer.as_mut() {
            Some(w) => {
                w.write_frame(&frame).await?;
                Ok(())
            }
            None => Err(Error::NotConnected),
        }
    }

    /// Send a request and wait for the response with the same message id
    ///
    /// A timeout removes the pending entry and surfaces as
    /// [`Error::Timeout`]; session teardown fails the waiter with
    /// [`Error::ConnectionLost`]. Neither affects other in-flight calls.
    async fn request(&self, body: MessageBody) -> Result<Message> {
        self.ensure_sendable()?;

        let message_id = self.shared.session.next_message_id();
        let (tx, rx) = oneshot::channel();
        self.shared.pending.lock().insert(message_id, tx);

        trace!(message_id, message_type = body.message_type(), "sending request");
        let frame = Message::new(message_id, body).encode();

        let write_result = {
            let mut writer = self.shared.writer.lock().await;
            match writer.as_mut() {
                Some(w) => w.write_frame(&frame).await.map_err(Error::from),
                None => Err(Error::NotConnected),
            }
        };

        if let Err(e) = write_result {
            self.shared.pending.lock().remove(&message_id);
            return Err(e);
        }

        match tokio::time::timeout(self.command_timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(Error::ConnectionLost),
            Err(_) => {
                self.shared.pending.lock().remove(&message_id);
                Err(Error::Timeout { seconds: self.command_timeout.as_secs() })
            }
        }
    }
}

impl Drop for Reader {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        if !self.shared.session.state().is_terminal() {
            warn!("Reader dropped while still connected");
        }
    }
}

/// Verify a response carries a success LLRPStatus
fn check_status(response: &Message) -> Result<()> {
    match response.body.status() {
        Some(status) if status.is_success() => Ok(()),
        Some(status) => Err(Error::Status {
            code: status.code,
            description: status.description.clone(),
        }),
        None => Err(Error::UnexpectedResponse {
            message_type: response.message_type(),
        }),
    }
}

/// Flatten an event notification into observer events
fn events_from(data: &ReaderEventNotificationData) -> Vec<ReaderEvent> {
    let mut events = Vec::new();

    if let Some(status) = data.connection_attempt {
        events.push(ReaderEvent::ConnectionAttempt { status: status as u16 });
    }
    if data.connection_close {
        events.push(ReaderEvent::ConnectionClose);
    }
    if let Some(antenna) = &data.antenna {
        events.push(ReaderEvent::Antenna {
            antenna_id: antenna.antenna_id,
            connected: antenna.connected,
        });
    }
    if let Some(gpi) = &data.gpi {
        events.push(ReaderEvent::Gpi { port: gpi.port, high: gpi.state });
    }
    if let Some(rospec) = &data.rospec {
        events.push(match rospec.kind {
            RoSpecEventKind::Started => ReaderEvent::RoSpecStarted {
                rospec_id: rospec.rospec_id,
            },
            RoSpecEventKind::Ended => ReaderEvent::RoSpecEnded {
                rospec_id: rospec.rospec_id,
            },
            RoSpecEventKind::Preempted => ReaderEvent::RoSpecPreempted {
                rospec_id: rospec.rospec_id,
                preempting_rospec_id: rospec.preempting_rospec_id,
            },
        });
    }
    if let Some(ai_spec) = &data.ai_spec {
        events.push(ReaderEvent::AiSpecEnded {
            rospec_id: ai_spec.rospec_id,
            spec_index: ai_spec.spec_index,
        });
    }
    if let Some(exception) = &data.exception {
        events.push(ReaderEvent::ReaderException {
            message: exception.message.clone(),
        });
    }
    if let Some(warning) = &data.buffer_level_warning {
        events.push(ReaderEvent::ReportBufferWarning {
            fill_percentage: warning.fill_percentage,
        });
    }
    if data.buffer_overflow {
        events.push(ReaderEvent::ReportBufferOverflow);
    }

    events
}

/// The dedicated receive path
///
/// Buffers partial frames across transport reads and dispatches each
/// complete message. Never blocks on application-level processing: tag
/// reports and events go out through non-blocking broadcast sends.
async fn receive_loop(shared: Arc<Shared>, mut link_reader: Box<dyn LinkReader>) {
    let mut buf = BytesMut::with_capacity(4096);

    loop {
        loop {
            match Message::decode(&mut buf) {
                Ok(Some(message)) => dispatch(&shared, message).await,
                Ok(None) => break,
                Err(e) => {
                    // The stream is desynchronized and cannot be resumed
                    shared.fail_connection(&format!("codec failure: {}", e));
                    return;
                }
            }
        }

        if let Err(e) = link_reader.read_into(&mut buf).await {
            if shared.session.state().is_terminal()
                || shared.session.state() == ConnectionState::Closing
            {
                debug!("receive path finished: {}", e);
            } else {
                shared.fail_connection(&format!("transport failure: {}", e));
            }
            return;
        }
    }
}

async fn dispatch(shared: &Arc<Shared>, message: Message) {
    let message_id = message.message_id;

    match message.body {
        MessageBody::Keepalive => {
            shared.session.touch_keepalive();
            let ack = Message::new(message_id, MessageBody::KeepaliveAck).encode();
            let mut writer = shared.writer.lock().await;
            if let Some(w) = writer.as_mut() {
                if let Err(e) = w.write_frame(&ack).await {
                    warn!("failed to answer keepalive: {}", e);
                }
            }
            trace!(message_id, "answered keepalive");
        }
        MessageBody::RoAccessReport { tag_reports } => {
            debug!(count = tag_reports.len(), "tag report batch");
            for report in tag_reports {
                let _ = shared.reports.send(report);
            }
        }
        MessageBody::ReaderEventNotification { data } => {
            if let Some(rospec_event) = &data.rospec {
                if let Err(e) = shared.rospecs.lock().observe_event(rospec_event) {
                    warn!("ROSpec event does not match local registry: {}", e);
                }
            }
            for event in events_from(&data) {
                let _ = shared.events.send(event);
            }
        }
        body => {
            let waiter = shared.pending.lock().remove(&message_id);
            match waiter {
                Some(tx) => {
                    // The caller may have timed out between lookup and send
                    let _ = tx.send(Message::new(message_id, body));
                }
                None => match body {
                    MessageBody::ErrorMessage { status } => {
                        warn!(message_id, "unsolicited reader error: {}", status);
                        let _ = shared.events.send(ReaderEvent::ReaderError {
                            status: status.code.into(),
                            description: status.description,
                        });
                    }
                    other => warn!(
                        message_id,
                        message_type = other.message_type(),
                        "response with no pending request"
                    ),
                },
            }
        }
    }
}

/// Liveness watchdog
///
/// Armed once a keepalive period is configured; trips when no keepalive
/// arrives within period + grace and fails the session with
/// `ConnectionLost`.
async fn keepalive_watchdog(shared: Arc<Shared>, grace: Duration) {
    loop {
        if shared.session.state().is_terminal() {
            return;
        }

        let window = *shared.keepalive_period.lock();
        match window {
            None => tokio::time::sleep(Duration::from_millis(250)).await,
            Some(period) => {
                let deadline = shared
                    .session
                    .last_keepalive()
                    .map(|last| last + period + grace);

                match deadline {
                    None => tokio::time::sleep(period).await,
                    Some(deadline) => {
                        let now = Instant::now();
                        if now >= deadline {
                            shared.fail_connection("keepalive window expired");
                            return;
                        }
                        tokio::time::sleep(deadline - now).await;
                    }
                }
            }
        }
    }
}
