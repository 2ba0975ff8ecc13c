use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;

use crate::graph::audio_graph::{AudioGraph, GraphWiring};
use crate::graph::render_queue::RenderQueue;
use crate::models::composer::payload_len;
use crate::models::config::ModemConfig;
use crate::models::direction::{DirectionFlag, ModemDirection};
use crate::models::error::ModemError;
use crate::models::events::{ModemEvent, SessionNotification};
use crate::models::message::DecodedMessage;
use crate::models::status::ModemStatus;
use crate::traits::audio_engine::AudioEngine;
use crate::traits::audio_session::AudioSession;
use crate::traits::modem_codec::ModemCodec;
use crate::traits::modem_delegate::ModemDelegate;

use super::control::{ControlMessage, ModemCommand, SessionNotifier};
use super::fault_recovery::{FaultRecovery, RecoveryAction};
use super::half_duplex::HalfDuplexController;
use super::session_manager::{PermissionOutcome, SessionManager};

/// Modem orchestrator. Owns the session, the graph, the direction flag and
/// the pending restart; every method runs on the control thread.
///
/// ```text
/// [AudioSession] ─notifications─┐
/// [permission prompt] ──────────┼→ control channel ─┐
/// [ModemHandle] ─commands───────┘                   ├→ ModemSession ─→ [ModemDelegate]
/// [render contexts] ─ModemEvent─→ render queue ─────┘
/// ```
///
/// Start sequence (the first failure aborts and becomes the status):
/// input available → permission → configure session → create codec →
/// build graph → start graph → Listening.
pub struct ModemSession<S: AudioSession, E: AudioEngine> {
    config: ModemConfig,
    sessions: SessionManager<S>,
    graph: AudioGraph<E>,
    controller: HalfDuplexController,
    recovery: FaultRecovery,
    codec: Arc<dyn ModemCodec>,
    delegate: Option<Arc<dyn ModemDelegate>>,
    status: Arc<RwLock<ModemStatus>>,
    queue: RenderQueue,
    render_rx: Receiver<ModemEvent>,
    control_tx: Sender<ControlMessage>,
    control_rx: Receiver<ControlMessage>,
    restarts: u64,
}

impl<S: AudioSession, E: AudioEngine> ModemSession<S, E> {
    pub fn new(
        config: ModemConfig,
        session: S,
        engine: E,
        codec: Arc<dyn ModemCodec>,
    ) -> Result<Self, ModemError> {
        config.validate().map_err(ModemError::InvalidConfig)?;

        let (queue, render_rx) = RenderQueue::bounded(config.render_queue_capacity);
        let (control_tx, control_rx) = crossbeam_channel::unbounded();

        let mut sessions = SessionManager::new(session);
        sessions.subscribe(SessionNotifier::new(control_tx.clone()));

        Ok(Self {
            recovery: FaultRecovery::new(config.restart_debounce()),
            controller: HalfDuplexController::new(Arc::clone(&codec)),
            graph: AudioGraph::new(engine),
            sessions,
            codec,
            delegate: None,
            status: Arc::new(RwLock::new(ModemStatus::Stopped)),
            queue,
            render_rx,
            control_tx,
            control_rx,
            restarts: 0,
            config,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn ModemDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn status(&self) -> ModemStatus {
        self.status.read().clone()
    }

    pub fn status_board(&self) -> Arc<RwLock<ModemStatus>> {
        Arc::clone(&self.status)
    }

    pub fn direction(&self) -> ModemDirection {
        self.controller.current()
    }

    pub fn direction_flag(&self) -> Arc<DirectionFlag> {
        self.controller.direction_flag()
    }

    pub fn is_running(&self) -> bool {
        self.graph.is_running()
    }

    /// Number of debounced restarts executed so far.
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    pub fn notifier(&self) -> SessionNotifier {
        SessionNotifier::new(self.control_tx.clone())
    }

    pub fn control_sender(&self) -> Sender<ControlMessage> {
        self.control_tx.clone()
    }

    pub fn control_receiver(&self) -> Receiver<ControlMessage> {
        self.control_rx.clone()
    }

    pub fn render_receiver(&self) -> Receiver<ModemEvent> {
        self.render_rx.clone()
    }

    pub fn engine(&self) -> &E {
        self.graph.engine()
    }

    pub fn audio_session(&self) -> &S {
        self.sessions.session()
    }

    fn set_status(&self, status: ModemStatus) {
        {
            let mut current = self.status.write();
            if *current == status {
                return;
            }
            *current = status.clone();
        }
        log::debug!("Status: {}", status);
        if let Some(delegate) = &self.delegate {
            delegate.on_status_changed(&status);
        }
    }

    /// Run the start sequence. The outcome is also reported as the status.
    pub fn start_engine(&mut self) -> Result<(), ModemError> {
        match self.try_start() {
            Ok(()) => {
                log::info!("Audio engine running");
                self.set_status(ModemStatus::for_direction(self.controller.current()));
                Ok(())
            }
            Err(e) => {
                match e {
                    ModemError::PermissionPending => log::info!("Start deferred until permission is answered"),
                    _ => log::error!("Audio engine start aborted: {}", e),
                }
                self.set_status(e.status());
                Err(e)
            }
        }
    }

    fn try_start(&mut self) -> Result<(), ModemError> {
        if self.graph.is_running() {
            return Ok(());
        }

        if !self.sessions.is_input_available() {
            return Err(ModemError::InputUnavailable);
        }

        let notifier = self.notifier();
        let outcome = self.sessions.acquire_permission(Box::new(move |granted| {
            notifier.permission_resolved(granted);
        }));
        match outcome {
            PermissionOutcome::Granted => {}
            PermissionOutcome::Denied => return Err(ModemError::PermissionDenied),
            PermissionOutcome::Requested => return Err(ModemError::PermissionPending),
        }

        self.sessions.configure(&self.config.session)?;

        if !self.codec.create_encoder() {
            return Err(ModemError::EncoderInitFailed);
        }
        if !self.codec.create_decoder() {
            return Err(ModemError::DecoderInitFailed);
        }

        let wiring = GraphWiring {
            session: self.config.session.clone(),
            direction: self.controller.direction_flag(),
            codec: Arc::clone(&self.codec),
            queue: self.queue.clone(),
            rate_window: self
                .config
                .rate_monitor_enabled
                .then(|| self.config.rate_window()),
        };
        self.graph.build(&wiring)?;
        self.graph.start()
    }

    /// Stop the graph and report "Stopped". Safe to call at any time.
    pub fn stop_engine(&mut self) {
        self.graph.stop();
        log::info!("Audio engine stopped");
        self.set_status(ModemStatus::Stopped);
    }

    pub fn restart(&mut self) {
        self.stop_engine();
        // Failures are already reported through the status.
        let _ = self.start_engine();
    }

    /// Tear down for good: cancel recovery, stop and deactivate the session.
    pub fn shutdown(&mut self) {
        self.recovery.cancel();
        self.stop_engine();
        self.sessions.deactivate();
    }

    /// Validate the payload, start the encoder and switch to Transmitting.
    pub fn request_transmit(&mut self, payload: &[u8]) -> Result<(), ModemError> {
        let epoch = self
            .controller
            .request_transmit(payload, self.graph.is_running())
            .map_err(|e| {
                log::warn!("Transmit rejected: {}", e);
                e
            })?;
        log::info!("Transmitting message {} ({} bytes)", epoch, payload_len(payload));
        self.set_status(ModemStatus::Transmitting);
        Ok(())
    }

    pub fn handle_event(&mut self, event: ModemEvent) {
        match event {
            ModemEvent::TransmissionFinished { epoch } => {
                if self.controller.complete(epoch) {
                    log::info!("Message {} sent", epoch);
                    // A stop may land between the playback post and this drain.
                    if self.graph.is_running() {
                        self.set_status(ModemStatus::Listening);
                    }
                } else {
                    log::debug!("Ignoring stale completion for message {}", epoch);
                }
            }
            ModemEvent::MessageDecoded { payload, bit_flips } => {
                let message = DecodedMessage::from_buffer(&payload, bit_flips.max(0) as u32);
                log::info!(
                    "Decoded {} bytes ({} bit flips)",
                    message.payload.len(),
                    message.bit_flips
                );
                if let Some(delegate) = &self.delegate {
                    delegate.on_message_received(&message);
                }
                if self.status.read().clone() == ModemStatus::DecodeFailed {
                    self.set_status(ModemStatus::Listening);
                }
            }
            ModemEvent::DecodeFailed => {
                log::warn!("Decoding failed");
                if self.graph.is_running() && self.controller.current() == ModemDirection::Listening {
                    self.set_status(ModemStatus::DecodeFailed);
                }
            }
            ModemEvent::RateMeasured {
                stage,
                samples_per_sec,
            } => {
                log::debug!("{}: {:.1} samples/s", stage.name(), samples_per_sec);
                if let Some(delegate) = &self.delegate {
                    delegate.on_rate_measured(stage, samples_per_sec);
                }
            }
        }
    }

    pub fn handle_notification(&mut self, notification: SessionNotification, now: Instant) {
        match self.recovery.on_notification(notification, now) {
            RecoveryAction::Stop => {
                log::info!("Session interrupted");
                self.stop_engine();
            }
            RecoveryAction::RestartScheduled(pending) => {
                log::info!(
                    "Restart {} scheduled after {:?}",
                    pending.generation,
                    notification
                );
            }
            RecoveryAction::Ignore => log::debug!("Ignoring {:?}", notification),
        }
    }

    fn permission_resolved(&mut self, granted: bool) {
        self.sessions.permission_resolved();
        if granted {
            log::info!("Microphone permission granted");
            self.restart();
        } else {
            log::warn!("Microphone permission denied");
            self.set_status(ModemStatus::PermissionDenied);
        }
    }

    /// Apply one control message. Returns false on shutdown.
    pub fn handle_control(&mut self, message: ControlMessage, now: Instant) -> bool {
        match message {
            ControlMessage::Command(ModemCommand::Start) => {
                let _ = self.start_engine();
            }
            ControlMessage::Command(ModemCommand::Stop) => {
                self.recovery.cancel();
                self.stop_engine();
            }
            ControlMessage::Command(ModemCommand::Transmit { payload, reply }) => {
                let result = self.request_transmit(&payload);
                let _ = reply.send(result);
            }
            ControlMessage::Command(ModemCommand::Shutdown) => return false,
            ControlMessage::Notification(notification) => self.handle_notification(notification, now),
            ControlMessage::PermissionResolved(granted) => self.permission_resolved(granted),
        }
        true
    }

    /// Run the pending restart if its deadline has passed.
    pub fn poll_restart(&mut self, now: Instant) -> bool {
        let Some(pending) = self.recovery.take_due(now) else {
            return false;
        };
        log::info!("Running restart {}", pending.generation);
        self.restarts += 1;
        self.restart();
        true
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.recovery.deadline()
    }

    pub(crate) fn report_dropped_events(&self) {
        let dropped = self.queue.take_dropped();
        if dropped > 0 {
            log::warn!("Render queue full, {} events dropped", dropped);
        }
    }

    /// Drain both queues and run a due restart without blocking. Returns
    /// false if a shutdown command was seen.
    pub fn process_pending(&mut self, now: Instant) -> bool {
        while let Ok(event) = self.render_rx.try_recv() {
            self.handle_event(event);
        }
        self.report_dropped_events();
        while let Ok(message) = self.control_rx.try_recv() {
            if !self.handle_control(message, now) {
                return false;
            }
        }
        self.poll_restart(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::models::events::{InterruptionPhase, RouteChangeReason};
    use crate::session::test_support::{MockCodec, MockEngine, MockSession, RecordingDelegate};
    use crate::traits::audio_session::PermissionStatus;

    struct Fixture {
        modem: ModemSession<MockSession, MockEngine>,
        session: MockSession,
        engine: MockEngine,
        codec: Arc<MockCodec>,
        delegate: Arc<RecordingDelegate>,
    }

    fn fixture() -> Fixture {
        let session = MockSession::new();
        let engine = MockEngine::new();
        let codec = Arc::new(MockCodec::new());
        let delegate = Arc::new(RecordingDelegate::default());
        let mut modem =
            ModemSession::new(ModemConfig::default(), session.clone(), engine.clone(), codec.clone()).unwrap();
        modem.set_delegate(delegate.clone());
        codec.watch_direction(modem.direction_flag());
        Fixture {
            modem,
            session,
            engine,
            codec,
            delegate,
        }
    }

    #[test]
    fn start_reports_listening() {
        let mut f = fixture();

        f.modem.start_engine().unwrap();

        assert_eq!(f.modem.status(), ModemStatus::Listening);
        assert!(f.engine.is_running());
        assert!(f.session.is_active());
        assert_eq!(f.delegate.statuses(), vec![ModemStatus::Listening]);
    }

    #[test]
    fn missing_input_aborts_start() {
        let mut f = fixture();
        f.session.script(|s| s.input_available = false);

        assert_eq!(f.modem.start_engine(), Err(ModemError::InputUnavailable));
        assert_eq!(f.modem.status(), ModemStatus::InputUnavailable);
        assert_eq!(f.engine.capture_attaches(), 0);
    }

    #[test]
    fn denied_permission_aborts_start() {
        let mut f = fixture();
        f.session.script(|s| s.permission = PermissionStatus::Denied);

        assert_eq!(f.modem.start_engine(), Err(ModemError::PermissionDenied));
        assert_eq!(f.modem.status().to_string(), "Microphone permission denied");
        assert!(!f.session.is_active());
    }

    #[test]
    fn encoder_failure_aborts_before_graph() {
        let mut f = fixture();
        f.codec.script(|s| s.encoder_ok = false);

        assert_eq!(f.modem.start_engine(), Err(ModemError::EncoderInitFailed));
        assert_eq!(f.modem.status(), ModemStatus::EncoderInitFailed);
        assert_eq!(f.engine.capture_attaches(), 0);
    }

    #[test]
    fn decoder_failure_aborts_before_graph() {
        let mut f = fixture();
        f.codec.script(|s| s.decoder_ok = false);

        assert_eq!(f.modem.start_engine(), Err(ModemError::DecoderInitFailed));
        assert_eq!(f.modem.status().to_string(), "Decoder initialization failed");
    }

    #[test]
    fn engine_failure_reported() {
        let mut f = fixture();
        f.engine.script(|s| s.fail_start = true);

        assert!(matches!(f.modem.start_engine(), Err(ModemError::EngineStartFailed(_))));
        assert!(f.modem.status().is_startup_failure());
    }

    #[test]
    fn pending_permission_restarts_on_grant() {
        let mut f = fixture();
        f.session.script(|s| s.permission = PermissionStatus::Undetermined);

        assert_eq!(f.modem.start_engine(), Err(ModemError::PermissionPending));
        assert_eq!(f.modem.status(), ModemStatus::AwaitingPermission);

        f.session.script(|s| s.permission = PermissionStatus::Granted);
        assert!(f.session.answer_permission(true));
        f.modem.process_pending(Instant::now());

        assert_eq!(f.modem.status(), ModemStatus::Listening);
        assert!(f.engine.is_running());
    }

    #[test]
    fn pending_permission_denied_on_refusal() {
        let mut f = fixture();
        f.session.script(|s| s.permission = PermissionStatus::Undetermined);
        let _ = f.modem.start_engine();

        f.session.answer_permission(false);
        f.modem.process_pending(Instant::now());

        assert_eq!(f.modem.status(), ModemStatus::PermissionDenied);
        assert!(!f.engine.is_running());
    }

    #[test]
    fn restarts_never_rebuild_graph() {
        let mut f = fixture();
        for _ in 0..4 {
            f.modem.restart();
        }

        assert_eq!(f.engine.capture_attaches(), 1);
        assert_eq!(f.engine.playback_attaches(), 1);
        assert_eq!(f.codec.log().encoder_creates, 4);
        assert_eq!(f.modem.status(), ModemStatus::Listening);
    }

    #[test]
    fn transmit_round_trip() {
        let mut f = fixture();
        f.codec.script(|s| s.samples_per_message = 300);
        f.modem.start_engine().unwrap();

        f.modem.request_transmit(b"Hello World!").unwrap();
        assert_eq!(f.modem.status(), ModemStatus::Transmitting);
        assert_eq!(f.modem.direction(), ModemDirection::Transmitting);

        for _ in 0..4 {
            f.engine.render_capture(&[0.0; 160], 8000.0, 1);
            f.engine.render_playback(128);
        }
        f.modem.process_pending(Instant::now());

        assert_eq!(f.modem.direction(), ModemDirection::Listening);
        assert_eq!(f.modem.status(), ModemStatus::Listening);
        assert_eq!(
            f.delegate.statuses(),
            vec![ModemStatus::Listening, ModemStatus::Transmitting, ModemStatus::Listening]
        );
        let log = f.codec.log();
        assert_eq!(log.read_calls, 3);
        assert_eq!(log.violations, 0);
    }

    #[test]
    fn transmit_sends_bytes_up_to_first_nul() {
        let mut f = fixture();
        f.modem.start_engine().unwrap();

        f.modem.request_transmit(b"hi\0trailing").unwrap();

        let encoded = &f.codec.log().encoded[0];
        assert_eq!(payload_len(encoded), 2);
        assert_eq!(&encoded[..2], b"hi");
        assert!(encoded[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn completion_after_interruption_keeps_stopped() {
        let mut f = fixture();
        f.codec.script(|s| s.samples_per_message = 100);
        f.modem.start_engine().unwrap();
        f.modem.request_transmit(b"Hello World!").unwrap();

        f.engine.render_playback(128);
        f.modem
            .handle_notification(SessionNotification::Interruption(InterruptionPhase::Began), Instant::now());
        assert_eq!(f.modem.status(), ModemStatus::Stopped);

        f.modem.process_pending(Instant::now());

        assert_eq!(f.modem.status(), ModemStatus::Stopped);
        assert_eq!(f.modem.direction(), ModemDirection::Listening);
        assert!(!f.engine.is_running());
    }

    #[test]
    fn completion_after_user_stop_keeps_stopped() {
        let mut f = fixture();
        f.codec.script(|s| s.samples_per_message = 100);
        f.modem.start_engine().unwrap();
        f.modem.request_transmit(b"bye").unwrap();

        f.engine.render_playback(128);
        f.modem.stop_engine();
        f.modem.process_pending(Instant::now());

        assert_eq!(f.modem.status(), ModemStatus::Stopped);
        assert_eq!(f.modem.direction(), ModemDirection::Listening);

        f.modem.start_engine().unwrap();
        assert_eq!(f.modem.status(), ModemStatus::Listening);
    }

    #[test]
    fn direction_gates_codec_in_every_callback() {
        let mut f = fixture();
        f.codec.script(|s| s.samples_per_message = 1000);
        f.modem.start_engine().unwrap();

        for round in 0..6 {
            if round % 2 == 1 {
                f.modem.request_transmit(b"ping").unwrap();
            }
            for _ in 0..10 {
                f.engine.render_capture(&[0.0; 160], 8000.0, 1);
                f.engine.render_playback(160);
            }
            f.modem.process_pending(Instant::now());
        }

        let log = f.codec.log();
        assert_eq!(log.violations, 0);
        assert!(log.feed_calls > 0);
        assert!(log.read_calls > 0);
    }

    #[test]
    fn transmit_rejected_while_stopped() {
        let mut f = fixture();
        assert_eq!(f.modem.request_transmit(b"hi"), Err(ModemError::EngineNotRunning));
        assert_eq!(f.modem.status(), ModemStatus::Stopped);
    }

    #[test]
    fn decode_failure_is_local() {
        let mut f = fixture();
        f.codec.script(|s| {
            s.frame_samples = 160;
            s.fetch_result = -1;
        });
        f.modem.start_engine().unwrap();

        f.engine.render_capture(&[0.0; 160], 8000.0, 1);
        f.modem.process_pending(Instant::now());

        assert_eq!(f.modem.status().to_string(), "Decoding failed");
        assert_eq!(f.modem.direction(), ModemDirection::Listening);
        assert!(f.engine.is_running());
        assert_eq!(f.modem.next_deadline(), None);

        f.codec.script(|s| {
            s.fetch_result = 0;
            s.decoded = b"ok".to_vec();
        });
        f.engine.render_capture(&[0.0; 160], 8000.0, 1);
        f.modem.process_pending(Instant::now());

        assert_eq!(f.modem.status(), ModemStatus::Listening);
        let messages = f.delegate.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text(), "ok");
    }

    #[test]
    fn interruption_stops_then_resumes_after_debounce() {
        let mut f = fixture();
        f.modem.start_engine().unwrap();
        let t0 = Instant::now();

        f.modem.handle_notification(SessionNotification::Interruption(InterruptionPhase::Began), t0);
        assert_eq!(f.modem.status(), ModemStatus::Stopped);
        assert!(!f.engine.is_running());

        f.modem.handle_notification(
            SessionNotification::Interruption(InterruptionPhase::Ended { should_resume: true }),
            t0,
        );
        assert!(!f.modem.poll_restart(t0 + Duration::from_millis(999)));
        assert_eq!(f.modem.status(), ModemStatus::Stopped);

        assert!(f.modem.poll_restart(t0 + Duration::from_secs(1)));
        assert_eq!(f.modem.status(), ModemStatus::Listening);
        assert!(f.engine.is_running());
    }

    #[test]
    fn route_flapping_restarts_once() {
        let mut f = fixture();
        f.modem.start_engine().unwrap();
        let notifier = f.modem.notifier();
        let t0 = Instant::now();

        for i in 0..8 {
            let reason = if i % 2 == 0 {
                RouteChangeReason::OldDeviceUnavailable
            } else {
                RouteChangeReason::NewDeviceAvailable
            };
            notifier.route_changed(reason);
            f.modem.process_pending(t0 + Duration::from_millis(i * 100));
        }

        let mut now = t0 + Duration::from_millis(700);
        while now < t0 + Duration::from_secs(4) {
            f.modem.process_pending(now);
            now += Duration::from_millis(50);
        }

        assert_eq!(f.modem.restarts(), 1);
        assert_eq!(f.engine.starts(), 2);
    }

    #[test]
    fn session_notifier_reaches_recovery() {
        let mut f = fixture();
        f.modem.start_engine().unwrap();

        assert!(f.session.notify(SessionNotification::Interruption(InterruptionPhase::Began)));
        f.modem.process_pending(Instant::now());

        assert_eq!(f.modem.status(), ModemStatus::Stopped);
    }

    #[test]
    fn rate_monitor_reports_through_delegate() {
        let session = MockSession::new();
        let engine = MockEngine::new();
        let codec = Arc::new(MockCodec::new());
        let delegate = Arc::new(RecordingDelegate::default());
        let config = ModemConfig {
            rate_monitor_enabled: true,
            rate_window_ms: 1,
            ..Default::default()
        };
        let mut modem = ModemSession::new(config, session, engine.clone(), codec).unwrap();
        modem.set_delegate(delegate.clone());
        modem.start_engine().unwrap();

        engine.render_capture(&[0.0; 160], 8000.0, 1);
        std::thread::sleep(Duration::from_millis(5));
        engine.render_capture(&[0.0; 160], 8000.0, 1);
        modem.process_pending(Instant::now());

        assert!(!delegate.rates().is_empty());
    }

    #[test]
    fn invalid_config_rejected() {
        let config = ModemConfig {
            render_queue_capacity: 0,
            ..Default::default()
        };
        let result = ModemSession::new(config, MockSession::new(), MockEngine::new(), Arc::new(MockCodec::new()));
        assert!(matches!(result, Err(ModemError::InvalidConfig(_))));
    }
}
