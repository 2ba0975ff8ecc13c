//! Scripted doubles for the platform session, the engine, the codec and the
//! delegate.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::config::{SessionCategory, StreamFormat};
use crate::models::direction::DirectionFlag;
use crate::models::error::ModemError;
use crate::models::events::{PipelineStage, SessionNotification};
use crate::models::message::DecodedMessage;
use crate::models::status::ModemStatus;
use crate::traits::audio_engine::{AudioEngine, CaptureRenderer, PlaybackRenderer};
use crate::traits::audio_session::{AudioSession, PermissionCallback, PermissionStatus};
use crate::traits::modem_codec::{ModemCodec, DECODED_PAYLOAD_LEN, PAYLOAD_CAPACITY};
use crate::traits::modem_delegate::ModemDelegate;

use super::control::SessionNotifier;

pub struct SessionScript {
    pub input_available: bool,
    pub permission: PermissionStatus,
    pub fail_category: bool,
    pub fail_preferred_rate: bool,
    pub fail_activate: bool,
    pub hardware_rate: f64,
    active: bool,
    category: Option<SessionCategory>,
    permission_requests: usize,
    pending_callback: Option<PermissionCallback>,
    notifier: Option<SessionNotifier>,
}

/// Cloneable handle onto one scripted session.
#[derive(Clone)]
pub struct MockSession {
    state: Arc<Mutex<SessionScript>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionScript {
                input_available: true,
                permission: PermissionStatus::Granted,
                fail_category: false,
                fail_preferred_rate: false,
                fail_activate: false,
                hardware_rate: 8000.0,
                active: false,
                category: None,
                permission_requests: 0,
                pending_callback: None,
                notifier: None,
            })),
        }
    }

    pub fn script(&self, f: impl FnOnce(&mut SessionScript)) {
        f(&mut self.state.lock());
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    pub fn permission_requests(&self) -> usize {
        self.state.lock().permission_requests
    }

    /// Answer the outstanding permission prompt. Returns false if none.
    pub fn answer_permission(&self, granted: bool) -> bool {
        let callback = self.state.lock().pending_callback.take();
        match callback {
            Some(callback) => {
                callback(granted);
                true
            }
            None => false,
        }
    }

    /// Deliver a notification the way the platform would.
    pub fn notify(&self, notification: SessionNotification) -> bool {
        let notifier = self.state.lock().notifier.clone();
        notifier.map(|n| n.notify(notification)).unwrap_or(false)
    }
}

impl AudioSession for MockSession {
    fn is_input_available(&self) -> bool {
        self.state.lock().input_available
    }

    fn record_permission(&self) -> PermissionStatus {
        self.state.lock().permission
    }

    fn request_record_permission(&mut self, callback: PermissionCallback) {
        let mut state = self.state.lock();
        state.permission_requests += 1;
        state.pending_callback = Some(callback);
    }

    fn set_category(&mut self, category: SessionCategory) -> Result<(), ModemError> {
        let mut state = self.state.lock();
        if state.fail_category {
            return Err(ModemError::Platform("category refused".into()));
        }
        state.category = Some(category);
        Ok(())
    }

    fn set_preferred_sample_rate(&mut self, _rate: f64) -> Result<(), ModemError> {
        if self.state.lock().fail_preferred_rate {
            return Err(ModemError::Platform("rate refused".into()));
        }
        Ok(())
    }

    fn set_active(&mut self, active: bool) -> Result<(), ModemError> {
        let mut state = self.state.lock();
        if active && state.fail_activate {
            return Err(ModemError::Platform("activation refused".into()));
        }
        state.active = active;
        Ok(())
    }

    fn sample_rate(&self) -> f64 {
        self.state.lock().hardware_rate
    }

    fn subscribe(&mut self, notifier: SessionNotifier) {
        self.state.lock().notifier = Some(notifier);
    }
}

pub struct EngineScript {
    pub fail_start: bool,
    pub fail_playback_attach: bool,
    running: bool,
    starts: usize,
    capture_attaches: usize,
    playback_attaches: usize,
    capture: Option<Box<dyn CaptureRenderer>>,
    playback: Option<Box<dyn PlaybackRenderer>>,
}

/// Engine double whose render callbacks are driven by the test.
#[derive(Clone)]
pub struct MockEngine {
    state: Arc<Mutex<EngineScript>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(EngineScript {
                fail_start: false,
                fail_playback_attach: false,
                running: false,
                starts: 0,
                capture_attaches: 0,
                playback_attaches: 0,
                capture: None,
                playback: None,
            })),
        }
    }

    pub fn script(&self, f: impl FnOnce(&mut EngineScript)) {
        f(&mut self.state.lock());
    }

    pub fn capture_attaches(&self) -> usize {
        self.state.lock().capture_attaches
    }

    pub fn playback_attaches(&self) -> usize {
        self.state.lock().playback_attaches
    }

    pub fn starts(&self) -> usize {
        self.state.lock().starts
    }

    /// One capture render cycle. Does nothing while stopped.
    pub fn render_capture(&self, input: &[f32], sample_rate: f64, channels: u16) {
        let mut state = self.state.lock();
        if !state.running {
            return;
        }
        if let Some(capture) = state.capture.as_mut() {
            capture.render_capture(input, sample_rate, channels);
        }
    }

    /// One playback render cycle of `frames` samples.
    pub fn render_playback(&self, frames: usize) -> Vec<f32> {
        let mut output = vec![0.0; frames];
        let mut state = self.state.lock();
        if state.running {
            if let Some(playback) = state.playback.as_mut() {
                playback.render_playback(&mut output);
            }
        }
        output
    }
}

impl AudioEngine for MockEngine {
    fn attach_capture(&mut self, renderer: Box<dyn CaptureRenderer>) -> Result<(), ModemError> {
        let mut state = self.state.lock();
        state.capture_attaches += 1;
        state.capture = Some(renderer);
        Ok(())
    }

    fn attach_playback(
        &mut self,
        renderer: Box<dyn PlaybackRenderer>,
        _format: StreamFormat,
    ) -> Result<(), ModemError> {
        let mut state = self.state.lock();
        if state.fail_playback_attach {
            return Err(ModemError::Platform("mixer refused connection".into()));
        }
        state.playback_attaches += 1;
        state.playback = Some(renderer);
        Ok(())
    }

    fn start(&mut self) -> Result<(), ModemError> {
        let mut state = self.state.lock();
        if state.fail_start {
            return Err(ModemError::Platform("device busy".into()));
        }
        state.running = true;
        state.starts += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.state.lock().running = false;
    }

    fn is_running(&self) -> bool {
        self.state.lock().running
    }
}

pub struct CodecScript {
    pub encoder_ok: bool,
    pub decoder_ok: bool,
    /// Samples emitted per message before `read_encoder` reports completion.
    pub samples_per_message: usize,
    /// Samples per decoder frame; 0 never completes a frame.
    pub frame_samples: usize,
    pub fetch_result: i32,
    pub decoded: Vec<u8>,
}

#[derive(Debug, Default, Clone)]
pub struct CodecLog {
    pub encoder_creates: usize,
    pub decoder_creates: usize,
    pub encoded: Vec<Vec<u8>>,
    pub feed_calls: usize,
    pub fed_samples: usize,
    pub max_feed: usize,
    pub read_calls: usize,
    /// Decoder fed while transmitting, or encoder read while listening.
    pub violations: usize,
}

struct CodecState {
    script: CodecScript,
    log: CodecLog,
    encoder_remaining: usize,
    frame_progress: usize,
}

/// Codec double that counts calls and checks them against the direction
/// flag it watches.
pub struct MockCodec {
    state: Mutex<CodecState>,
    direction: Mutex<Option<Arc<DirectionFlag>>>,
}

impl MockCodec {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CodecState {
                script: CodecScript {
                    encoder_ok: true,
                    decoder_ok: true,
                    samples_per_message: 256,
                    frame_samples: 0,
                    fetch_result: 0,
                    decoded: Vec::new(),
                },
                log: CodecLog::default(),
                encoder_remaining: 0,
                frame_progress: 0,
            }),
            direction: Mutex::new(None),
        }
    }

    pub fn script(&self, f: impl FnOnce(&mut CodecScript)) {
        f(&mut self.state.lock().script);
    }

    pub fn log(&self) -> CodecLog {
        self.state.lock().log.clone()
    }

    pub fn watch_direction(&self, direction: Arc<DirectionFlag>) {
        *self.direction.lock() = Some(direction);
    }

    fn transmitting(&self) -> Option<bool> {
        self.direction.lock().as_ref().map(|d| d.is_transmitting())
    }
}

impl ModemCodec for MockCodec {
    fn create_encoder(&self) -> bool {
        let mut state = self.state.lock();
        state.log.encoder_creates += 1;
        state.script.encoder_ok
    }

    fn create_decoder(&self) -> bool {
        let mut state = self.state.lock();
        state.log.decoder_creates += 1;
        state.script.decoder_ok
    }

    fn init_encoder(&self, payload: &[u8; PAYLOAD_CAPACITY]) {
        let mut state = self.state.lock();
        state.log.encoded.push(payload.to_vec());
        state.encoder_remaining = state.script.samples_per_message;
    }

    fn read_encoder(&self, samples: &mut [f32]) -> bool {
        let violation = self.transmitting() == Some(false);
        let mut state = self.state.lock();
        state.log.read_calls += 1;
        if violation {
            state.log.violations += 1;
        }
        let emitted = samples.len().min(state.encoder_remaining);
        samples[..emitted].fill(0.5);
        samples[emitted..].fill(0.0);
        state.encoder_remaining -= emitted;
        state.encoder_remaining == 0
    }

    fn feed_decoder(&self, samples: &[f32]) -> bool {
        let violation = self.transmitting() == Some(true);
        let mut state = self.state.lock();
        state.log.feed_calls += 1;
        state.log.fed_samples += samples.len();
        state.log.max_feed = state.log.max_feed.max(samples.len());
        if violation {
            state.log.violations += 1;
        }
        if state.script.frame_samples == 0 {
            return false;
        }
        state.frame_progress += samples.len();
        if state.frame_progress >= state.script.frame_samples {
            state.frame_progress = 0;
            return true;
        }
        false
    }

    fn fetch_decoder(&self, payload: &mut [u8; DECODED_PAYLOAD_LEN]) -> i32 {
        let state = self.state.lock();
        payload.fill(0);
        let len = state.script.decoded.len().min(PAYLOAD_CAPACITY);
        payload[..len].copy_from_slice(&state.script.decoded[..len]);
        state.script.fetch_result
    }
}

#[derive(Default)]
pub struct RecordingDelegate {
    statuses: Mutex<Vec<ModemStatus>>,
    messages: Mutex<Vec<DecodedMessage>>,
    rates: Mutex<Vec<(PipelineStage, f64)>>,
}

impl RecordingDelegate {
    pub fn statuses(&self) -> Vec<ModemStatus> {
        self.statuses.lock().clone()
    }

    pub fn messages(&self) -> Vec<DecodedMessage> {
        self.messages.lock().clone()
    }

    pub fn rates(&self) -> Vec<(PipelineStage, f64)> {
        self.rates.lock().clone()
    }
}

impl ModemDelegate for RecordingDelegate {
    fn on_status_changed(&self, status: &ModemStatus) {
        self.statuses.lock().push(status.clone());
    }

    fn on_message_received(&self, message: &DecodedMessage) {
        self.messages.lock().push(message.clone());
    }

    fn on_rate_measured(&self, stage: PipelineStage, samples_per_sec: f64) {
        self.rates.lock().push((stage, samples_per_sec));
    }
}
