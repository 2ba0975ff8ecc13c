use std::sync::Arc;
use std::time::Duration;

use crate::models::config::AudioSessionConfig;
use crate::models::direction::DirectionFlag;
use crate::models::error::ModemError;
use crate::processing::rate_monitor::RateMonitor;
use crate::traits::audio_engine::AudioEngine;
use crate::traits::modem_codec::ModemCodec;

use super::capture::CaptureContext;
use super::playback::PlaybackContext;
use super::render_queue::RenderQueue;

/// Everything the render contexts are built from.
pub struct GraphWiring {
    pub session: AudioSessionConfig,
    pub direction: Arc<DirectionFlag>,
    pub codec: Arc<dyn ModemCodec>,
    pub queue: RenderQueue,
    /// Window length when rate monitoring is enabled.
    pub rate_window: Option<Duration>,
}

impl GraphWiring {
    fn rate_monitor(&self) -> Option<RateMonitor> {
        self.rate_window
            .map(|window| RateMonitor::new(window, self.queue.clone()))
    }
}

/// The engine plus its two render paths.
///
/// ```text
/// capture:  [input node] → [CaptureContext]
/// playback: [PlaybackContext] → [output mixer]
/// ```
///
/// Each path is attached at most once for the lifetime of the graph; later
/// builds are no-ops and the engine is only ever stopped and started again.
pub struct AudioGraph<E: AudioEngine> {
    engine: E,
    capture_attached: bool,
    playback_attached: bool,
}

impl<E: AudioEngine> AudioGraph<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            capture_attached: false,
            playback_attached: false,
        }
    }

    pub fn is_built(&self) -> bool {
        self.capture_attached && self.playback_attached
    }

    /// Attach whichever paths are still missing.
    pub fn build(&mut self, wiring: &GraphWiring) -> Result<(), ModemError> {
        if !self.capture_attached {
            let capture = CaptureContext::new(
                &wiring.session,
                Arc::clone(&wiring.direction),
                Arc::clone(&wiring.codec),
                wiring.queue.clone(),
                wiring.rate_monitor(),
            );
            self.engine
                .attach_capture(Box::new(capture))
                .map_err(|e| ModemError::EngineStartFailed(format!("capture path: {}", e)))?;
            self.capture_attached = true;
            log::debug!("Capture path attached");
        }

        if !self.playback_attached {
            let playback = PlaybackContext::new(
                Arc::clone(&wiring.direction),
                Arc::clone(&wiring.codec),
                wiring.queue.clone(),
                wiring.rate_monitor(),
            );
            self.engine
                .attach_playback(Box::new(playback), wiring.session.stream_format())
                .map_err(|e| ModemError::EngineStartFailed(format!("playback path: {}", e)))?;
            self.playback_attached = true;
            log::debug!("Playback path attached");
        }

        Ok(())
    }

    pub fn start(&mut self) -> Result<(), ModemError> {
        if self.engine.is_running() {
            return Ok(());
        }
        self.engine.start().map_err(|e| match e {
            ModemError::EngineStartFailed(_) => e,
            other => ModemError::EngineStartFailed(other.to_string()),
        })
    }

    /// Safe to call at any time.
    pub fn stop(&mut self) {
        self.engine.stop();
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}
