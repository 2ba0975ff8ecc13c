//! Platform audio engine built from cpal input and output streams.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use parking_lot::Mutex;

use ribbit_audio_core::models::config::StreamFormat;
use ribbit_audio_core::models::error::ModemError;
use ribbit_audio_core::models::events::RouteChangeReason;
use ribbit_audio_core::session::control::SessionNotifier;
use ribbit_audio_core::traits::audio_engine::{AudioEngine, CaptureRenderer, PlaybackRenderer};

use crate::route::{self, ResolvedStream, RouteState};
use crate::upsampler::{PlaybackUpsampler, SharedPlayback};

type SharedCapture = Arc<Mutex<Box<dyn CaptureRenderer>>>;

/// Streams of one engine run. Dropping them stops the hardware callbacks.
struct ActiveStreams {
    _input: Option<cpal::Stream>,
    _output: Option<cpal::Stream>,
}

// SAFETY: The streams are opened, played and dropped only by the thread that
// owns the engine (the modem control thread). The audio callbacks never touch
// them, and an engine is only moved between threads while it is stopped.
unsafe impl Send for ActiveStreams {}

/// cpal-backed [`AudioEngine`].
///
/// Renderers are attached once and outlive individual stream runs; each
/// [`start`](AudioEngine::start) opens fresh streams on the devices resolved
/// by the session's last activation. The hardware callbacks reach the
/// renderers with `try_lock` and never wait.
pub struct CpalEngine {
    route: Arc<Mutex<RouteState>>,
    capture: Option<SharedCapture>,
    playback: Option<(SharedPlayback, StreamFormat)>,
    streams: Option<ActiveStreams>,
}

impl CpalEngine {
    pub(crate) fn new(route: Arc<Mutex<RouteState>>) -> Self {
        Self {
            route,
            capture: None,
            playback: None,
            streams: None,
        }
    }

    fn open_input(
        &self,
        host: &cpal::Host,
        resolved: &ResolvedStream,
        notifier: Option<SessionNotifier>,
    ) -> Result<cpal::Stream, ModemError> {
        let renderer = self
            .capture
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| ModemError::EngineStartFailed("capture path not attached".into()))?;
        let device = route::find_input_device(host, &resolved.device_name)
            .ok_or(ModemError::InputUnavailable)?;

        let rate = resolved.config.sample_rate.0 as f64;
        let channels = resolved.config.channels;
        device
            .build_input_stream(
                &resolved.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Some(mut renderer) = renderer.try_lock() {
                        renderer.render_capture(data, rate, channels);
                    }
                },
                stream_error_handler("input", notifier),
                None,
            )
            .map_err(|e| ModemError::EngineStartFailed(format!("input stream: {}", e)))
    }

    fn open_output(
        &self,
        host: &cpal::Host,
        resolved: &ResolvedStream,
        notifier: Option<SessionNotifier>,
    ) -> Result<cpal::Stream, ModemError> {
        let (renderer, format) = self
            .playback
            .as_ref()
            .ok_or_else(|| ModemError::EngineStartFailed("playback path not attached".into()))?;
        let device = route::find_output_device(host, &resolved.device_name)
            .ok_or_else(|| ModemError::EngineStartFailed(format!("{} disappeared", resolved.device_name)))?;

        let mut upsampler = PlaybackUpsampler::new(
            Arc::clone(renderer),
            format.sample_rate,
            resolved.config.sample_rate.0 as f64,
            resolved.config.channels,
        );
        device
            .build_output_stream(
                &resolved.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| upsampler.render(data),
                stream_error_handler("output", notifier),
                None,
            )
            .map_err(|e| ModemError::EngineStartFailed(format!("output stream: {}", e)))
    }
}

fn stream_error_handler(
    direction: &'static str,
    notifier: Option<SessionNotifier>,
) -> impl FnMut(cpal::StreamError) + Send + 'static {
    move |err| match err {
        cpal::StreamError::DeviceNotAvailable => {
            log::warn!("{} device no longer available", direction);
            if let Some(notifier) = &notifier {
                notifier.route_changed(RouteChangeReason::OldDeviceUnavailable);
            }
        }
        other => log::error!("{} stream error: {}", direction, other),
    }
}

impl AudioEngine for CpalEngine {
    fn attach_capture(&mut self, renderer: Box<dyn CaptureRenderer>) -> Result<(), ModemError> {
        if self.capture.is_some() {
            return Err(ModemError::Platform("capture path already attached".into()));
        }
        self.capture = Some(Arc::new(Mutex::new(renderer)));
        Ok(())
    }

    fn attach_playback(
        &mut self,
        renderer: Box<dyn PlaybackRenderer>,
        format: StreamFormat,
    ) -> Result<(), ModemError> {
        if self.playback.is_some() {
            return Err(ModemError::Platform("playback path already attached".into()));
        }
        self.playback = Some((Arc::new(Mutex::new(renderer)), format));
        Ok(())
    }

    fn start(&mut self) -> Result<(), ModemError> {
        if self.streams.is_some() {
            return Ok(());
        }

        let (input, output, notifier) = {
            let state = self.route.lock();
            if !state.active {
                return Err(ModemError::EngineStartFailed("audio session is not active".into()));
            }
            (state.input.clone(), state.output.clone(), state.notifier.clone())
        };

        let host = cpal::default_host();
        let input = input
            .map(|resolved| self.open_input(&host, &resolved, notifier.clone()))
            .transpose()?;
        let output = output
            .map(|resolved| self.open_output(&host, &resolved, notifier.clone()))
            .transpose()?;

        for stream in input.iter().chain(output.iter()) {
            stream
                .play()
                .map_err(|e| ModemError::EngineStartFailed(format!("play: {}", e)))?;
        }

        self.streams = Some(ActiveStreams {
            _input: input,
            _output: output,
        });
        log::info!("cpal streams running");
        Ok(())
    }

    fn stop(&mut self) {
        if self.streams.take().is_some() {
            log::info!("cpal streams stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.streams.is_some()
    }
}
