//! Platform audio session backed by cpal's default host.

use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait};
use parking_lot::Mutex;

use ribbit_audio_core::models::config::SessionCategory;
use ribbit_audio_core::models::error::ModemError;
use ribbit_audio_core::session::control::SessionNotifier;
use ribbit_audio_core::traits::audio_session::{AudioSession, PermissionCallback, PermissionStatus};

use crate::device_watcher::DeviceWatcher;
use crate::route::{self, RouteState};

const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(1);

/// cpal-backed [`AudioSession`].
///
/// Desktop hosts have no session category or activation step, so this type
/// negotiates stream configurations instead: activation resolves the default
/// input and output devices and the f32 configs the engine will open.
/// Microphone consent, where the OS has one, is prompted when the input
/// stream opens, so permission is reported as granted.
pub struct CpalSession {
    route: Arc<Mutex<RouteState>>,
    watch_interval: Duration,
    watcher: Option<DeviceWatcher>,
}

impl CpalSession {
    pub(crate) fn new(route: Arc<Mutex<RouteState>>) -> Self {
        Self {
            route,
            watch_interval: DEFAULT_WATCH_INTERVAL,
            watcher: None,
        }
    }

    /// Poll interval of the device watcher. Takes effect on the next
    /// `subscribe`.
    pub fn set_watch_interval(&mut self, interval: Duration) {
        self.watch_interval = interval;
    }
}

impl AudioSession for CpalSession {
    fn is_input_available(&self) -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    fn record_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    fn request_record_permission(&mut self, callback: PermissionCallback) {
        callback(true);
    }

    fn set_category(&mut self, category: SessionCategory) -> Result<(), ModemError> {
        let host = cpal::default_host();
        if category != SessionCategory::Playback && host.default_input_device().is_none() {
            return Err(ModemError::Platform("no input device".into()));
        }
        if category != SessionCategory::Record && host.default_output_device().is_none() {
            return Err(ModemError::Platform("no output device".into()));
        }
        self.route.lock().category = Some(category);
        Ok(())
    }

    fn set_preferred_sample_rate(&mut self, rate: f64) -> Result<(), ModemError> {
        let rate = rate.round() as u32;
        let device = cpal::default_host()
            .default_input_device()
            .ok_or(ModemError::InputUnavailable)?;
        let supported = device
            .supported_input_configs()
            .map_err(|e| route::platform_error("input configurations", e))?
            .any(|r| r.sample_format() == cpal::SampleFormat::F32 && route::supports_rate(&r, rate));

        let mut state = self.route.lock();
        if supported {
            state.preferred_rate = Some(rate);
            Ok(())
        } else {
            state.preferred_rate = None;
            Err(ModemError::Platform(format!("{} Hz not supported by input device", rate)))
        }
    }

    fn set_active(&mut self, active: bool) -> Result<(), ModemError> {
        let mut state = self.route.lock();
        if !active {
            state.active = false;
            return Ok(());
        }

        let host = cpal::default_host();
        state.input = if state.wants_input() {
            Some(route::resolve_input(&host, state.preferred_rate)?)
        } else {
            None
        };
        state.output = if state.wants_output() {
            Some(route::resolve_output(&host, state.preferred_rate)?)
        } else {
            None
        };
        state.active = true;

        if let Some(input) = &state.input {
            log::info!("Input: {} ({:?})", input.device_name, input.config);
        }
        if let Some(output) = &state.output {
            log::info!("Output: {} ({:?})", output.device_name, output.config);
        }
        Ok(())
    }

    fn sample_rate(&self) -> f64 {
        let state = self.route.lock();
        state
            .input
            .as_ref()
            .or(state.output.as_ref())
            .map(|s| s.config.sample_rate.0 as f64)
            .unwrap_or(0.0)
    }

    fn subscribe(&mut self, notifier: SessionNotifier) {
        self.watcher = None;
        match DeviceWatcher::spawn(notifier.clone(), self.watch_interval) {
            Ok(watcher) => self.watcher = Some(watcher),
            Err(e) => log::warn!("Device changes will not be detected: {}", e),
        }
        self.route.lock().notifier = Some(notifier);
    }
}
