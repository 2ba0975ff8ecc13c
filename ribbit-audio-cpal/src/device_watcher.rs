//! Default-device polling, surfaced as route changes.
//!
//! cpal has no portable device-change callback, so a background thread
//! compares the default input/output device names at a fixed interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait};

use ribbit_audio_core::models::error::ModemError;
use ribbit_audio_core::models::events::RouteChangeReason;
use ribbit_audio_core::session::control::SessionNotifier;

/// Names of the current default devices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub input: Option<String>,
    pub output: Option<String>,
}

impl DeviceSnapshot {
    pub fn capture() -> Self {
        let host = cpal::default_host();
        Self {
            input: host.default_input_device().and_then(|d| d.name().ok()),
            output: host.default_output_device().and_then(|d| d.name().ok()),
        }
    }
}

/// Route change implied by going from `previous` to `current`, if any.
///
/// A device that disappears wins over one that appears in the same poll.
pub fn classify(previous: &DeviceSnapshot, current: &DeviceSnapshot) -> Option<RouteChangeReason> {
    if previous == current {
        return None;
    }
    let lost = |before: &Option<String>, after: &Option<String>| before.is_some() && before != after;
    if lost(&previous.input, &current.input) || lost(&previous.output, &current.output) {
        return Some(RouteChangeReason::OldDeviceUnavailable);
    }
    Some(RouteChangeReason::NewDeviceAvailable)
}

/// Background thread posting default-device changes to a [`SessionNotifier`].
pub struct DeviceWatcher {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl DeviceWatcher {
    pub fn spawn(notifier: SessionNotifier, interval: Duration) -> Result<Self, ModemError> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("cpal-device-watcher".into())
            .spawn(move || watch_loop(flag, notifier, interval))
            .map_err(|e| ModemError::Platform(format!("failed to spawn device watcher: {}", e)))?;

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            let _ = handle.join();
        }
    }
}

impl Drop for DeviceWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn watch_loop(running: Arc<AtomicBool>, notifier: SessionNotifier, interval: Duration) {
    let mut previous = DeviceSnapshot::capture();
    log::debug!("Watching default devices: {:?}", previous);

    while running.load(Ordering::SeqCst) {
        thread::park_timeout(interval);
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let current = DeviceSnapshot::capture();
        if let Some(reason) = classify(&previous, &current) {
            log::info!("Default devices changed ({:?}): {:?}", reason, current);
            if !notifier.route_changed(reason) {
                break;
            }
        }
        previous = current;
    }
}
