//! # ribbit-audio-cpal
//!
//! Cross-platform audio backend for ribbit-audio-core, built on cpal.
//!
//! Provides:
//! - `CpalSession` — device and stream-config negotiation for the default host
//! - `CpalEngine` — f32 input/output streams driving the core render contexts
//! - `DeviceWatcher` — default-device polling reported as route changes
//!
//! ## Usage
//! ```ignore
//! use ribbit_audio_core::{ModemConfig, ModemRuntime, ModemSession};
//!
//! let (session, engine) = ribbit_audio_cpal::platform();
//! let modem = ModemSession::new(ModemConfig::default(), session, engine, codec)?;
//! let handle = ModemRuntime::spawn(modem)?;
//! handle.start()?;
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

pub mod cpal_engine;
pub mod cpal_session;
pub mod device_watcher;
mod route;
mod upsampler;

pub use cpal_engine::CpalEngine;
pub use cpal_session::CpalSession;
pub use device_watcher::{DeviceSnapshot, DeviceWatcher};

/// Session and engine for the default cpal host, sharing one route state.
pub fn platform() -> (CpalSession, CpalEngine) {
    let route = Arc::new(Mutex::new(route::RouteState::default()));
    (CpalSession::new(Arc::clone(&route)), CpalEngine::new(route))
}
