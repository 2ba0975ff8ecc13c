use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::ModemError;

/// Sample encoding of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    Float32,
}

/// Audio session category requested from the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionCategory {
    /// Simultaneous input and output routes (duplex).
    PlayAndRecord,
    Record,
    Playback,
}

/// Layout of the samples exchanged with the decoder and encoder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamFormat {
    pub sample_rate: f64,
    pub channels: u16,
    pub sample_format: SampleFormat,
    pub interleaved: bool,
}

/// Highest target rate accepted; bounds the one-second conversion buffer.
pub const MAX_SAMPLE_RATE: f64 = 192_000.0;

/// Session parameters applied on every engine start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSessionConfig {
    /// Target sample rate in Hz (default: 8000).
    pub sample_rate: f64,

    /// Channel count (default: 1). Only mono is supported.
    pub channels: u16,

    pub sample_format: SampleFormat,

    pub interleaved: bool,

    pub category: SessionCategory,
}

impl AudioSessionConfig {
    pub fn stream_format(&self) -> StreamFormat {
        StreamFormat {
            sample_rate: self.sample_rate,
            channels: self.channels,
            sample_format: self.sample_format,
            interleaved: self.interleaved,
        }
    }

    /// Capacity of the conversion buffer: one second at the target rate.
    pub fn conversion_capacity(&self) -> usize {
        (self.sample_rate * self.channels as f64) as usize
    }
}

impl Default for AudioSessionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 8000.0,
            channels: 1,
            sample_format: SampleFormat::Float32,
            interleaved: false,
            category: SessionCategory::PlayAndRecord,
        }
    }
}

/// Top-level modem configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    pub session: AudioSessionConfig,

    /// Quiet period before a scheduled restart runs (default: 1000 ms).
    pub restart_debounce_ms: u64,

    /// Length of a throughput measurement window (default: 1000 ms).
    pub rate_window_ms: u64,

    /// Measure per-stage throughput on the render contexts (default: false).
    pub rate_monitor_enabled: bool,

    /// Slots in the real-time → control event queue (default: 64).
    pub render_queue_capacity: usize,
}

impl ModemConfig {
    pub fn validate(&self) -> Result<(), String> {
        let rate = self.session.sample_rate;
        if !(rate.is_finite() && (1.0..=MAX_SAMPLE_RATE).contains(&rate)) {
            return Err(format!(
                "sample rate must be between 1 and {} Hz, got {}",
                MAX_SAMPLE_RATE, rate
            ));
        }
        if self.session.channels != 1 {
            return Err(format!("unsupported channel count: {}", self.session.channels));
        }
        if self.session.interleaved {
            return Err("interleaved target format is not supported".into());
        }
        if self.restart_debounce_ms == 0 {
            return Err("restart debounce must be positive".into());
        }
        if self.rate_window_ms == 0 {
            return Err("rate window must be positive".into());
        }
        if self.render_queue_capacity == 0 {
            return Err("render queue needs at least one slot".into());
        }
        Ok(())
    }

    pub fn restart_debounce(&self) -> Duration {
        Duration::from_millis(self.restart_debounce_ms)
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_millis(self.rate_window_ms)
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ModemError> {
        let config: ModemConfig = serde_json::from_str(json)
            .map_err(|e| ModemError::InvalidConfig(format!("failed to parse config: {}", e)))?;
        config.validate().map_err(ModemError::InvalidConfig)?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, ModemError> {
        let json = fs::read_to_string(path)
            .map_err(|e| ModemError::InvalidConfig(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            session: AudioSessionConfig::default(),
            restart_debounce_ms: 1000,
            rate_window_ms: 1000,
            rate_monitor_enabled: false,
            render_queue_capacity: 64,
        }
    }
}
