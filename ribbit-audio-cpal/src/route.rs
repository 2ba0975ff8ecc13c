//! Route state shared by [`CpalSession`](crate::CpalSession) and
//! [`CpalEngine`](crate::CpalEngine).

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig, SupportedStreamConfig, SupportedStreamConfigRange};

use ribbit_audio_core::models::config::SessionCategory;
use ribbit_audio_core::models::error::ModemError;
use ribbit_audio_core::session::control::SessionNotifier;

/// A device plus the stream configuration negotiated for it.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedStream {
    pub device_name: String,
    pub config: StreamConfig,
}

#[derive(Debug, Default)]
pub(crate) struct RouteState {
    pub category: Option<SessionCategory>,
    pub preferred_rate: Option<u32>,
    pub active: bool,
    pub input: Option<ResolvedStream>,
    pub output: Option<ResolvedStream>,
    pub notifier: Option<SessionNotifier>,
}

impl RouteState {
    pub fn wants_input(&self) -> bool {
        !matches!(self.category, Some(SessionCategory::Playback))
    }

    pub fn wants_output(&self) -> bool {
        !matches!(self.category, Some(SessionCategory::Record))
    }
}

pub(crate) fn platform_error(context: &str, err: impl std::fmt::Display) -> ModemError {
    ModemError::Platform(format!("{}: {}", context, err))
}

/// Pick an f32 stream configuration.
///
/// Order of preference: the narrowest f32 range containing `preferred`, the
/// device default if it is f32, then the narrowest f32 range at its highest
/// rate.
pub(crate) fn pick_config(
    ranges: &[SupportedStreamConfigRange],
    default: Option<&SupportedStreamConfig>,
    preferred: Option<u32>,
) -> Option<StreamConfig> {
    let f32_ranges = || ranges.iter().filter(|r| r.sample_format() == SampleFormat::F32);

    if let Some(rate) = preferred {
        let matching = f32_ranges()
            .filter(|r| supports_rate(r, rate))
            .min_by_key(|r| r.channels());
        if let Some(range) = matching {
            return Some(range.clone().with_sample_rate(SampleRate(rate)).config());
        }
    }

    if let Some(default) = default {
        if default.sample_format() == SampleFormat::F32 {
            return Some(default.config());
        }
    }

    f32_ranges()
        .min_by_key(|r| r.channels())
        .map(|r| r.clone().with_max_sample_rate().config())
}

pub(crate) fn supports_rate(range: &SupportedStreamConfigRange, rate: u32) -> bool {
    range.min_sample_rate().0 <= rate && rate <= range.max_sample_rate().0
}

pub(crate) fn resolve_input(host: &cpal::Host, preferred: Option<u32>) -> Result<ResolvedStream, ModemError> {
    let device = host
        .default_input_device()
        .ok_or(ModemError::InputUnavailable)?;
    let device_name = device.name().map_err(|e| platform_error("input device name", e))?;
    let ranges: Vec<_> = device
        .supported_input_configs()
        .map_err(|e| platform_error("input configurations", e))?
        .collect();
    let default = device.default_input_config().ok();
    let config = pick_config(&ranges, default.as_ref(), preferred)
        .ok_or_else(|| ModemError::Platform(format!("{} has no f32 input configuration", device_name)))?;
    Ok(ResolvedStream { device_name, config })
}

pub(crate) fn resolve_output(host: &cpal::Host, preferred: Option<u32>) -> Result<ResolvedStream, ModemError> {
    let device = host
        .default_output_device()
        .ok_or_else(|| ModemError::Platform("no output device".into()))?;
    let device_name = device.name().map_err(|e| platform_error("output device name", e))?;
    let ranges: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| platform_error("output configurations", e))?
        .collect();
    let default = device.default_output_config().ok();
    let config = pick_config(&ranges, default.as_ref(), preferred)
        .ok_or_else(|| ModemError::Platform(format!("{} has no f32 output configuration", device_name)))?;
    Ok(ResolvedStream { device_name, config })
}

pub(crate) fn find_input_device(host: &cpal::Host, name: &str) -> Option<cpal::Device> {
    host.input_devices()
        .ok()?
        .find(|d| d.name().map(|n| n == name).unwrap_or(false))
}

pub(crate) fn find_output_device(host: &cpal::Host, name: &str) -> Option<cpal::Device> {
    host.output_devices()
        .ok()?
        .find(|d| d.name().map(|n| n == name).unwrap_or(false))
}
