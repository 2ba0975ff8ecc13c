use thiserror::Error;

use super::status::ModemStatus;

/// Errors produced by the modem front end.
///
/// Startup errors abort the remaining start sequence and are surfaced as a
/// terminal [`ModemStatus`]; none of them stop the process.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModemError {
    #[error("audio input unavailable")]
    InputUnavailable,

    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("microphone permission pending")]
    PermissionPending,

    #[error("session configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("encoder initialization failed")]
    EncoderInitFailed,

    #[error("decoder initialization failed")]
    DecoderInitFailed,

    #[error("audio engine failed to start: {0}")]
    EngineStartFailed(String),

    #[error("decoding failed")]
    DecodeFailed,

    #[error("payload is empty")]
    EmptyPayload,

    #[error("payload of {len} bytes exceeds capacity")]
    PayloadTooLarge { len: usize },

    #[error("a transmission is already in progress")]
    AlreadyTransmitting,

    #[error("audio engine is not running")]
    EngineNotRunning,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("platform error: {0}")]
    Platform(String),

    #[error("modem runtime has shut down")]
    Shutdown,
}

impl ModemError {
    /// The status reported to the UI when this error aborts startup or
    /// interrupts reception.
    pub fn status(&self) -> ModemStatus {
        match self {
            Self::InputUnavailable => ModemStatus::InputUnavailable,
            Self::PermissionDenied => ModemStatus::PermissionDenied,
            Self::PermissionPending => ModemStatus::AwaitingPermission,
            Self::ConfigurationFailed(reason) => ModemStatus::ConfigurationFailed(reason.clone()),
            Self::EncoderInitFailed => ModemStatus::EncoderInitFailed,
            Self::DecoderInitFailed => ModemStatus::DecoderInitFailed,
            Self::EngineStartFailed(reason) => ModemStatus::EngineStartFailed(reason.clone()),
            Self::DecodeFailed => ModemStatus::DecodeFailed,
            other => ModemStatus::EngineStartFailed(other.to_string()),
        }
    }
}
