use std::fmt;

use super::direction::ModemDirection;

/// Human-readable modem state shown by the UI.
///
/// ```text
/// Stopped → Listening ⇄ Transmitting
///    ↑          ↓
///    └──── error statuses (terminal until the next start attempt)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModemStatus {
    Stopped,
    Listening,
    Transmitting,
    InputUnavailable,
    AwaitingPermission,
    PermissionDenied,
    ConfigurationFailed(String),
    EncoderInitFailed,
    DecoderInitFailed,
    EngineStartFailed(String),
    DecodeFailed,
}

impl ModemStatus {
    pub fn for_direction(direction: ModemDirection) -> Self {
        match direction {
            ModemDirection::Listening => Self::Listening,
            ModemDirection::Transmitting => Self::Transmitting,
        }
    }

    pub fn is_listening(&self) -> bool {
        matches!(self, Self::Listening)
    }

    pub fn is_transmitting(&self) -> bool {
        matches!(self, Self::Transmitting)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Whether this status came from a failed start attempt.
    pub fn is_startup_failure(&self) -> bool {
        matches!(
            self,
            Self::InputUnavailable
                | Self::AwaitingPermission
                | Self::PermissionDenied
                | Self::ConfigurationFailed(_)
                | Self::EncoderInitFailed
                | Self::DecoderInitFailed
                | Self::EngineStartFailed(_)
        )
    }
}

impl fmt::Display for ModemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => f.write_str("Stopped"),
            Self::Listening => f.write_str("Listening"),
            Self::Transmitting => f.write_str("Transmitting"),
            Self::InputUnavailable => f.write_str("Audio input unavailable"),
            Self::AwaitingPermission => f.write_str("Waiting for microphone permission"),
            Self::PermissionDenied => f.write_str("Microphone permission denied"),
            Self::ConfigurationFailed(reason) => {
                write!(f, "Session configuration failed: {}", reason)
            }
            Self::EncoderInitFailed => f.write_str("Encoder initialization failed"),
            Self::DecoderInitFailed => f.write_str("Decoder initialization failed"),
            Self::EngineStartFailed(reason) => write!(f, "Audio engine failed to start: {}", reason),
            Self::DecodeFailed => f.write_str("Decoding failed"),
        }
    }
}
