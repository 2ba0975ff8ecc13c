use crate::traits::modem_codec::DECODED_PAYLOAD_LEN;

/// Pipeline stage measured by the rate monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    /// Raw hardware frames delivered to the capture callback.
    CaptureInput,
    /// Frames produced by the format converter.
    CaptureConverted,
    /// Samples handed to the decoder.
    DecoderFeed,
    /// Samples pulled from the encoder.
    EncoderOutput,
}

impl PipelineStage {
    pub const COUNT: usize = 4;

    pub const ALL: [PipelineStage; Self::COUNT] = [
        Self::CaptureInput,
        Self::CaptureConverted,
        Self::DecoderFeed,
        Self::EncoderOutput,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::CaptureInput => 0,
            Self::CaptureConverted => 1,
            Self::DecoderFeed => 2,
            Self::EncoderOutput => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::CaptureInput => "capture-input",
            Self::CaptureConverted => "capture-converted",
            Self::DecoderFeed => "decoder-feed",
            Self::EncoderOutput => "encoder-output",
        }
    }
}

/// Events posted by the real-time render contexts to the control thread.
///
/// Every variant is `Copy` so posting never allocates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModemEvent {
    /// The encoder reported the message with this epoch fully emitted.
    TransmissionFinished { epoch: u64 },
    /// The decoder produced a frame.
    MessageDecoded {
        payload: [u8; DECODED_PAYLOAD_LEN],
        bit_flips: i32,
    },
    /// The decoder produced a frame that failed to decode.
    DecodeFailed,
    /// One throughput window elapsed for a stage.
    RateMeasured {
        stage: PipelineStage,
        samples_per_sec: f64,
    },
}

/// Phase of a platform session interruption (phone call, alarm, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptionPhase {
    Began,
    Ended { should_resume: bool },
}

/// Why the platform changed the audio route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteChangeReason {
    NewDeviceAvailable,
    OldDeviceUnavailable,
    CategoryChange,
    Override,
    WakeFromSleep,
    NoSuitableRoute,
    ConfigurationChange,
    Unknown,
}

impl RouteChangeReason {
    /// Whether the route change adds or removes a device and so warrants a
    /// restart of the audio graph.
    pub fn requires_restart(self) -> bool {
        matches!(self, Self::NewDeviceAvailable | Self::OldDeviceUnavailable)
    }
}

/// Lifecycle notifications delivered by the platform session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionNotification {
    Interruption(InterruptionPhase),
    RouteChange(RouteChangeReason),
}
