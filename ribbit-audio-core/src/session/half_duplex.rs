use std::sync::Arc;

use crate::models::composer::payload_len;
use crate::models::direction::{DirectionFlag, ModemDirection};
use crate::models::error::ModemError;
use crate::traits::modem_codec::{ModemCodec, PAYLOAD_CAPACITY};

/// Listening/Transmitting state machine.
///
/// ```text
///             request_transmit (encoder initialized first)
/// Listening ────────────────────────────────────────────→ Transmitting
///     ↑                                                        │
///     └──────────── complete(epoch): encoder exhausted ────────┘
/// ```
///
/// The controller is the only writer of the direction flag. The render
/// contexts read it before touching the decoder or the encoder.
pub struct HalfDuplexController {
    direction: Arc<DirectionFlag>,
    codec: Arc<dyn ModemCodec>,
}

impl HalfDuplexController {
    pub fn new(codec: Arc<dyn ModemCodec>) -> Self {
        Self {
            direction: Arc::new(DirectionFlag::new()),
            codec,
        }
    }

    pub fn direction_flag(&self) -> Arc<DirectionFlag> {
        Arc::clone(&self.direction)
    }

    pub fn current(&self) -> ModemDirection {
        self.direction.direction()
    }

    /// Validate `payload`, hand it to the encoder and switch to
    /// Transmitting. Returns the transmission epoch.
    ///
    /// The payload length counts bytes up to the first NUL.
    pub fn request_transmit(&self, payload: &[u8], engine_running: bool) -> Result<u64, ModemError> {
        if self.direction.is_transmitting() {
            return Err(ModemError::AlreadyTransmitting);
        }
        if !engine_running {
            return Err(ModemError::EngineNotRunning);
        }

        let len = payload_len(payload);
        if len == 0 {
            return Err(ModemError::EmptyPayload);
        }
        if len > PAYLOAD_CAPACITY {
            return Err(ModemError::PayloadTooLarge { len });
        }

        let mut buffer = [0u8; PAYLOAD_CAPACITY];
        buffer[..len].copy_from_slice(&payload[..len]);
        self.codec.init_encoder(&buffer);

        self.direction
            .begin_transmit()
            .ok_or(ModemError::AlreadyTransmitting)
    }

    /// Return to Listening after the encoder finished `epoch`. Stale or
    /// duplicate completions are ignored and return false.
    pub fn complete(&self, epoch: u64) -> bool {
        self.direction.finish_transmit(epoch)
    }
}
