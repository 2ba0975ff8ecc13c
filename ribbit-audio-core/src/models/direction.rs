use std::sync::atomic::{AtomicU64, Ordering};

/// Half-duplex direction of the modem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModemDirection {
    Listening,
    Transmitting,
}

const TRANSMITTING_BIT: u64 = 1;

/// Atomically observed direction, shared between the control thread (the
/// only writer) and the real-time render contexts.
///
/// The low bit holds the direction, the remaining bits count transmissions.
/// The epoch lets the playback context signal completion exactly once per
/// message and lets the controller ignore stale completion signals.
#[derive(Debug, Default)]
pub struct DirectionFlag {
    word: AtomicU64,
}

impl DirectionFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current direction and transmission epoch.
    pub fn load(&self) -> (ModemDirection, u64) {
        decode(self.word.load(Ordering::Acquire))
    }

    pub fn direction(&self) -> ModemDirection {
        self.load().0
    }

    pub fn is_listening(&self) -> bool {
        self.direction() == ModemDirection::Listening
    }

    pub fn is_transmitting(&self) -> bool {
        self.direction() == ModemDirection::Transmitting
    }

    /// Listening → Transmitting. Returns the new epoch, or `None` if a
    /// transmission is already in progress.
    pub fn begin_transmit(&self) -> Option<u64> {
        let current = self.word.load(Ordering::Acquire);
        let (direction, epoch) = decode(current);
        if direction == ModemDirection::Transmitting {
            return None;
        }
        let next_epoch = epoch + 1;
        let next = encode(ModemDirection::Transmitting, next_epoch);
        self.word
            .compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| next_epoch)
    }

    /// Transmitting(epoch) → Listening. Returns false when the flag is not
    /// transmitting that epoch.
    pub fn finish_transmit(&self, epoch: u64) -> bool {
        let expected = encode(ModemDirection::Transmitting, epoch);
        let next = encode(ModemDirection::Listening, epoch);
        self.word
            .compare_exchange(expected, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

fn encode(direction: ModemDirection, epoch: u64) -> u64 {
    let bit = match direction {
        ModemDirection::Listening => 0,
        ModemDirection::Transmitting => TRANSMITTING_BIT,
    };
    (epoch << 1) | bit
}

fn decode(word: u64) -> (ModemDirection, u64) {
    let direction = if word & TRANSMITTING_BIT != 0 {
        ModemDirection::Transmitting
    } else {
        ModemDirection::Listening
    };
    (direction, word >> 1)
}
