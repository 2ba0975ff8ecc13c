use crate::traits::modem_codec::PAYLOAD_CAPACITY;

/// Byte budget of the message composer.
///
/// Counts encoded bytes the way the encoder receives them (a C string), not
/// characters: "é" costs two bytes and the count stops at the first NUL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerBudget {
    pub bytes: usize,
    pub label: String,
    pub transmit_enabled: bool,
}

impl ComposerBudget {
    pub fn evaluate(text: &str) -> Self {
        Self::for_byte_len(payload_len(text.as_bytes()))
    }

    pub fn for_byte_len(bytes: usize) -> Self {
        if bytes <= PAYLOAD_CAPACITY {
            let left = PAYLOAD_CAPACITY - bytes;
            Self {
                bytes,
                label: format!("{} {} left", left, plural(left)),
                transmit_enabled: bytes > 0,
            }
        } else {
            let over = bytes - PAYLOAD_CAPACITY;
            Self {
                bytes,
                label: format!("{} {} over capacity", over, plural(over)),
                transmit_enabled: false,
            }
        }
    }
}

/// Length of `bytes` up to the first NUL.
pub fn payload_len(bytes: &[u8]) -> usize {
    bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len())
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        "byte"
    } else {
        "bytes"
    }
}
