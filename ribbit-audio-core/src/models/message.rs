use crate::traits::modem_codec::{DECODED_PAYLOAD_LEN, PAYLOAD_CAPACITY};

/// A message recovered by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    /// Payload bytes up to the first NUL.
    pub payload: Vec<u8>,
    /// Number of bit errors corrected by the decoder.
    pub bit_flips: u32,
}

impl DecodedMessage {
    /// Build from the decoder's NUL-terminated output buffer.
    pub fn from_buffer(buffer: &[u8; DECODED_PAYLOAD_LEN], bit_flips: u32) -> Self {
        let payload = &buffer[..PAYLOAD_CAPACITY];
        let len = payload.iter().position(|&b| b == 0).unwrap_or(PAYLOAD_CAPACITY);
        Self {
            payload: payload[..len].to_vec(),
            bit_flips,
        }
    }

    /// Payload as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}
