/// Bytes in one encoded message.
pub const PAYLOAD_CAPACITY: usize = 256;

/// Size of the decoder output buffer: the payload plus a terminating NUL.
pub const DECODED_PAYLOAD_LEN: usize = PAYLOAD_CAPACITY + 1;

/// Most samples the decoder accepts in a single feed: one symbol plus its
/// guard interval.
pub const DECODER_FEED_LIMIT: usize = 288;

/// Symbol encoder/decoder consumed by the modem front end.
///
/// Implementations wrap the physical-layer library and own its
/// synchronization. The front end guarantees that the encoder is only used
/// while transmitting and the decoder only while listening, so a codec never
/// sees both directions in the same render cycle.
pub trait ModemCodec: Send + Sync {
    /// Allocate the encoder. Safe to call on every engine start.
    fn create_encoder(&self) -> bool;

    /// Allocate the decoder. Safe to call on every engine start.
    fn create_decoder(&self) -> bool;

    /// Begin encoding `payload`. Called on the control thread before the
    /// first sample of the message is pulled.
    fn init_encoder(&self, payload: &[u8; PAYLOAD_CAPACITY]);

    /// Fill `samples` with the next stretch of the waveform. Returns true once
    /// the message has been fully emitted (the remaining samples are silence).
    ///
    /// Called on the real-time thread.
    fn read_encoder(&self, samples: &mut [f32]) -> bool;

    /// Push at most [`DECODER_FEED_LIMIT`] samples. Returns true when a
    /// complete frame is ready to fetch.
    ///
    /// Called on the real-time thread.
    fn feed_decoder(&self, samples: &[f32]) -> bool;

    /// Copy the decoded frame into `payload`. Returns the number of corrected
    /// bit errors, or a negative value when the frame could not be decoded.
    fn fetch_decoder(&self, payload: &mut [u8; DECODED_PAYLOAD_LEN]) -> i32;
}
