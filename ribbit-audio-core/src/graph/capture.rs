use std::sync::Arc;

use crate::models::config::AudioSessionConfig;
use crate::models::direction::DirectionFlag;
use crate::models::events::{ModemEvent, PipelineStage};
use crate::processing::converter::{is_valid_rate, FormatConverter, SingleShotInput};
use crate::processing::rate_monitor::RateMonitor;
use crate::traits::audio_engine::CaptureRenderer;
use crate::traits::modem_codec::{ModemCodec, DECODED_PAYLOAD_LEN, DECODER_FEED_LIMIT};

use super::render_queue::RenderQueue;

/// Capture path state: converter, conversion buffer and decoder hand-off.
///
/// ```text
/// [hardware input] → [FormatConverter] → [conversion buffer] ─(Listening)→ [decoder]
///                                                                  └→ MessageDecoded / DecodeFailed
/// ```
///
/// All buffers are allocated in [`CaptureContext::new`]; a render cycle only
/// reads and writes them.
pub struct CaptureContext {
    converter: FormatConverter,
    buffer: Box<[f32]>,
    decoded: [u8; DECODED_PAYLOAD_LEN],
    direction: Arc<DirectionFlag>,
    codec: Arc<dyn ModemCodec>,
    queue: RenderQueue,
    rates: Option<RateMonitor>,
}

impl CaptureContext {
    pub fn new(
        config: &AudioSessionConfig,
        direction: Arc<DirectionFlag>,
        codec: Arc<dyn ModemCodec>,
        queue: RenderQueue,
        rates: Option<RateMonitor>,
    ) -> Self {
        Self {
            // Input rate is corrected on the first callback.
            converter: FormatConverter::new(config.sample_rate, config.sample_rate),
            buffer: vec![0.0; config.conversion_capacity()].into_boxed_slice(),
            decoded: [0; DECODED_PAYLOAD_LEN],
            direction,
            codec,
            queue,
            rates,
        }
    }

    fn record(&mut self, stage: PipelineStage, count: usize) {
        if let Some(rates) = self.rates.as_mut() {
            rates.record(stage, count);
        }
    }
}

impl CaptureRenderer for CaptureContext {
    fn render_capture(&mut self, input: &[f32], sample_rate: f64, channels: u16) {
        if channels == 0 || input.is_empty() || !is_valid_rate(sample_rate) {
            return;
        }
        if (self.converter.input_rate() - sample_rate).abs() > f64::EPSILON {
            self.converter.set_input_rate(sample_rate);
        }
        self.record(PipelineStage::CaptureInput, input.len() / channels as usize);

        let mut source = SingleShotInput::new(input);
        let produced = self
            .converter
            .convert(&mut self.buffer, channels, || source.pull());
        self.record(PipelineStage::CaptureConverted, produced);

        if !self.direction.is_listening() {
            return;
        }

        for start in (0..produced).step_by(DECODER_FEED_LIMIT) {
            let end = (start + DECODER_FEED_LIMIT).min(produced);
            self.record(PipelineStage::DecoderFeed, end - start);
            if !self.codec.feed_decoder(&self.buffer[start..end]) {
                continue;
            }
            let bit_flips = self.codec.fetch_decoder(&mut self.decoded);
            let event = if bit_flips >= 0 {
                ModemEvent::MessageDecoded {
                    payload: self.decoded,
                    bit_flips,
                }
            } else {
                ModemEvent::DecodeFailed
            };
            self.queue.post(event);
        }
    }
}
