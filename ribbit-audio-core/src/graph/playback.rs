use std::sync::Arc;

use crate::models::direction::{DirectionFlag, ModemDirection};
use crate::models::events::{ModemEvent, PipelineStage};
use crate::processing::rate_monitor::RateMonitor;
use crate::traits::audio_engine::PlaybackRenderer;
use crate::traits::modem_codec::ModemCodec;

use super::render_queue::RenderQueue;

/// Playback path state: pulls the encoder while transmitting, silence
/// otherwise.
///
/// The context never changes direction itself. When the encoder reports the
/// message emitted it posts `TransmissionFinished` for the current epoch (once,
/// retrying on the next cycle if the queue was full) and plays silence until
/// the controller flips back to Listening.
pub struct PlaybackContext {
    direction: Arc<DirectionFlag>,
    codec: Arc<dyn ModemCodec>,
    queue: RenderQueue,
    rates: Option<RateMonitor>,
    finished_epoch: Option<u64>,
    signalled: bool,
}

impl PlaybackContext {
    pub fn new(
        direction: Arc<DirectionFlag>,
        codec: Arc<dyn ModemCodec>,
        queue: RenderQueue,
        rates: Option<RateMonitor>,
    ) -> Self {
        Self {
            direction,
            codec,
            queue,
            rates,
            finished_epoch: None,
            signalled: false,
        }
    }
}

impl PlaybackRenderer for PlaybackContext {
    fn render_playback(&mut self, output: &mut [f32]) {
        let (direction, epoch) = self.direction.load();
        if direction == ModemDirection::Listening {
            output.fill(0.0);
            return;
        }

        if self.finished_epoch == Some(epoch) {
            output.fill(0.0);
            if !self.signalled {
                self.signalled = self.queue.post(ModemEvent::TransmissionFinished { epoch });
            }
            return;
        }

        let done = self.codec.read_encoder(output);
        if let Some(rates) = self.rates.as_mut() {
            rates.record(PipelineStage::EncoderOutput, output.len());
        }
        if done {
            self.finished_epoch = Some(epoch);
            self.signalled = self.queue.post(ModemEvent::TransmissionFinished { epoch });
        }
    }
}
