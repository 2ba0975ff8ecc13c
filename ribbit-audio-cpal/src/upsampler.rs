use std::sync::Arc;

use parking_lot::Mutex;

use ribbit_audio_core::traits::audio_engine::PlaybackRenderer;

/// Samples requested from the renderer per pull, at the modem rate.
const PULL_CHUNK: usize = 256;

pub(crate) type SharedPlayback = Arc<Mutex<Box<dyn PlaybackRenderer>>>;

/// Adapts a mono modem-rate [`PlaybackRenderer`] to an interleaved device
/// stream: pulls modem samples on demand, interpolates them up to the device
/// rate and copies each sample to every channel.
pub(crate) struct PlaybackUpsampler {
    renderer: SharedPlayback,
    channels: usize,
    /// Modem samples consumed per device frame.
    step: f64,
    phase: f64,
    current: f32,
    next: f32,
    chunk: Box<[f32]>,
    cursor: usize,
}

impl PlaybackUpsampler {
    pub fn new(renderer: SharedPlayback, modem_rate: f64, device_rate: f64, channels: u16) -> Self {
        Self {
            renderer,
            channels: channels.max(1) as usize,
            step: modem_rate / device_rate,
            phase: 0.0,
            current: 0.0,
            next: 0.0,
            chunk: vec![0.0; PULL_CHUNK].into_boxed_slice(),
            cursor: PULL_CHUNK,
        }
    }

    fn pull(&mut self) -> f32 {
        if self.cursor == self.chunk.len() {
            match self.renderer.try_lock() {
                Some(mut renderer) => renderer.render_playback(&mut self.chunk),
                None => self.chunk.fill(0.0),
            }
            self.cursor = 0;
        }
        let sample = self.chunk[self.cursor];
        self.cursor += 1;
        sample
    }

    /// Fill one device buffer of interleaved frames.
    pub fn render(&mut self, output: &mut [f32]) {
        let channels = self.channels;
        for frame in output.chunks_mut(channels) {
            self.phase += self.step;
            while self.phase >= 1.0 {
                self.phase -= 1.0;
                self.current = self.next;
                self.next = self.pull();
            }
            let value = self.current + (self.next - self.current) * self.phase as f32;
            frame.fill(value);
        }
    }
}
