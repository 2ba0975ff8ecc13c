/// Answer to a converter pull.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PullStatus<'a> {
    /// Interleaved input frames.
    HaveData(&'a [f32]),
    /// Nothing more in this render cycle; the converter returns what it has.
    NoDataNow,
    /// The source is finished for good.
    EndOfStream,
}

/// Input adapter that offers one render cycle's frames exactly once.
///
/// The first pull yields the frames; every later pull yields
/// [`PullStatus::NoDataNow`], so the converter drains without looping.
#[derive(Debug)]
pub struct SingleShotInput<'a> {
    frames: Option<&'a [f32]>,
}

impl<'a> SingleShotInput<'a> {
    pub fn new(frames: &'a [f32]) -> Self {
        Self {
            frames: Some(frames),
        }
    }

    pub fn pull(&mut self) -> PullStatus<'a> {
        match self.frames.take() {
            Some(frames) => PullStatus::HaveData(frames),
            None => PullStatus::NoDataNow,
        }
    }
}

/// Streaming sample-rate and channel converter producing mono output.
///
/// Linear interpolation with the fractional read position and the last input
/// sample carried across blocks, so consecutive render cycles join without a
/// discontinuity. Output is written into a caller-owned slice; the converter
/// itself never allocates after construction.
#[derive(Debug, Clone)]
pub struct FormatConverter {
    input_rate: f64,
    output_rate: f64,
    step: f64,
    /// Read position in the virtual sequence `[last, x0, x1, ...]`.
    position: f64,
    last: f32,
}

impl FormatConverter {
    pub fn new(input_rate: f64, output_rate: f64) -> Self {
        Self {
            input_rate,
            output_rate,
            step: input_rate / output_rate,
            position: 1.0,
            last: 0.0,
        }
    }

    pub fn input_rate(&self) -> f64 {
        self.input_rate
    }

    pub fn output_rate(&self) -> f64 {
        self.output_rate
    }

    /// Change the input rate (e.g. after a route change) and drop the
    /// interpolation state.
    pub fn set_input_rate(&mut self, input_rate: f64) {
        *self = Self::new(input_rate, self.output_rate);
    }

    pub fn reset(&mut self) {
        self.position = 1.0;
        self.last = 0.0;
    }

    /// False when either rate is zero, negative or not finite. Such a
    /// converter produces nothing.
    pub fn is_usable(&self) -> bool {
        is_valid_rate(self.input_rate) && is_valid_rate(self.output_rate)
    }

    fn is_passthrough(&self) -> bool {
        (self.input_rate - self.output_rate).abs() < 0.01
    }

    /// Pull input until the source has nothing more for this cycle and write
    /// converted samples into `output`. Returns the number of samples written.
    pub fn convert<'a, F>(&mut self, output: &mut [f32], channels: u16, mut pull: F) -> usize
    where
        F: FnMut() -> PullStatus<'a>,
    {
        let mut written = 0;
        while let PullStatus::HaveData(frames) = pull() {
            written += self.process(frames, channels, &mut output[written..]);
        }
        written
    }

    /// Convert one block of interleaved frames. Samples that do not fit in
    /// `output` are dropped; the read position still advances so timing is
    /// preserved.
    pub fn process(&mut self, frames: &[f32], channels: u16, output: &mut [f32]) -> usize {
        let channels = channels.max(1) as usize;
        let frame_count = frames.len() / channels;
        if frame_count == 0 || !self.is_usable() {
            return 0;
        }

        if self.is_passthrough() {
            let count = frame_count.min(output.len());
            for (i, sample) in output[..count].iter_mut().enumerate() {
                *sample = mono_frame(frames, i, channels);
            }
            self.last = mono_frame(frames, frame_count - 1, channels);
            return count;
        }

        let mut written = 0;
        let end = frame_count as f64;
        while self.position < end {
            if written < output.len() {
                let index = self.position as usize;
                let fraction = (self.position - index as f64) as f32;
                let a = if index == 0 {
                    self.last
                } else {
                    mono_frame(frames, index - 1, channels)
                };
                let b = mono_frame(frames, index, channels);
                output[written] = a * (1.0 - fraction) + b * fraction;
                written += 1;
            }
            self.position += self.step;
        }
        self.position -= end;
        self.last = mono_frame(frames, frame_count - 1, channels);
        written
    }
}

/// A sample rate the converter can step through.
pub fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

fn mono_frame(frames: &[f32], index: usize, channels: usize) -> f32 {
    if channels == 1 {
        return frames[index];
    }
    let start = index * channels;
    let sum: f32 = frames[start..start + channels].iter().sum();
    sum / channels as f32
}
