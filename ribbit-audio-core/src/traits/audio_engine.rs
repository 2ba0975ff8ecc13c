use crate::models::config::StreamFormat;
use crate::models::error::ModemError;

/// Real-time capture entry point, invoked once per hardware input buffer.
///
/// Runs on the audio thread: implementations must not block or allocate.
pub trait CaptureRenderer: Send {
    /// `input` holds interleaved frames at `sample_rate` with `channels`
    /// channels.
    fn render_capture(&mut self, input: &[f32], sample_rate: f64, channels: u16);
}

/// Real-time playback entry point.
///
/// Runs on the audio thread: implementations must not block or allocate.
pub trait PlaybackRenderer: Send {
    /// Fill `output` with mono samples at the format given to
    /// [`AudioEngine::attach_playback`].
    fn render_playback(&mut self, output: &mut [f32]);
}

/// Platform audio engine (input node, output mixer and the render thread).
///
/// Attached renderers stay owned by the engine for its lifetime; the engine
/// is only stopped and started afterwards.
pub trait AudioEngine: Send {
    fn attach_capture(&mut self, renderer: Box<dyn CaptureRenderer>) -> Result<(), ModemError>;

    fn attach_playback(
        &mut self,
        renderer: Box<dyn PlaybackRenderer>,
        format: StreamFormat,
    ) -> Result<(), ModemError>;

    fn start(&mut self) -> Result<(), ModemError>;

    /// Stop rendering. Safe to call when not running.
    fn stop(&mut self);

    fn is_running(&self) -> bool;
}
