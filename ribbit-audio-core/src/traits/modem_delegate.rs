use crate::models::events::PipelineStage;
use crate::models::message::DecodedMessage;
use crate::models::status::ModemStatus;

/// Event delegate for modem notifications.
///
/// All methods are called from the control thread, never from the audio
/// thread. Implementations should marshal to the UI thread if needed.
pub trait ModemDelegate: Send + Sync {
    /// Called whenever the status string changes.
    fn on_status_changed(&self, status: &ModemStatus);

    /// Called for every successfully decoded message.
    fn on_message_received(&self, message: &DecodedMessage);

    /// Called once per measurement window when rate monitoring is enabled.
    fn on_rate_measured(&self, _stage: PipelineStage, _samples_per_sec: f64) {}
}
