use crate::models::config::SessionCategory;
use crate::models::error::ModemError;
use crate::session::control::SessionNotifier;

/// Microphone access as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// The user has not been asked yet.
    Undetermined,
}

/// Callback receiving the outcome of a permission prompt. May fire on any
/// thread.
pub type PermissionCallback = Box<dyn FnOnce(bool) + Send + 'static>;

/// Platform audio session driven by the [`SessionManager`].
///
/// [`SessionManager`]: crate::session::session_manager::SessionManager
pub trait AudioSession: Send {
    /// Whether an input route (microphone) currently exists.
    fn is_input_available(&self) -> bool;

    fn record_permission(&self) -> PermissionStatus;

    /// Prompt the user for microphone access. Must not block; the outcome is
    /// delivered through `callback`.
    fn request_record_permission(&mut self, callback: PermissionCallback);

    fn set_category(&mut self, category: SessionCategory) -> Result<(), ModemError>;

    fn set_preferred_sample_rate(&mut self, rate: f64) -> Result<(), ModemError>;

    fn set_active(&mut self, active: bool) -> Result<(), ModemError>;

    /// Sample rate the hardware is actually running at.
    fn sample_rate(&self) -> f64;

    /// Register for interruption and route-change notifications. The notifier
    /// is owned by the session and dropped with it.
    fn subscribe(&mut self, _notifier: SessionNotifier) {}
}
