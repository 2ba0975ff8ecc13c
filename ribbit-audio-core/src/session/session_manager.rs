use crate::models::config::AudioSessionConfig;
use crate::models::error::ModemError;
use crate::traits::audio_session::{AudioSession, PermissionCallback, PermissionStatus};

use super::control::SessionNotifier;

/// Result of [`SessionManager::acquire_permission`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionOutcome {
    Granted,
    Denied,
    /// A prompt is outstanding; the callback fires when the user answers.
    Requested,
}

/// Microphone permission and session configuration.
pub struct SessionManager<S: AudioSession> {
    session: S,
    request_outstanding: bool,
}

impl<S: AudioSession> SessionManager<S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            request_outstanding: false,
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn subscribe(&mut self, notifier: SessionNotifier) {
        self.session.subscribe(notifier);
    }

    pub fn is_input_available(&self) -> bool {
        self.session.is_input_available()
    }

    /// Granted or denied answers are returned directly. An undetermined state
    /// prompts the user (at most one prompt at a time) and returns
    /// `Requested` without waiting.
    pub fn acquire_permission(&mut self, on_resolved: PermissionCallback) -> PermissionOutcome {
        match self.session.record_permission() {
            PermissionStatus::Granted => PermissionOutcome::Granted,
            PermissionStatus::Denied => PermissionOutcome::Denied,
            PermissionStatus::Undetermined => {
                if !self.request_outstanding {
                    log::info!("Requesting microphone permission");
                    self.request_outstanding = true;
                    self.session.request_record_permission(on_resolved);
                }
                PermissionOutcome::Requested
            }
        }
    }

    /// Clear the outstanding prompt once its answer has arrived.
    pub fn permission_resolved(&mut self) {
        self.request_outstanding = false;
    }

    /// Apply category, preferred rate and activation. Returns the sample rate
    /// the hardware runs at.
    ///
    /// A rejected preferred rate is tolerated: the capture path converts from
    /// whatever native rate the hardware offers.
    pub fn configure(&mut self, config: &AudioSessionConfig) -> Result<f64, ModemError> {
        self.session
            .set_category(config.category)
            .map_err(|e| ModemError::ConfigurationFailed(format!("category: {}", e)))?;

        if let Err(e) = self.session.set_preferred_sample_rate(config.sample_rate) {
            log::warn!(
                "Preferred sample rate {} Hz rejected, using hardware rate: {}",
                config.sample_rate,
                e
            );
        }

        self.session
            .set_active(true)
            .map_err(|e| ModemError::ConfigurationFailed(format!("activation: {}", e)))?;

        let rate = self.session.sample_rate();
        log::info!("Audio session active at {} Hz", rate);
        Ok(rate)
    }

    pub fn deactivate(&mut self) {
        if let Err(e) = self.session.set_active(false) {
            log::warn!("Failed to deactivate audio session: {}", e);
        }
    }
}
