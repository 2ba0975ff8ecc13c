use crossbeam_channel::Sender;

use crate::models::error::ModemError;
use crate::models::events::{InterruptionPhase, RouteChangeReason, SessionNotification};

/// Requests from the UI side.
#[derive(Debug)]
pub enum ModemCommand {
    Start,
    Stop,
    Transmit {
        payload: Vec<u8>,
        reply: Sender<Result<(), ModemError>>,
    },
    Shutdown,
}

/// Everything the control thread reacts to apart from render events.
#[derive(Debug)]
pub enum ControlMessage {
    Command(ModemCommand),
    Notification(SessionNotification),
    /// Outcome of an asynchronous microphone permission prompt.
    PermissionResolved(bool),
}

/// Posts platform session notifications to the control thread.
///
/// Handed to the platform session on construction; cheap to clone and safe
/// to use from any thread.
#[derive(Debug, Clone)]
pub struct SessionNotifier {
    sender: Sender<ControlMessage>,
}

impl SessionNotifier {
    pub fn new(sender: Sender<ControlMessage>) -> Self {
        Self { sender }
    }

    /// Returns false once the control thread is gone.
    pub fn notify(&self, notification: SessionNotification) -> bool {
        self.sender
            .send(ControlMessage::Notification(notification))
            .is_ok()
    }

    pub fn interruption_began(&self) -> bool {
        self.notify(SessionNotification::Interruption(InterruptionPhase::Began))
    }

    pub fn interruption_ended(&self, should_resume: bool) -> bool {
        self.notify(SessionNotification::Interruption(InterruptionPhase::Ended {
            should_resume,
        }))
    }

    pub fn route_changed(&self, reason: RouteChangeReason) -> bool {
        self.notify(SessionNotification::RouteChange(reason))
    }

    pub fn permission_resolved(&self, granted: bool) -> bool {
        self.sender
            .send(ControlMessage::PermissionResolved(granted))
            .is_ok()
    }
}
