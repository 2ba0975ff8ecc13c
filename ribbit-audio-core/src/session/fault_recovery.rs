use std::time::{Duration, Instant};

use crate::models::events::{InterruptionPhase, SessionNotification};

/// The one scheduled restart, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRestart {
    pub generation: u64,
    pub deadline: Instant,
}

/// Single-shot restart timer. Scheduling replaces whatever was pending, so a
/// burst of triggers collapses into one restart after the last of them.
#[derive(Debug)]
pub struct RestartDebouncer {
    interval: Duration,
    generation: u64,
    pending: Option<PendingRestart>,
}

impl RestartDebouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            generation: 0,
            pending: None,
        }
    }

    pub fn schedule(&mut self, now: Instant) -> PendingRestart {
        self.generation += 1;
        let pending = PendingRestart {
            generation: self.generation,
            deadline: now + self.interval,
        };
        self.pending = Some(pending);
        pending
    }

    /// Returns true if a restart was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Remove and return the pending restart once its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<PendingRestart> {
        match self.pending {
            Some(pending) if now >= pending.deadline => self.pending.take(),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// What the orchestrator should do about a session notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Stop the graph now.
    Stop,
    RestartScheduled(PendingRestart),
    Ignore,
}

/// Notification policy plus the restart debouncer.
#[derive(Debug)]
pub struct FaultRecovery {
    debouncer: RestartDebouncer,
}

impl FaultRecovery {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debouncer: RestartDebouncer::new(debounce),
        }
    }

    pub fn on_notification(&mut self, notification: SessionNotification, now: Instant) -> RecoveryAction {
        match notification {
            SessionNotification::Interruption(InterruptionPhase::Began) => {
                self.debouncer.cancel();
                RecoveryAction::Stop
            }
            SessionNotification::Interruption(InterruptionPhase::Ended { should_resume: true }) => {
                RecoveryAction::RestartScheduled(self.debouncer.schedule(now))
            }
            SessionNotification::Interruption(InterruptionPhase::Ended { should_resume: false }) => {
                RecoveryAction::Ignore
            }
            SessionNotification::RouteChange(reason) if reason.requires_restart() => {
                RecoveryAction::RestartScheduled(self.debouncer.schedule(now))
            }
            SessionNotification::RouteChange(_) => RecoveryAction::Ignore,
        }
    }

    pub fn take_due(&mut self, now: Instant) -> Option<PendingRestart> {
        self.debouncer.take_due(now)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub fn cancel(&mut self) -> bool {
        self.debouncer.cancel()
    }
}
