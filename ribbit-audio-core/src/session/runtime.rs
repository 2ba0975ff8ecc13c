use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossbeam_channel::{select, Receiver, Sender};
use parking_lot::RwLock;

use crate::models::error::ModemError;
use crate::models::events::ModemEvent;
use crate::models::status::ModemStatus;
use crate::traits::audio_engine::AudioEngine;
use crate::traits::audio_session::AudioSession;

use super::control::{ControlMessage, ModemCommand, SessionNotifier};
use super::modem_session::ModemSession;

const CONTROL_THREAD: &str = "modem-control";

fn on_control_thread() -> bool {
    thread::current().name() == Some(CONTROL_THREAD)
}

/// Runs a [`ModemSession`] on a dedicated control thread.
///
/// The thread waits on the control channel, the render queue and the restart
/// deadline, and is the only place the session is touched.
pub struct ModemRuntime;

impl ModemRuntime {
    pub fn spawn<S, E>(session: ModemSession<S, E>) -> Result<ModemHandle, ModemError>
    where
        S: AudioSession + 'static,
        E: AudioEngine + 'static,
    {
        let control = session.control_sender();
        let status = session.status_board();
        let notifier = session.notifier();

        let thread = thread::Builder::new()
            .name(CONTROL_THREAD.into())
            .spawn(move || run(session))
            .map_err(|e| ModemError::Platform(format!("failed to spawn control thread: {}", e)))?;

        Ok(ModemHandle {
            control,
            status,
            notifier,
            thread: Some(thread),
        })
    }
}

fn run<S: AudioSession, E: AudioEngine>(mut session: ModemSession<S, E>) {
    let control_rx = session.control_receiver();
    let render_rx = session.render_receiver();
    log::debug!("Control thread started");

    loop {
        session.poll_restart(Instant::now());

        let mut keep_running = true;
        match session.next_deadline() {
            Some(deadline) => {
                let timeout = deadline.saturating_duration_since(Instant::now());
                select! {
                    recv(control_rx) -> message => keep_running = on_control(&mut session, message.ok()),
                    recv(render_rx) -> event => on_event(&mut session, event.ok()),
                    default(timeout) => {}
                }
            }
            None => select! {
                recv(control_rx) -> message => keep_running = on_control(&mut session, message.ok()),
                recv(render_rx) -> event => on_event(&mut session, event.ok()),
            },
        }

        if !keep_running {
            break;
        }
    }

    session.shutdown();
    log::debug!("Control thread finished");
}

fn on_control<S: AudioSession, E: AudioEngine>(
    session: &mut ModemSession<S, E>,
    message: Option<ControlMessage>,
) -> bool {
    match message {
        Some(message) => session.handle_control(message, Instant::now()),
        None => false,
    }
}

fn on_event<S: AudioSession, E: AudioEngine>(session: &mut ModemSession<S, E>, event: Option<ModemEvent>) {
    if let Some(event) = event {
        session.handle_event(event);
        session.report_dropped_events();
    }
}

/// UI-side handle onto a running modem.
///
/// Commands are queued to the control thread; status reads never block on
/// it. Dropping the handle shuts the runtime down.
pub struct ModemHandle {
    control: Sender<ControlMessage>,
    status: Arc<RwLock<ModemStatus>>,
    notifier: SessionNotifier,
    thread: Option<thread::JoinHandle<()>>,
}

impl ModemHandle {
    fn send(&self, command: ModemCommand) -> Result<(), ModemError> {
        self.control
            .send(ControlMessage::Command(command))
            .map_err(|_| ModemError::Shutdown)
    }

    pub fn start(&self) -> Result<(), ModemError> {
        self.send(ModemCommand::Start)
    }

    pub fn stop(&self) -> Result<(), ModemError> {
        self.send(ModemCommand::Stop)
    }

    /// Request a transmission and wait for the control thread to accept or
    /// reject it. Completion is reported through the status.
    ///
    /// Blocks on the control thread. Calling it from a [`ModemDelegate`]
    /// callback, which runs on that thread, would never return, so such calls
    /// fail with [`ModemError::Platform`] instead.
    ///
    /// [`ModemDelegate`]: crate::traits::modem_delegate::ModemDelegate
    pub fn transmit(&self, payload: &[u8]) -> Result<(), ModemError> {
        if on_control_thread() {
            return Err(ModemError::Platform(
                "transmit called from the control thread".into(),
            ));
        }
        let (reply, result) = crossbeam_channel::bounded(1);
        self.send(ModemCommand::Transmit {
            payload: payload.to_vec(),
            reply,
        })?;
        wait_reply(&result)
    }

    pub fn status(&self) -> ModemStatus {
        self.status.read().clone()
    }

    /// Notifier for platform layers that are not wired through
    /// [`AudioSession::subscribe`].
    pub fn notifier(&self) -> SessionNotifier {
        self.notifier.clone()
    }

    /// Stop the engine and join the control thread.
    pub fn shutdown(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        let _ = self.send(ModemCommand::Shutdown);
        if thread.join().is_err() {
            log::error!("Control thread panicked");
        }
    }
}

fn wait_reply(result: &Receiver<Result<(), ModemError>>) -> Result<(), ModemError> {
    result.recv().map_err(|_| ModemError::Shutdown)?
}

impl Drop for ModemHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
