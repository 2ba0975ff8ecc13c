//! # ribbit-audio-core
//!
//! Platform-agnostic real-time audio front end for an acoustic data modem.
//!
//! Captures microphone audio, converts it to the modem format (8 kHz mono
//! f32) and feeds the symbol decoder; in the other direction it pulls the
//! symbol encoder and plays the result. Capture-and-decode and
//! encode-and-play are mutually exclusive (half-duplex), and interruptions or
//! route changes trigger a debounced restart.
//!
//! Platform backends implement [`AudioSession`] and [`AudioEngine`]; the
//! physical layer plugs in through [`ModemCodec`].
//!
//! ## Architecture
//!
//! ```text
//! ribbit-audio-core (this crate)
//! ├── traits/       ← AudioSession, AudioEngine, ModemCodec, ModemDelegate
//! ├── models/       ← ModemError, ModemStatus, ModemConfig, DirectionFlag, events, ComposerBudget
//! ├── processing/   ← FormatConverter (pull-based), RateMonitor
//! ├── graph/        ← AudioGraph, capture/playback render contexts, RenderQueue
//! └── session/      ← SessionManager, HalfDuplexController, FaultRecovery,
//!                     ModemSession (orchestrator), ModemRuntime (control thread)
//! ```
//!
//! ## Usage
//! ```ignore
//! use ribbit_audio_core::{ModemConfig, ModemRuntime, ModemSession};
//!
//! let (session, engine) = ribbit_audio_cpal::platform();
//! let modem = ModemSession::new(ModemConfig::default(), session, engine, codec)?;
//! let handle = ModemRuntime::spawn(modem)?;
//! handle.start()?;
//! handle.transmit(b"Hello World!")?;
//! ```

pub mod graph;
pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use graph::audio_graph::AudioGraph;
pub use graph::render_queue::RenderQueue;
pub use models::composer::ComposerBudget;
pub use models::config::{AudioSessionConfig, ModemConfig, SampleFormat, SessionCategory, StreamFormat};
pub use models::direction::{DirectionFlag, ModemDirection};
pub use models::error::ModemError;
pub use models::events::{InterruptionPhase, ModemEvent, PipelineStage, RouteChangeReason, SessionNotification};
pub use models::message::DecodedMessage;
pub use models::status::ModemStatus;
pub use processing::converter::{FormatConverter, PullStatus, SingleShotInput};
pub use processing::rate_monitor::RateMonitor;
pub use session::control::SessionNotifier;
pub use session::modem_session::ModemSession;
pub use session::runtime::{ModemHandle, ModemRuntime};
pub use traits::audio_engine::{AudioEngine, CaptureRenderer, PlaybackRenderer};
pub use traits::audio_session::{AudioSession, PermissionCallback, PermissionStatus};
pub use traits::modem_codec::{ModemCodec, DECODED_PAYLOAD_LEN, DECODER_FEED_LIMIT, PAYLOAD_CAPACITY};
pub use traits::modem_delegate::ModemDelegate;
