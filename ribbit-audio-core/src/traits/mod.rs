pub mod audio_engine;
pub mod audio_session;
pub mod modem_codec;
pub mod modem_delegate;
