pub mod composer;
pub mod config;
pub mod direction;
pub mod error;
pub mod events;
pub mod message;
pub mod status;
