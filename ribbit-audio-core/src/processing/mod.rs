pub mod converter;
pub mod rate_monitor;
