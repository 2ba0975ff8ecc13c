pub mod control;
pub mod fault_recovery;
pub mod half_duplex;
pub mod modem_session;
pub mod runtime;
pub mod session_manager;

#[cfg(test)]
pub(crate) mod test_support;
