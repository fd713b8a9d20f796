//! Logging utilities and structured logging support
//!
//! The crate logs through the `log` facade; hosts pick the backend. These
//! helpers install `env_logger`, which honours `RUST_LOG`.

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// Panics if a global logger is already installed; use [`try_init`] where
/// that can happen (tests, embedding hosts).
pub fn init() {
    env_logger::init();
}

/// Try to install the logger, ignoring the error if one is already set
pub fn try_init() {
    let _ = env_logger::builder().is_test(cfg!(test)).try_init();
}
