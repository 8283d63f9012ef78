//! Shared utilities: structured-logging setup.

pub mod logging;
