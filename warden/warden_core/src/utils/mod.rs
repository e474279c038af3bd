//! Utility types.

pub mod logging;

pub use logging::LogLevel;
