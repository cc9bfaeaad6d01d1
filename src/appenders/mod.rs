//! Appender implementations

pub mod cloudwatch;

pub use cloudwatch::{CloudWatchHook, HookOptions};

// Re-export the trait next to its implementations
pub use crate::core::Appender;
