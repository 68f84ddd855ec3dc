//! Runtime glue: validated configuration, progress state, and telemetry.

pub mod config;
pub mod progress;
pub mod telemetry;
