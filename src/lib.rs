pub mod analysis;
pub mod config;
pub mod error;
pub mod source;
pub mod telemetry;
