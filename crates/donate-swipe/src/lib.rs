pub mod catalog;
pub mod config;
pub mod engagement;
pub mod error;
pub mod session;
pub mod telemetry;
