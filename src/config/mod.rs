//! # Configuration
//!
//! Process configuration (environment variables) and the desired-state file.

mod controller;
mod desired;

pub use controller::ControllerConfig;
pub use desired::{load_desired_entries, parse_desired_entries, DesiredEntry};
