//! Per-connection telemetry processing.
//!
//! - [`processor`] - Drives one [`StreamSession`] from an inbound sample stream
//!   and forwards the resulting alerts to the response channel.
//!
//! [`StreamSession`]: fleet_monitor_tonic_core::fleet_monitor::StreamSession

pub mod processor;
