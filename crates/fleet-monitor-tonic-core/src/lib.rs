#![doc = include_str!("../README.md")]

mod common;
pub use common::*;
// Public re-export so downstream crates can access `fleet-monitor` via
// `fleet_monitor_tonic_core::fleet_monitor`
pub use fleet_monitor;
