//! gRPC service implementation.
//!
//! - [`handler`] - `FleetMonitor` service entry point ([`FleetService`]),
//!   stream admission and graceful shutdown.
//!
//! [`FleetService`]: handler::FleetService

pub mod handler;
