//! Server-side components of the fleet monitor service.
//!
//! ## Submodules
//!
//! - [`config`] - CLI/environment configuration and validation.
//! - [`service`] - The `FleetMonitor` gRPC service and shutdown coordination.
//! - [`streaming`] - The per-connection loop that turns samples into alerts.
//! - [`telemetry`] - Logging subscriber and optional OpenTelemetry export.

pub mod config;
pub mod service;
pub mod streaming;
pub mod telemetry;
