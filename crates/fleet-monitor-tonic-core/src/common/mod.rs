//! Shared types and error definitions used by the fleet monitor server and
//! client.
//!
//! ## Submodules
//!
//! - [`error`] - Service error type and its mapping onto gRPC status codes.
//! - [`types`] - Wire/domain conversions and default endpoints.
//! - [`proto`] - Generated protobuf messages and service bindings.

pub mod error;
pub mod types;

pub use error::{Error, Result};

/// gRPC service and message definitions generated from `proto/fleet.proto`.
///
/// ## Service
///
/// - `FleetMonitor::StreamTelemetry` - bidirectional stream; the client sends
///   [`TelemetryData`](proto::TelemetryData) and receives
///   [`Alert`](proto::Alert)s.
pub mod proto {
    tonic::include_proto!("fleet");

    /// Encoded descriptor set for `fleet.proto`, used by gRPC reflection.
    pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("fleet_descriptor");
}
