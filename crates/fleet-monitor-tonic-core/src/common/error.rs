//! Error types for the fleet monitor service.
//!
//! This module defines the central `Error` enum for the few failures that can
//! end a telemetry stream early. Processing a sample itself never fails; these
//! cover the plumbing around it. `From<Error>` for `tonic::Status` maps each
//! case onto a gRPC status code.
//!
//! ## Error Cases
//! - `ChannelError`: the response channel to the client was closed.
//! - `Inbound`: the client's request stream yielded a transport error.
//! - `ServiceShutdown`: the stream was refused or cut short by shutdown.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the fleet monitor service.
#[derive(Clone, thiserror::Error, Debug)]
pub enum Error {
    /// Internal channel send/receive failure (e.g., client went away).
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// The inbound telemetry stream failed at the transport level.
    #[error("Inbound stream error: {message}")]
    Inbound { message: String },

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::ChannelError { context } => {
                Status::internal(format!("Channel error: {}", context))
            }
            Error::Inbound { message } => Status::aborted(message),
            Error::ServiceShutdown => Status::unavailable("Service is shutting down"),
        }
    }
}
