//! gRPC service implementation for vehicle telemetry monitoring.
//!
//! This module defines [`FleetService`], the concrete implementation of the
//! [`FleetMonitor`] gRPC service defined in the protobuf schema. Every call to
//! `StreamTelemetry` gets its own task that reads samples, updates vehicle
//! state and streams alerts back on the same connection.
//!
//! ## Responsibilities
//!
//! - Build a [`StreamSession`] per call, backed by a private or process-wide
//!   tracker depending on [`TrackerScope`].
//! - Spawn [`process_telemetry`] and bridge it to the response stream.
//! - Track in-flight streams and refuse new ones once shutdown has begun.

use crate::server::{
    config::ServerConfig,
    streaming::processor::process_telemetry,
    telemetry::{
        decrement_streams_inflight, increment_stream_errors, increment_streams_inflight,
        increment_streams_opened, record_stream_duration,
    },
};
use core::{pin::Pin, time::Duration};
use fleet_monitor_tonic_core::{
    Error,
    fleet_monitor::{SharedTracker, StreamSession, TrackerScope, VehicleTracker},
    proto::{Alert, TelemetryData, fleet_monitor_server::FleetMonitor},
};
use portable_atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::{
    sync::mpsc,
    time::{sleep, timeout},
};
use tokio_stream::{Stream, wrappers::ReceiverStream};
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status, Streaming};
use tracing::Instrument;

/// Streaming gRPC service that turns vehicle telemetry into alerts.
///
/// Cloning is cheap; clones share the same tracker, shutdown token and
/// in-flight counter.
#[derive(Clone)]
pub struct FleetService {
    config: ServerConfig,
    state: Arc<ServiceState>,
}

struct ServiceState {
    shared_tracker: SharedTracker,
    shutdown_token: CancellationToken,
    shutting_down: AtomicBool,
    streams_inflight: AtomicUsize,
}

impl FleetService {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            state: Arc::new(ServiceState {
                shared_tracker: SharedTracker::new(),
                shutdown_token: CancellationToken::new(),
                shutting_down: AtomicBool::new(false),
                streams_inflight: AtomicUsize::new(0),
            }),
        }
    }

    /// Number of streams currently being processed.
    pub fn streams_inflight(&self) -> usize {
        self.state.streams_inflight.load(Ordering::Acquire)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.state.shutting_down.load(Ordering::Acquire)
    }

    /// The process-wide tracker. Only written to under
    /// [`TrackerScope::Shared`].
    pub fn shared_tracker(&self) -> &SharedTracker {
        &self.state.shared_tracker
    }

    fn new_session(&self) -> StreamSession {
        match self.config.tracker_scope {
            TrackerScope::PerStream => {
                StreamSession::new(VehicleTracker::new(), self.config.policy)
            }
            TrackerScope::Shared => {
                StreamSession::new(self.state.shared_tracker.clone(), self.config.policy)
            }
        }
    }

    /// Gracefully shuts the service down.
    ///
    /// - New streams are refused with `UNAVAILABLE`.
    /// - In-flight streams get up to `shutdown_timeout` seconds to finish.
    /// - Whatever is left is then cancelled.
    pub async fn shutdown(&self) {
        tracing::info!("Refusing new streams");
        self.state.shutting_down.store(true, Ordering::Release);

        tracing::info!(
            "Draining in-flight streams ({} active)",
            self.streams_inflight()
        );
        let drained = timeout(Duration::from_secs(self.config.shutdown_timeout), async {
            while self.streams_inflight() > 0 {
                sleep(Duration::from_millis(100)).await;
            }
        })
        .await;

        match drained {
            Ok(()) => tracing::debug!("All in-flight streams drained"),
            Err(_) => tracing::warn!(
                "Graceful drain timed out ({} streams still active)",
                self.streams_inflight()
            ),
        }

        self.state.shutdown_token.cancel();
        tracing::info!("Fleet service shutdown complete");
    }
}

/// Counts a stream as in flight for as long as it is alive.
struct InflightGuard {
    state: Arc<ServiceState>,
}

impl InflightGuard {
    fn new(state: Arc<ServiceState>) -> Self {
        state.streams_inflight.fetch_add(1, Ordering::AcqRel);
        increment_streams_inflight();
        Self { state }
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.state.streams_inflight.fetch_sub(1, Ordering::AcqRel);
        decrement_streams_inflight();
    }
}

#[tonic::async_trait]
impl FleetMonitor for FleetService {
    type StreamTelemetryStream = Pin<Box<dyn Stream<Item = Result<Alert, Status>> + Send>>;

    /// Accepts a telemetry stream and answers with an alert stream.
    ///
    /// The inbound half is processed on a dedicated task; the response stream
    /// ends when the client closes its side, the transport fails or the
    /// service shuts down.
    #[tracing::instrument(skip_all, fields(remote = ?req.remote_addr()))]
    async fn stream_telemetry(
        &self,
        req: Request<Streaming<TelemetryData>>,
    ) -> Result<Response<Self::StreamTelemetryStream>, Status> {
        if self.is_shutting_down() {
            increment_stream_errors();
            return Err(Error::ServiceShutdown.into());
        }

        let start = std::time::Instant::now();
        let guard = InflightGuard::new(Arc::clone(&self.state));
        increment_streams_opened();

        let inbound = req.into_inner();
        let session = self.new_session();
        let (resp_tx, resp_rx) =
            mpsc::channel::<Result<Alert, Status>>(self.config.stream_buffer_size);
        let shutdown = self.state.shutdown_token.clone();

        let span = tracing::info_span!(
            "telemetry_stream",
            tracker_scope = %self.config.tracker_scope,
            cadence = %session.policy().cadence,
            summary_interval = session.policy().summary_interval.get(),
        );

        tokio::spawn(
            async move {
                let _guard = guard;
                tracing::debug!("Telemetry stream opened");

                match process_telemetry(inbound, session, resp_tx, shutdown).await {
                    Ok(summary) => tracing::info!(
                        samples = summary.samples,
                        alerts = summary.alerts,
                        "Telemetry stream closed"
                    ),
                    Err(e) => {
                        increment_stream_errors();
                        tracing::warn!("Telemetry stream ended early: {e}");
                    }
                }

                record_stream_duration(start.elapsed().as_millis() as f64);
            }
            .instrument(span),
        );

        Ok(Response::new(Box::pin(ReceiverStream::new(resp_rx))))
    }
}
