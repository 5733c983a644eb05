use crate::server::telemetry::{increment_alerts_emitted, increment_samples_received};
use core::time::Duration;
use fleet_monitor_tonic_core::{
    Error,
    fleet_monitor::{StreamSession, TelemetrySample},
    proto::{Alert, TelemetryData},
};
use tokio::{sync::mpsc, time::timeout};
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tonic::Status;

/// How long a terminal status may wait for room in a full response channel.
const ABORT_SEND_TIMEOUT: Duration = Duration::from_secs(1);

/// Totals for a stream that ran to completion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub samples: u64,
    pub alerts: u64,
}

/// Consumes `inbound` until the client half-closes it, feeding every sample
/// through `session` and sending the alerts it produces to `resp_tx`.
///
/// Alerts for a sample are sent, in order, before the next sample is read. A
/// full response channel therefore stops inbound consumption rather than
/// dropping samples.
///
/// # Errors
///
/// - [`Error::Inbound`] if the client's request stream fails.
/// - [`Error::ChannelError`] if the response stream was dropped.
/// - [`Error::ServiceShutdown`] if `shutdown` fires first. The client is told
///   with an `UNAVAILABLE` status when it is still listening.
pub async fn process_telemetry<S>(
    mut inbound: S,
    mut session: StreamSession,
    resp_tx: mpsc::Sender<Result<Alert, Status>>,
    shutdown: CancellationToken,
) -> fleet_monitor_tonic_core::Result<StreamSummary>
where
    S: Stream<Item = Result<TelemetryData, Status>> + Unpin,
{
    let mut alerts_sent = 0;

    loop {
        let next = tokio::select! {
            biased;
            () = shutdown.cancelled() => {
                return Err(abort(&resp_tx, Error::ServiceShutdown).await);
            }
            () = resp_tx.closed() => {
                return Err(Error::ChannelError {
                    context: "response stream dropped by client".to_string(),
                });
            }
            next = inbound.next() => next,
        };

        let data = match next {
            Some(Ok(data)) => data,
            Some(Err(status)) => {
                let err = Error::Inbound {
                    message: status.message().to_string(),
                };
                return Err(abort(&resp_tx, err).await);
            }
            None => break,
        };

        increment_samples_received();
        let sample = TelemetrySample::from(data);
        let observation = session.observe(&sample);

        tracing::trace!(
            vehicle_id = %sample.vehicle_id,
            delta_km = observation.distance_delta_km,
            total_km = observation.total_distance_km,
            "sample observed"
        );

        for alert in &observation.alerts {
            let kind = alert.kind.label();
            tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    return Err(abort(&resp_tx, Error::ServiceShutdown).await);
                }
                sent = resp_tx.send(Ok(Alert::from(alert))) => {
                    if let Err(e) = sent {
                        return Err(Error::ChannelError {
                            context: format!("Failed to forward alert: {e}"),
                        });
                    }
                }
            }

            tracing::debug!(vehicle_id = %alert.vehicle_id, kind, "alert sent");
            increment_alerts_emitted(kind);
            alerts_sent += 1;
        }
    }

    Ok(StreamSummary {
        samples: session.samples_seen(),
        alerts: alerts_sent,
    })
}

/// Queues `err` as the stream's terminal status, then hands it back for the
/// caller to report. A full channel is waited on for at most
/// [`ABORT_SEND_TIMEOUT`] so a client that stopped reading cannot pin the task.
async fn abort(resp_tx: &mpsc::Sender<Result<Alert, Status>>, err: Error) -> Error {
    match timeout(ABORT_SEND_TIMEOUT, resp_tx.send(Err(err.clone().into()))).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!("Could not forward error to client: {e}"),
        Err(_) => tracing::warn!("Timed out forwarding error to client: {err}"),
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_monitor_tonic_core::fleet_monitor::{
        AlertPolicy, Position, SharedTracker, VehicleTracker, haversine_km,
    };
    use portable_atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio_stream::wrappers::ReceiverStream;
    use tonic::Code;

    fn data(
        van_id: &str,
        latitude: f64,
        longitude: f64,
        speed: i32,
    ) -> Result<TelemetryData, Status> {
        Ok(TelemetryData {
            van_id: van_id.to_string(),
            latitude,
            longitude,
            speed,
        })
    }

    async fn run(
        inbound: Vec<Result<TelemetryData, Status>>,
        session: StreamSession,
    ) -> (
        fleet_monitor_tonic_core::Result<StreamSummary>,
        Vec<Result<Alert, Status>>,
    ) {
        let (tx, mut rx) = mpsc::channel(64);
        let result = process_telemetry(
            tokio_stream::iter(inbound),
            session,
            tx,
            CancellationToken::new(),
        )
        .await;

        let mut received = Vec::new();
        while let Some(item) = rx.recv().await {
            received.push(item);
        }
        (result, received)
    }

    fn messages(received: &[Result<Alert, Status>]) -> Vec<String> {
        received
            .iter()
            .map(|item| item.as_ref().unwrap().message.clone())
            .collect()
    }

    #[tokio::test]
    async fn three_sample_trip_only_reports_speeding() {
        let (result, received) = run(
            vec![
                data("VAN-1", 40.0, -74.0, 50),
                data("VAN-1", 40.01, -74.0, 50),
                data("VAN-1", 40.0, -74.0, 95),
            ],
            StreamSession::standalone(),
        )
        .await;

        assert_eq!(
            result.unwrap(),
            StreamSummary {
                samples: 3,
                alerts: 1
            }
        );
        assert_eq!(
            messages(&received),
            vec!["Speeding alert for VAN-1: 95.00 KM/h"]
        );
    }

    #[tokio::test]
    async fn summary_fires_on_the_tenth_sample() {
        let inbound = (0..11)
            .map(|i| data("VAN-1", 40.0 + f64::from(i) * 0.01, -74.0, 60))
            .collect();
        let (result, received) = run(inbound, StreamSession::standalone()).await;

        assert_eq!(result.unwrap().alerts, 1);
        let leg = haversine_km(Position::new(40.09, -74.0), Position::new(40.1, -74.0));
        let total = haversine_km(Position::new(40.0, -74.0), Position::new(40.01, -74.0)) * 10.0;
        assert_eq!(
            messages(&received),
            vec![format!("VAN-1 moved {leg:.2} KM (Total:{total:.2} KM)")]
        );
    }

    #[tokio::test]
    async fn speeding_precedes_summary_for_the_same_sample() {
        let mut inbound: Vec<_> = (0..10)
            .map(|i| data("VAN-1", 40.0 + f64::from(i) * 0.01, -74.0, 60))
            .collect();
        inbound.push(data("VAN-1", 40.2, -74.0, 120));
        let (_, received) = run(inbound, StreamSession::standalone()).await;

        let messages = messages(&received);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], "Speeding alert for VAN-1: 120.00 KM/h");
        assert!(messages[1].starts_with("VAN-1 moved "));
    }

    #[tokio::test]
    async fn inbound_error_ends_stream_after_earlier_alerts() {
        let (result, received) = run(
            vec![
                data("VAN-1", 40.0, -74.0, 90),
                Err(Status::cancelled("connection reset")),
                data("VAN-1", 40.0, -74.0, 90),
            ],
            StreamSession::standalone(),
        )
        .await;

        match result {
            Err(Error::Inbound { message }) => assert_eq!(message, "connection reset"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(received.len(), 2);
        assert_eq!(
            received[0].as_ref().unwrap().message,
            "Speeding alert for VAN-1: 90.00 KM/h"
        );
        assert_eq!(received[1].as_ref().unwrap_err().code(), Code::Aborted);
    }

    #[tokio::test]
    async fn dropped_response_stream_is_a_channel_error() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let result = process_telemetry(
            tokio_stream::iter(vec![data("VAN-1", 40.0, -74.0, 120)]),
            StreamSession::standalone(),
            tx,
            CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(Error::ChannelError { .. })));
    }

    #[tokio::test]
    async fn cancelled_token_refuses_further_samples() {
        let (tx, mut rx) = mpsc::channel(4);
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let result = process_telemetry(
            tokio_stream::iter(vec![data("VAN-1", 40.0, -74.0, 120)]),
            StreamSession::standalone(),
            tx,
            shutdown,
        )
        .await;

        assert!(matches!(result, Err(Error::ServiceShutdown)));
        let status = rx.recv().await.unwrap().unwrap_err();
        assert_eq!(status.code(), Code::Unavailable);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn shutdown_status_waits_for_room_in_a_full_response_channel() {
        let (in_tx, in_rx) = mpsc::channel(4);
        let (tx, mut rx) = mpsc::channel(1);
        let watcher = tx.clone();
        let shutdown = CancellationToken::new();

        let task = tokio::spawn(process_telemetry(
            ReceiverStream::new(in_rx),
            StreamSession::standalone(),
            tx,
            shutdown.clone(),
        ));
        in_tx.send(data("VAN-1", 40.0, -74.0, 120)).await.unwrap();

        // Wait for the speeding alert to occupy the only slot.
        while watcher.capacity() > 0 {
            tokio::task::yield_now().await;
        }
        drop(watcher);
        shutdown.cancel();

        let alert = rx.recv().await.unwrap().unwrap();
        assert_eq!(alert.message, "Speeding alert for VAN-1: 120.00 KM/h");
        let status = rx.recv().await.unwrap().unwrap_err();
        assert_eq!(status.code(), Code::Unavailable);
        assert!(rx.recv().await.is_none());

        let result = task.await.unwrap();
        assert!(matches!(result, Err(Error::ServiceShutdown)));
        drop(in_tx);
    }

    #[tokio::test]
    async fn full_response_channel_pauses_reading_without_dropping_samples() {
        let reads = Arc::new(AtomicUsize::new(0));
        let counter = reads.clone();
        let samples = (0..5).map(|i| data("VAN-1", 40.0, -74.0, 81 + i));
        let inbound = tokio_stream::iter(samples).map(move |item| {
            counter.fetch_add(1, Ordering::SeqCst);
            item
        });
        let (tx, mut rx) = mpsc::channel(1);

        let task = tokio::spawn(process_telemetry(
            inbound,
            StreamSession::standalone(),
            tx,
            CancellationToken::new(),
        ));
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        // The first alert fills the channel and the second one is parked, so
        // the third sample must not have been read yet.
        assert_eq!(reads.load(Ordering::SeqCst), 2);

        let mut received = Vec::new();
        while let Some(item) = rx.recv().await {
            received.push(item);
        }
        let expected: Vec<_> = (81..=85)
            .map(|speed| format!("Speeding alert for VAN-1: {speed}.00 KM/h"))
            .collect();
        assert_eq!(messages(&received), expected);
        assert_eq!(
            task.await.unwrap().unwrap(),
            StreamSummary {
                samples: 5,
                alerts: 5
            }
        );
        assert_eq!(reads.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn empty_stream_completes_without_alerts() {
        let (result, received) = run(Vec::new(), StreamSession::standalone()).await;
        assert_eq!(result.unwrap(), StreamSummary::default());
        assert!(received.is_empty());
    }

    #[tokio::test]
    async fn shared_tracker_carries_totals_between_streams() {
        let shared = SharedTracker::new();

        let (_, first) = run(
            vec![data("VAN-1", 40.0, -74.0, 50)],
            StreamSession::new(shared.clone(), AlertPolicy::default()),
        )
        .await;
        assert!(first.is_empty());

        // The second stream's first sample sits on tick 0 and already has a
        // prior fix from the first stream.
        let (_, second) = run(
            vec![data("VAN-1", 40.01, -74.0, 50)],
            StreamSession::new(shared.clone(), AlertPolicy::default()),
        )
        .await;
        assert_eq!(
            messages(&second),
            vec!["VAN-1 moved 1.11 KM (Total:1.11 KM)"]
        );

        let (_, isolated) = run(
            vec![data("VAN-1", 40.02, -74.0, 50)],
            StreamSession::new(VehicleTracker::new(), AlertPolicy::default()),
        )
        .await;
        assert!(isolated.is_empty());
    }
}
