//! Simulated vehicle that streams telemetry to a `fleet-monitor-server` and
//! prints every alert it gets back.

use clap::Parser;
use core::time::Duration;
use fleet_monitor::TelemetryProducer;
use fleet_monitor_tonic_core::{
    proto::{TelemetryData, fleet_monitor_client::FleetMonitorClient},
    types::DEFAULT_SERVER_URL,
};
use tokio::{signal, sync::mpsc, time::MissedTickBehavior};
use tokio_stream::wrappers::ReceiverStream;
use tonic::{codec::CompressionEncoding, transport::Channel};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "fleet-monitor-client",
    version,
    about = "Streams simulated vehicle telemetry and prints the alerts"
)]
struct ClientArgs {
    /// Server endpoint.
    ///
    /// Environment variable: `SERVER_URL`
    #[arg(long, env = "SERVER_URL", default_value_t = String::from(DEFAULT_SERVER_URL))]
    server_url: String,

    /// Vehicle id reported with every sample.
    ///
    /// Environment variable: `VAN_ID`
    #[arg(long, env = "VAN_ID", default_value = "VAN-001")]
    van_id: String,

    /// Milliseconds between samples.
    #[arg(long, env = "INTERVAL_MS", default_value_t = 1000)]
    interval_ms: u64,

    /// Seed for a reproducible trip. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many samples. Runs until interrupted when omitted.
    #[arg(long)]
    count: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = ClientArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let producer = match args.seed {
        Some(seed) => TelemetryProducer::with_seed(&args.van_id, seed),
        None => TelemetryProducer::new(&args.van_id),
    };
    tracing::info!(
        van_id = producer.vehicle_id(),
        seed = producer.seed(),
        "Connecting to {}",
        args.server_url
    );

    let channel = Channel::from_shared(args.server_url)?.connect().await?;
    let mut client = FleetMonitorClient::new(channel)
        .send_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Zstd);

    let (tx, rx) = mpsc::channel(16);
    let interval = Duration::from_millis(args.interval_ms.max(1));
    let limit = args.count.unwrap_or(usize::MAX);
    tokio::spawn(feed(producer.take(limit), tx, interval));

    let mut alerts = client
        .stream_telemetry(ReceiverStream::new(rx))
        .await?
        .into_inner();

    loop {
        tokio::select! {
            alert = alerts.message() => match alert? {
                Some(alert) => println!("{}", alert.message),
                None => break,
            },
            res = signal::ctrl_c() => {
                res?;
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    Ok(())
}

/// Sends one sample per `interval` until the producer runs out or the stream
/// goes away. Dropping `tx` half-closes the request stream.
async fn feed(
    samples: impl Iterator<Item = fleet_monitor::TelemetrySample>,
    tx: mpsc::Sender<TelemetryData>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for sample in samples {
        ticker.tick().await;
        tracing::debug!(
            lat = sample.latitude,
            lon = sample.longitude,
            speed = sample.speed,
            "sending sample"
        );
        if tx.send(TelemetryData::from(&sample)).await.is_err() {
            tracing::warn!("Alert stream closed; stopping");
            return;
        }
    }

    tracing::info!("All samples sent");
}
