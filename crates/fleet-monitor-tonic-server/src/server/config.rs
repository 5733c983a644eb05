use anyhow::bail;
use core::num::NonZeroU64;
use clap::Parser;
use fleet_monitor_tonic_core::{
    fleet_monitor::{
        AlertPolicy, CadenceScope, DEFAULT_SPEED_LIMIT_KMH, DEFAULT_SUMMARY_INTERVAL, TrackerScope,
    },
    types::DEFAULT_SERVER_ADDR,
};

/// Runtime configuration for the `fleet-monitor-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a `.env`
/// file is honored), with defaults that reproduce the reference alert policy.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fleet-monitor-server",
    version,
    about = "A gRPC service that monitors streaming vehicle telemetry"
)]
pub struct CliArgs {
    /// Address to listen on (TCP or Unix socket path; use --uds for Unix socket).
    ///
    /// Example: "0.0.0.0:50051" or "/tmp/fleet-monitor.sock"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from(DEFAULT_SERVER_ADDR))]
    pub server_addr: String,

    /// Listen on a Unix socket instead of TCP. If set, `SERVER_ADDR` must be a file path.
    #[arg(short, long, default_value_t = false)]
    pub uds: bool,

    /// Capacity of the per-stream alert buffer between the stream task and
    /// the gRPC response.
    ///
    /// When full, the stream task stops reading telemetry until the client
    /// catches up.
    ///
    /// Environment variable: `STREAM_BUFFER_SIZE`
    #[arg(long, env = "STREAM_BUFFER_SIZE", default_value_t = 8)]
    pub stream_buffer_size: usize,

    /// Speed above which a speeding alert is sent, in km/h.
    ///
    /// Environment variable: `SPEED_LIMIT_KMH`
    #[arg(long, env = "SPEED_LIMIT_KMH", default_value_t = DEFAULT_SPEED_LIMIT_KMH)]
    pub speed_limit_kmh: f64,

    /// A distance summary is considered every this many samples.
    ///
    /// Environment variable: `SUMMARY_INTERVAL`
    #[arg(long, env = "SUMMARY_INTERVAL", default_value_t = DEFAULT_SUMMARY_INTERVAL.get())]
    pub summary_interval: u64,

    /// Where vehicle state lives: `per-stream` (dropped when the stream ends)
    /// or `shared` (one map for the whole process).
    ///
    /// Environment variable: `TRACKER_SCOPE`
    #[arg(long, env = "TRACKER_SCOPE", default_value_t = TrackerScope::PerStream)]
    pub tracker_scope: TrackerScope,

    /// Which counter drives distance summaries: `global` (every sample on the
    /// stream) or `per-vehicle`.
    ///
    /// Environment variable: `CADENCE`
    #[arg(long, env = "CADENCE", default_value_t = CadenceScope::Global)]
    pub cadence: CadenceScope,

    /// Seconds to wait for in-flight streams to finish during shutdown before
    /// they are cut off.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 5)]
    pub shutdown_timeout: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub uds: bool,
    pub stream_buffer_size: usize,
    pub policy: AlertPolicy,
    pub tracker_scope: TrackerScope,
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            uds: false,
            stream_buffer_size: 8,
            policy: AlertPolicy::default(),
            tracker_scope: TrackerScope::PerStream,
            shutdown_timeout: 5,
        }
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.stream_buffer_size == 0 {
            bail!("STREAM_BUFFER_SIZE must be greater than 0");
        }

        let Some(summary_interval) = NonZeroU64::new(args.summary_interval) else {
            bail!("SUMMARY_INTERVAL must be greater than 0");
        };

        if !args.speed_limit_kmh.is_finite() || args.speed_limit_kmh < 0.0 {
            bail!(
                "SPEED_LIMIT_KMH must be a finite, non-negative number (got {})",
                args.speed_limit_kmh
            );
        }

        let policy = AlertPolicy::default()
            .with_speed_limit(args.speed_limit_kmh)
            .with_summary_interval(summary_interval)
            .with_cadence(args.cadence);

        Ok(Self {
            server_addr: args.server_addr,
            uds: args.uds,
            stream_buffer_size: args.stream_buffer_size,
            policy,
            tracker_scope: args.tracker_scope,
            shutdown_timeout: args.shutdown_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<ServerConfig> {
        let cli = CliArgs::try_parse_from(
            std::iter::once("fleet-monitor-server").chain(args.iter().copied()),
        )?;
        ServerConfig::try_from(cli)
    }

    #[test]
    fn defaults_match_reference_policy() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.policy, AlertPolicy::default());
        assert_eq!(config.tracker_scope, TrackerScope::PerStream);
        assert_eq!(config.stream_buffer_size, 8);
        assert!(!config.uds);
    }

    #[test]
    fn overrides_are_applied() {
        let config = parse(&[
            "--speed-limit-kmh",
            "100",
            "--summary-interval",
            "5",
            "--tracker-scope",
            "shared",
            "--cadence",
            "per-vehicle",
            "--server-addr",
            "127.0.0.1:6000",
        ])
        .unwrap();

        assert_eq!(config.policy.speed_limit_kmh, 100.0);
        assert_eq!(config.policy.summary_interval.get(), 5);
        assert_eq!(config.policy.cadence, CadenceScope::PerVehicle);
        assert_eq!(config.tracker_scope, TrackerScope::Shared);
        assert_eq!(config.server_addr, "127.0.0.1:6000");
    }

    #[test]
    fn rejects_zero_interval_and_buffer() {
        assert!(parse(&["--summary-interval", "0"]).is_err());
        assert!(parse(&["--stream-buffer-size", "0"]).is_err());
    }

    #[test]
    fn rejects_unusable_speed_limit() {
        assert!(parse(&["--speed-limit-kmh", "NaN"]).is_err());
        assert!(parse(&["--speed-limit-kmh=-1"]).is_err());
    }

    #[test]
    fn rejects_unknown_scope() {
        assert!(parse(&["--tracker-scope", "global"]).is_err());
    }
}
