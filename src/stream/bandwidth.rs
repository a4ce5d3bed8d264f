//! Network throughput sampling
//!
//! A recurring 1-second task reads cumulative received-byte counters,
//! derives the instantaneous rate from the delta against the previous
//! reading, and publishes a human-readable speed string for the loading
//! indicator. Started once at startup and never cancelled for the life
//! of the session.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::warn;

/// Sampling period for the recurring task
pub const SAMPLE_PERIOD: Duration = Duration::from_secs(1);

/// Cumulative interface byte counters, monotonically non-decreasing
/// within a boot session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkUsage {
    pub cellular_rx: u64,
    pub cellular_tx: u64,
    pub wifi_rx: u64,
    pub wifi_tx: u64,
}

impl NetworkUsage {
    /// Received bytes across both interface classes
    pub fn total_received(&self) -> u64 {
        self.cellular_rx + self.wifi_rx
    }
}

/// Platform network-usage collaborator
pub trait UsageSource {
    fn sample(&mut self) -> std::io::Result<NetworkUsage>;
}

// =============================================================================
// Sampler
// =============================================================================

/// Derives a throughput string from successive counter readings.
///
/// Only the most recent reading is retained. The first tick compares
/// against zero bytes at sampler start, so it reports total usage since
/// start rather than a per-second rate.
pub struct BandwidthSampler<S> {
    source: S,
    prev_received: u64,
    prev_millis: u64,
    started: Instant,
}

impl<S: UsageSource> BandwidthSampler<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            prev_received: 0,
            prev_millis: 0,
            started: Instant::now(),
        }
    }

    /// Fold one counter reading taken `now_millis` after sampler start
    /// into a bytes-per-second rate, and stash it for the next delta.
    pub fn rate_at(&mut self, usage: &NetworkUsage, now_millis: u64) -> u64 {
        let received = usage.total_received();
        let delta_bytes = received.saturating_sub(self.prev_received);
        // Floor at 1ms so clock anomalies cannot divide by zero
        let delta_millis = now_millis.saturating_sub(self.prev_millis).max(1);

        self.prev_received = received;
        self.prev_millis = now_millis;

        delta_bytes * 1000 / delta_millis
    }

    /// Sample the source now and return the formatted rate.
    /// A failed sample keeps the previous reading and reports nothing.
    pub fn tick(&mut self) -> String {
        let now_millis = self.started.elapsed().as_millis() as u64;
        match self.source.sample() {
            Ok(usage) => format_net_speed(self.rate_at(&usage, now_millis)),
            Err(e) => {
                warn!(error = %e, "bandwidth sample failed");
                String::new()
            }
        }
    }
}

/// Start the recurring sampler task and return the channel observers
/// read the speed string from.
pub fn spawn<S>(source: S) -> watch::Receiver<String>
where
    S: UsageSource + Send + 'static,
{
    let (tx, rx) = watch::channel(String::new());
    let mut sampler = BandwidthSampler::new(source);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SAMPLE_PERIOD);
        // The immediate first fire would measure an empty window
        interval.tick().await;
        loop {
            interval.tick().await;
            if tx.send(sampler.tick()).is_err() {
                break;
            }
        }
    });

    rx
}

/// Format a bytes-per-second rate. Integer division, no decimals;
/// rates at or beyond 1 GB/s have no defined rendering and come back empty.
pub fn format_net_speed(rate: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    const GB: u64 = 1024 * 1024 * 1024;

    if rate < KB {
        format!("{} B/s", rate)
    } else if rate < MB {
        format!("{} KB/s", rate / KB)
    } else if rate < GB {
        format!("{} MB/s", rate / MB)
    } else {
        String::new()
    }
}

// =============================================================================
// /proc/net/dev source
// =============================================================================

/// Counter source backed by the kernel's per-interface statistics
/// (`/proc/net/dev`). Interfaces named like mobile-broadband modems
/// (`wwan*`, `rmnet*`) count as cellular; everything else except loopback
/// counts as the local-network class.
pub struct ProcNetDev {
    path: std::path::PathBuf,
}

impl ProcNetDev {
    pub fn new() -> Self {
        Self::at("/proc/net/dev")
    }

    pub fn at(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ProcNetDev {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageSource for ProcNetDev {
    fn sample(&mut self) -> std::io::Result<NetworkUsage> {
        let text = std::fs::read_to_string(&self.path)?;
        Ok(parse_proc_net_dev(&text))
    }
}

/// Parse `/proc/net/dev` into summed per-class counters.
///
/// Line shape (after the two header lines):
/// `  eth0: <rx_bytes> <rx_packets> ... <tx_bytes> <tx_packets> ...`
fn parse_proc_net_dev(text: &str) -> NetworkUsage {
    let mut usage = NetworkUsage::default();

    for line in text.lines().skip(2) {
        let Some((name, counters)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name == "lo" {
            continue;
        }

        let fields: Vec<&str> = counters.split_whitespace().collect();
        let rx: u64 = fields.first().and_then(|f| f.parse().ok()).unwrap_or(0);
        let tx: u64 = fields.get(8).and_then(|f| f.parse().ok()).unwrap_or(0);

        if name.starts_with("wwan") || name.starts_with("rmnet") {
            usage.cellular_rx += rx;
            usage.cellular_tx += tx;
        } else {
            usage.wifi_rx += rx;
            usage.wifi_tx += tx;
        }
    }

    usage
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_net_speed_units() {
        assert_eq!(format_net_speed(0), "0 B/s");
        assert_eq!(format_net_speed(1023), "1023 B/s");
        assert_eq!(format_net_speed(1024), "1 KB/s");
        assert_eq!(format_net_speed(2500), "2 KB/s");
        assert_eq!(format_net_speed(1024 * 1024), "1 MB/s");
        assert_eq!(format_net_speed(5 * 1024 * 1024 + 1), "5 MB/s");
        // No rendering at GB/s and beyond
        assert_eq!(format_net_speed(1024 * 1024 * 1024), "");
    }

    #[test]
    fn test_rate_boundary_is_1024_not_1000() {
        let mut sampler = BandwidthSampler::new(NullSource);
        sampler.rate_at(
            &NetworkUsage {
                cellular_rx: 1000,
                wifi_rx: 2000,
                ..Default::default()
            },
            0,
        );
        let rate = sampler.rate_at(
            &NetworkUsage {
                cellular_rx: 1000,
                wifi_rx: 3000,
                ..Default::default()
            },
            1000,
        );
        assert_eq!(rate, 1000);
        assert_eq!(format_net_speed(rate), "1000 B/s");
    }

    #[test]
    fn test_zero_delta_millis_is_floored() {
        let mut sampler = BandwidthSampler::new(NullSource);
        sampler.rate_at(&NetworkUsage::default(), 500);
        // Same timestamp again: floored to 1ms instead of dividing by zero
        let rate = sampler.rate_at(
            &NetworkUsage {
                wifi_rx: 10,
                ..Default::default()
            },
            500,
        );
        assert_eq!(rate, 10_000);
    }

    #[test]
    fn test_first_tick_reports_usage_since_start() {
        let mut sampler = BandwidthSampler::new(NullSource);
        let rate = sampler.rate_at(
            &NetworkUsage {
                wifi_rx: 2048,
                ..Default::default()
            },
            2000,
        );
        // 2048 bytes over the 2s since start
        assert_eq!(rate, 1024);
    }

    #[test]
    fn test_parse_proc_net_dev() {
        let text = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 1000000    1000    0    0    0     0          0         0  1000000    1000    0    0    0     0       0          0
  eth0:    2000      20    0    0    0     0          0         0     3000      30    0    0    0     0       0          0
 wwan0:     500       5    0    0    0     0          0         0      700       7    0    0    0     0       0          0
";
        let usage = parse_proc_net_dev(text);
        assert_eq!(usage.wifi_rx, 2000);
        assert_eq!(usage.wifi_tx, 3000);
        assert_eq!(usage.cellular_rx, 500);
        assert_eq!(usage.cellular_tx, 700);
        assert_eq!(usage.total_received(), 2500);
    }

    struct NullSource;

    impl UsageSource for NullSource {
        fn sample(&mut self) -> std::io::Result<NetworkUsage> {
            Ok(NetworkUsage::default())
        }
    }
}
