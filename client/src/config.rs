use std::time::Duration;

/// Probes are never requested closer together than this.
pub const MIN_PROBE_INTERVAL: Duration = Duration::from_millis(5000);

/// Samples strictly above this many milliseconds are flagged as high latency.
pub const HIGH_LATENCY_THRESHOLD_MS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LobbyConfig {
    pub min_probe_interval: Duration,
    pub high_latency_threshold_ms: u32,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            min_probe_interval: MIN_PROBE_INTERVAL,
            high_latency_threshold_ms: HIGH_LATENCY_THRESHOLD_MS,
        }
    }
}

/// Picks the room address from the first command-line argument, then from
/// `IP`/`PORT` in the environment.
pub fn room_address<I>(mut args: I) -> Result<String, std::net::AddrParseError>
where
    I: Iterator<Item = String>,
{
    match args.next() {
        Some(address) => Ok(address),
        None => common::net::get_connectable_address().map(|addr| addr.to_string()),
    }
}
