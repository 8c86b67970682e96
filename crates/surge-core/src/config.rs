//! Service configuration.
//!
//! Everything is supplied on the command line or through `SURGE_*`
//! environment variables; there is no config file. Durations are written
//! as `"<n>ms"` or `"<n>s"`.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::error::{ConfigError, ConfigResult};

/// Top-level configuration for the daemon.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceConfig {
    /// Address of the application HTTP listener.
    pub listen: SocketAddr,
    /// Address of the Prometheus scrape listener.
    pub metrics_listen: SocketAddr,
    pub queue: QueueConfig,
    pub load: LoadConfig,
}

/// Admission queue and drain loop settings.
#[derive(Debug, Clone, Serialize)]
pub struct QueueConfig {
    /// Maximum number of tokens held at once.
    pub capacity: usize,
    /// Simulated processing time per drained token.
    #[serde(serialize_with = "serialize_duration")]
    pub work_duration: Duration,
    /// Upper bound on how long the drain loop idles on an empty queue.
    #[serde(serialize_with = "serialize_duration")]
    pub idle_wait: Duration,
}

/// Synthetic load generator settings.
#[derive(Debug, Clone, Serialize)]
pub struct LoadConfig {
    /// Number of admissions attempted by one `/load/http` call.
    pub http_burst: usize,
    /// Bytes allocated per memory worker step.
    pub memory_chunk_bytes: usize,
    #[serde(serialize_with = "serialize_duration")]
    pub memory_interval: Duration,
    /// Squares computed per CPU worker iteration.
    pub cpu_batch: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 80)),
            metrics_listen: SocketAddr::from(([0, 0, 0, 0], 8000)),
            queue: QueueConfig::default(),
            load: LoadConfig::default(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            work_duration: Duration::from_millis(100),
            idle_wait: Duration::from_secs(1),
        }
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            http_burst: 500,
            memory_chunk_bytes: 50 * 1024 * 1024,
            memory_interval: Duration::from_millis(100),
            cpu_batch: 10_000,
        }
    }
}

impl ServiceConfig {
    /// Check cross-field constraints. Call once after assembling the config.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.queue.capacity == 0 {
            return Err(ConfigError::InvalidCapacity);
        }
        if self.queue.idle_wait.is_zero() {
            return Err(ConfigError::ZeroDuration("idle wait"));
        }
        if self.load.http_burst == 0 {
            return Err(ConfigError::InvalidBurst);
        }
        if self.load.memory_chunk_bytes == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }
        // Port 0 asks the OS for an ephemeral port, so two of them never clash.
        if self.listen.port() != 0 && self.listen == self.metrics_listen {
            return Err(ConfigError::AddressConflict(self.listen.to_string()));
        }
        Ok(())
    }
}

/// Parse `"250ms"`, `"2s"`, or a bare number of seconds.
pub fn parse_duration(s: &str) -> ConfigResult<Duration> {
    let s = s.trim();
    let invalid = || ConfigError::InvalidDuration(s.to_string());

    if let Some(ms) = s.strip_suffix("ms") {
        ms.trim().parse::<u64>().map(Duration::from_millis).map_err(|_| invalid())
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.trim().parse::<u64>().map(Duration::from_secs).map_err(|_| invalid())
    } else {
        s.parse::<u64>().map(Duration::from_secs).map_err(|_| invalid())
    }
}

/// Inverse of [`parse_duration`] for whole milliseconds.
pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else {
        format!("{ms}ms")
    }
}

fn serialize_duration<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_duration(*d))
}
