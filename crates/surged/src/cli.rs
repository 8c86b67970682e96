//! Command-line interface.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use surge_core::{LoadConfig, QueueConfig, ServiceConfig, parse_duration};

#[derive(Parser)]
#[command(name = "surged", about = "Surge autoscaling demo daemon")]
pub struct Cli {
    /// Log output format.
    #[arg(long, global = true, value_enum, default_value = "text", env = "SURGE_LOG_FORMAT")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the service (application and scrape listeners).
    Serve(ServeArgs),
    /// Print the effective configuration as JSON and exit.
    Config(ServeArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Application listen address.
    #[arg(long, default_value = "0.0.0.0:80", env = "SURGE_LISTEN")]
    pub listen: SocketAddr,

    /// Prometheus scrape listen address.
    #[arg(long, default_value = "0.0.0.0:8000", env = "SURGE_METRICS_LISTEN")]
    pub metrics_listen: SocketAddr,

    /// Maximum queued requests.
    #[arg(long, default_value = "100", env = "SURGE_QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    /// Simulated processing time per queued request.
    #[arg(long, default_value = "100ms", value_parser = parse_duration, env = "SURGE_WORK_DURATION")]
    pub work_duration: Duration,

    /// Longest idle wait of the drain loop on an empty queue.
    #[arg(long, default_value = "1s", value_parser = parse_duration, env = "SURGE_IDLE_WAIT")]
    pub idle_wait: Duration,

    /// Admissions attempted per /load/http call.
    #[arg(long, default_value = "500", env = "SURGE_HTTP_BURST")]
    pub http_burst: usize,

    /// Bytes allocated per memory load step.
    #[arg(long, default_value = "52428800", env = "SURGE_MEMORY_CHUNK_BYTES")]
    pub memory_chunk_bytes: usize,

    /// Delay between memory load steps.
    #[arg(long, default_value = "100ms", value_parser = parse_duration, env = "SURGE_MEMORY_INTERVAL")]
    pub memory_interval: Duration,

    /// Squares computed per CPU load iteration.
    #[arg(long, default_value = "10000", env = "SURGE_CPU_BATCH")]
    pub cpu_batch: u64,
}

impl ServeArgs {
    pub fn into_config(self) -> ServiceConfig {
        ServiceConfig {
            listen: self.listen,
            metrics_listen: self.metrics_listen,
            queue: QueueConfig {
                capacity: self.queue_capacity,
                work_duration: self.work_duration,
                idle_wait: self.idle_wait,
            },
            load: LoadConfig {
                http_burst: self.http_burst,
                memory_chunk_bytes: self.memory_chunk_bytes,
                memory_interval: self.memory_interval,
                cpu_batch: self.cpu_batch,
            },
        }
    }
}
