//! surged — the surge daemon.
//!
//! Single binary that assembles the service:
//! - Bounded admission queue + drain loop
//! - Host sampler and service metrics
//! - CPU / memory load workers
//! - Application HTTP listener
//! - Prometheus scrape listener
//!
//! # Usage
//!
//! ```text
//! surged serve --listen 0.0.0.0:80 --metrics-listen 0.0.0.0:8000 --queue-capacity 100
//! ```

mod cli;
mod server;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, LogFormat};

const DEFAULT_LOG_FILTER: &str = "info,surged=debug,surge_queue=debug,surge_api=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Serve(args) => {
            let config = args.into_config();
            config.validate()?;
            server::run(config).await
        }
        Command::Config(args) => {
            let config = args.into_config();
            config.validate()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
}
