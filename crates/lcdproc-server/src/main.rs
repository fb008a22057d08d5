//! LCDproc server binary.
//!
//! # Usage
//!
//! ```bash
//! # Terminal display, settings from /etc/LCDd.conf when present
//! lcdd
//!
//! # Headless, frames dumped to the log
//! lcdd -c LCDd.conf -d text -a 0.0.0.0 -p 13666 2>lcdd.log
//! ```

use std::time::Duration;

use clap::Parser;
use lcdproc_proto::{PROTOCOL_VERSION, SERVER_VERSION};
use lcdproc_server::{ConfigFile, Server, ServerConfig, drivers, settings::ServerScreenMode};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_CONFIG: &str = "/etc/LCDd.conf";

/// LCDproc display server
#[derive(Parser, Debug)]
#[command(name = "lcdd")]
#[command(about = "LCDproc server: share one character display between many clients")]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Address to bind to
    #[arg(short = 'a', long = "addr")]
    addr: Option<String>,

    /// TCP port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Display driver to load; repeat to mirror the display
    #[arg(short, long)]
    driver: Vec<String>,

    /// Seconds each screen is shown
    #[arg(short, long)]
    wait_time: Option<f64>,

    /// Server screen rotation: on, off or blank
    #[arg(short, long)]
    server_screen: Option<String>,

    /// Report level, 0 (critical) to 5 (debug)
    #[arg(short, long)]
    report_level: Option<i64>,

    /// Render interval in microseconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    frame_interval: Option<u64>,

    /// Log level (trace, debug, info, warn, error); overrides the report level
    #[arg(long)]
    log_level: Option<String>,

    /// Stay in the foreground (the server never detaches)
    #[arg(short, long)]
    foreground: bool,
}

impl Args {
    /// Command line values win over the configuration file.
    fn apply(&self, config: &mut ServerConfig) -> Result<(), String> {
        if let Some(addr) = &self.addr {
            config.bind.clone_from(addr);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if !self.driver.is_empty() {
            config.drivers.clone_from(&self.driver);
        }
        if let Some(seconds) = self.wait_time {
            let wait = Duration::try_from_secs_f64(seconds).map_err(|e| format!("invalid wait time {seconds}: {e}"))?;
            config.wait_time = Some(wait);
        }
        if let Some(mode) = &self.server_screen {
            config.server_screen =
                ServerScreenMode::from_arg(mode).ok_or_else(|| format!("invalid server screen mode '{mode}'"))?;
        }
        if let Some(level) = self.report_level {
            config.report_level = Some(level);
        }
        if let Some(interval) = self.frame_interval {
            config.frame_interval = Duration::from_micros(interval);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let (file, fallback) = match &args.config {
        Some(path) => (ConfigFile::load(path)?, None),
        None => match ConfigFile::load(DEFAULT_CONFIG) {
            Ok(file) => (file, None),
            Err(e) => (ConfigFile::new(), Some(e)),
        },
    };
    let mut config = ServerConfig::from_file(&file)?;
    args.apply(&mut config)?;

    let level = args.log_level.as_deref().or(config.report_filter()).unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    tracing::info!("LCDd version {} starting", SERVER_VERSION);
    tracing::info!("Protocol version {}", PROTOCOL_VERSION);
    if let Some(e) = fallback {
        tracing::warn!("{}; using built-in defaults", e);
    }
    if args.foreground {
        tracing::debug!("Server running in foreground");
    }

    let drivers = drivers::load_all(&config.driver_names(), &file)?;
    let server = Server::bind(&config, drivers).await?;

    tracing::info!("Server listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}
