mod buffer;
mod config;
mod connection;
mod error;
mod manager;
mod record;
mod render;
mod sse;
mod strftime;
#[cfg(test)]
mod testutil;

use anyhow::Result;
use clap::Parser;
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;

use crate::manager::{LogStreamManager, ManagerConfig};
use crate::record::LogRecord;
use crate::render::{display_lines, render_entries, RenderOptions};
use crate::strftime::strftime_or_now;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs share the terminal with the painted view; stay quiet unless
    // RUST_LOG asks for more.
    SimpleLogger::new()
        .with_level(LevelFilter::Warn)
        .env()
        .init()?;

    info!("Starting streamtail");

    // Parse command-line arguments
    let cli = config::Cli::parse();

    // Load configuration
    let config = config::load_config(&cli)?;
    info!("Configuration loaded successfully");

    let spec = config.source_spec()?;

    let mut settings = ManagerConfig::new(config.server_url.clone());
    settings.max_logs = config.max_logs;

    let options = RenderOptions {
        timestamp_format: config.timestamp_format.clone(),
        combined: spec.is_combined(),
        two_columns: config.two_columns,
    };

    let mut manager = LogStreamManager::new(settings);
    manager.configure(&spec)?;
    let sources = manager.active_sources().join(", ");

    let mut snapshots = manager.subscribe();
    paint(&manager.snapshot(), &options, &sources);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let records = snapshots.borrow_and_update().clone();
                paint(&records, &options, &sources);
            }
            _ = &mut shutdown => {
                info!("Shutting down");
                manager.shutdown();
                break;
            }
        }
    }

    Ok(())
}

fn paint(records: &[LogRecord], options: &RenderOptions, sources: &str) {
    // Clear, home, repaint the whole view.
    print!("\x1b[2J\x1b[H");
    println!(
        "streamtail [{}] @ {}",
        sources,
        strftime_or_now(&options.timestamp_format, None)
    );
    println!();
    for entry in render_entries(records, options) {
        for line in display_lines(&entry, options) {
            println!("{}", line);
        }
    }
}
