mod cli;
mod config;
mod error;
mod logging;
mod plugin;
mod record;
mod runner;
mod state_machine;
mod stats;
mod ui;

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use cli::Cli;
use config::HarnessConfig;
use plugin::PluginRegistry;
use runner::JobRunner;
use stats::BatchStatistics;
use ui::JobProgress;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => HarnessConfig::load_from(path)?,
        None => HarnessConfig::load()?,
    };
    if let Some(dir) = &cli.output_dir {
        config.output_dir = Some(dir.clone());
    }
    logging::init(cli.debug, &config.log_level);

    let registry = PluginRegistry::with_builtins();
    if cli.list_plugins {
        for name in registry.names() {
            println!("{name}");
        }
    }

    let stats = Arc::new(Mutex::new(BatchStatistics::new()));
    let mut runner = JobRunner::new(registry);
    let recorder = Arc::clone(&stats);
    runner.connect_callback(move |report| {
        recorder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(report);
    });
    let skip = || stats.lock().unwrap_or_else(PoisonError::into_inner).skip();

    for path in &cli.jobs {
        let Some(record) = record::load(path) else {
            ui::skipped(path);
            skip();
            continue;
        };

        let progress = JobProgress::start(path, &record.plugin_name, cli.debug);
        let result = if cli.abort {
            runner.abort(&record)
        } else {
            runner.run(&record)
        };

        match result {
            Ok(report) => {
                progress.complete(&report, config.pretty);
                if let Some(dir) = &config.output_dir {
                    match record::store_report(dir, &report) {
                        Ok(stored) => info!(path = %stored.display(), "Stored job report"),
                        Err(err) => warn!(error = %err, "Failed to store job report"),
                    }
                }
            }
            Err(err) => {
                progress.fail(&err);
                skip();
            }
        }
    }

    let stats = stats.lock().unwrap_or_else(PoisonError::into_inner);
    if config.statistics && !stats.is_empty() {
        ui::print_statistics(&stats);
    }

    Ok(())
}
