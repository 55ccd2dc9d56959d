mod cli;
mod logging;

use std::process;
use std::time::Duration;

use chrono::{DateTime, Local};
use clap::{CommandFactory, Parser};
use colored::*;
use dotenv::dotenv;
use tracing::error;

use cli::{Cli, CompactArgs, Commands};
use wsl_reclaim::compact::Engine;
use wsl_reclaim::guest::WslController;
use wsl_reclaim::orchestrator::{Orchestrator, OrchestratorConfig, RunReport};
use wsl_reclaim::utils::{format_size, prompt};
use wsl_reclaim::{config, locator, platform, AppConfig};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let app_config = match config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::Compact(compact_args)) => {
            process::exit(run_compact(&app_config, &compact_args));
        }
        Some(Commands::List) => run_list(&app_config),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", app_config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }
}

fn run_compact(config: &AppConfig, args: &CompactArgs) -> i32 {
    let orchestrator = Orchestrator::new(
        OrchestratorConfig {
            search_roots: config.search_roots(),
            image_file_name: config.image_file_name.clone(),
            force: args.force,
        },
        Box::new(platform::is_elevated),
        Box::new(prompt::request_consent),
        Box::new(WslController::new(Duration::from_secs(
            config.shutdown_grace_secs,
        ))),
        Engine::platform_default(),
    );

    match orchestrator.run() {
        Ok(report) => {
            print_summary(&report);
            // A run where every image failed is still an overall failure.
            if report.summary.succeeded > 0 {
                0
            } else {
                1
            }
        }
        Err(err) => {
            error!("{}", err);
            1
        }
    }
}

fn print_summary(report: &RunReport) {
    let summary = &report.summary;
    println!();
    println!(
        "{} / {} images compacted, {} recovered",
        summary.succeeded.to_string().green(),
        summary.images_found,
        format_size(summary.bytes_recovered).green(),
    );
    for outcome in report.outcomes.iter().filter(|o| !o.succeeded) {
        println!(
            "  {} {}: {}",
            "failed".red(),
            outcome.image.path.display(),
            outcome.failure_detail.as_deref().unwrap_or("no detail"),
        );
    }
}

fn run_list(config: &AppConfig) {
    let images = locator::discover(&config.search_roots(), &config.image_file_name);
    if images.is_empty() {
        println!("No {} images found", config.image_file_name);
        return;
    }

    for image in &images {
        let modified = image
            .last_modified
            .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "{:>10}  {}  [{}]  {}",
            format_size(image.size_bytes_before).cyan(),
            modified,
            image.origin_directory,
            image.path.display(),
        );
    }
    let total: u64 = images.iter().map(|i| i.size_bytes_before).sum();
    println!(
        "{} image(s), {} total",
        images.len(),
        format_size(total).cyan()
    );
}
