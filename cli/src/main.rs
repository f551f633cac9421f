//! skylift - Entry Point
//!
//! Provision, deploy, and scale cloud fleets from a JSON environment map.
//! One binary covers the CLI workflows and the HTTP build panel.

use clap::{CommandFactory, Parser};
use colored::Colorize;

use skylift::app::options::Mode;
use skylift::app::run::run;
use skylift::cli::Cli;
use skylift::logs::{init_logging, LogOptions};

use tracing::info;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let Some(options) = cli.into_options() else {
        let _ = Cli::command().print_help();
        return;
    };

    // Log files only matter for the long-running server
    let log_options = LogOptions {
        file_output: matches!(options.mode, Mode::Listen),
        ..Default::default()
    };
    let guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            println!("Failed to initialize logging: {e}");
            None
        }
    };

    let result = run(options, await_shutdown_signal()).await;
    drop(guard);
    if let Err(e) = result {
        eprintln!();
        eprintln!("{} {}", "error:".red(), e);
        std::process::exit(1);
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).unwrap();
        let mut sigint = signal(SignalKind::interrupt()).unwrap();

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}
