// forum-install entry point

use std::path::PathBuf;
use std::process::ExitCode;

use log::{error, info};

use forum_installer::config::InstallerConfig;
use forum_installer::utils::logging;
use forum_installer::wizard::InstallOutcome;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return ExitCode::SUCCESS;
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("forum-install {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let config_path = config_path_from_args(&args);

    match logging::init_logging() {
        Ok(log_dir) => info!("logging initialized, log directory: {:?}", log_dir),
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let config = match InstallerConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Failed to load configuration from {}: {:#}",
                config_path.display(),
                e
            );
            error!("configuration load failed: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        error!("configuration rejected: {}", e);
        return ExitCode::FAILURE;
    }

    match forum_installer::run_installer(config).await {
        InstallOutcome::Completed => info!("installation completed"),
        // The wizard already reported the failure to the operator; a halted
        // install still exits cleanly.
        InstallOutcome::Halted(err) => error!("installation halted: {}", err),
    }

    ExitCode::SUCCESS
}

fn config_path_from_args(args: &[String]) -> PathBuf {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" || arg == "-c" {
            if let Some(path) = iter.next() {
                return PathBuf::from(path);
            }
        }
    }
    PathBuf::from("installer.toml")
}

fn print_usage() {
    println!("forum-install - interactive installer for the forum plugin");
    println!();
    println!("Usage: forum-install [--config <path>]");
    println!();
    println!("Options:");
    println!("  -c, --config <path>  Configuration file (default: installer.toml)");
    println!("  -h, --help           Show this help");
    println!("  -V, --version        Show the version");
    println!();
    println!("Environment:");
    println!("  FORUM_INSTALL_LOG             Log level (default: info)");
    println!("  FORUM_INSTALL_DATABASE__URL   Overrides database.url");
}
