//! Folio Admin Entry Point

mod commands;
mod config;
mod view_state;

use std::path::PathBuf;
use std::process::ExitCode;

use commands::{Command, USAGE};
use config::AdminConfig;
use view_state::ViewMode;

const APP_NAME: &str = "FolioAdmin";

#[tokio::main]
async fn main() -> ExitCode {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    let config_path: PathBuf = match args.opt_value_from_str("--config") {
        Ok(path) => path.unwrap_or_else(|| PathBuf::from(AdminConfig::DEFAULT_PATH)),
        Err(e) => return usage_error(&e.to_string()),
    };
    let view_mode = if args.contains("--list") { ViewMode::List } else { ViewMode::Grid };
    let verbose = args.contains(["-v", "--verbose"]);
    let command = match Command::parse(args) {
        Ok(command) => command,
        Err(e) => return usage_error(&e),
    };

    let mut config = match AdminConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    config.apply_env();

    if let Err(e) = rolling_logger::init_logger(config.log_dir.clone(), APP_NAME) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let store = match config.open_store() {
        Ok(store) => store,
        Err(e) => {
            let _ = rolling_logger::error(&e.to_string());
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let summary = format!("{:?}", command);
    let code = match commands::run(command, store, &config, view_mode).await {
        Ok(out) => {
            let _ = rolling_logger::info(&format!("done: {}", summary));
            println!("{}", out);
            ExitCode::SUCCESS
        }
        Err(e) => {
            let _ = rolling_logger::error(&format!("failed: {}: {}", summary, e));
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    };

    if verbose {
        for line in rolling_logger::recent_lines() {
            eprintln!("{}", line);
        }
    }
    code
}

fn usage_error(message: &str) -> ExitCode {
    eprintln!("{}\n\n{}", message, USAGE);
    ExitCode::from(2)
}
