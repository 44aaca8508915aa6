// src/main.rs

use std::process::ExitCode;

use tracing::error;

use dirwatch::{cli, load_config, logging, run};

/// Exit status when the config cannot be read or is invalid.
const EXIT_CONFIG: u8 = 4;

fn main() -> ExitCode {
    let args = cli::parse();

    let cfg = match load_config(&args) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("dirwatch: {err}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if let Err(err) = logging::init_logging(&args, &cfg.daemon.logfile) {
        eprintln!("dirwatch error: {err:?}");
        return ExitCode::FAILURE;
    }

    match run(&args, cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "dirwatch failed");
            eprintln!("dirwatch error: {err}");
            ExitCode::FAILURE
        }
    }
}
