//! The `sbq` binary.

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use sbo_toolkit::error::SboToolkitError;
use sbo_toolkit::{cli, mesg};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // The prompt already announced the user's quit
            if !matches!(err, SboToolkitError::UserCancel) {
                mesg::error(&err.to_string());
            }
            ExitCode::FAILURE
        }
    }
}
