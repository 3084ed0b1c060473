//! zentao - ZenTao API from the terminal
//!
//! Sends GET/POST/PUT/DELETE requests through the authenticated client and
//! prints the raw response body.

use std::process::ExitCode;

use clap::Parser;

use zentao_client::cli::{self, Cli};
use zentao_client::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match logging::init(&cli.log_config()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = std::io::stdout().lock();
    let result = cli::run(cli, &mut stdout).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, critical = e.is_critical(), "Command failed");
            eprintln!("Error: {}", e.user_message());
            if let Some(action) = e.suggested_action() {
                eprintln!("Hint: {}", action);
            }
            ExitCode::from(e.exit_code())
        }
    }
}
