//! Session command - run a test command inside one global setup/teardown.

use tokio::process::Command;

use crate::cli::args::SessionArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::services::Services;

/// Execute the session command.
///
/// Setup failure aborts before the test command starts. Teardown always
/// runs and never changes the exit code.
pub async fn execute(args: SessionArgs, config: Config) -> AppResult<i32> {
    let Some((program, program_args)) = args.command.split_first() else {
        return Err(AppError::config("missing test command"));
    };

    let services = Services::from_config(&config)?;
    if let Err(e) = services.global_setup().await {
        services.global_teardown().await;
        return Err(e);
    }

    tracing::info!(command = %args.command.join(" "), "Running test command");
    let status = Command::new(program).args(program_args).status().await;

    services.global_teardown().await;

    let status =
        status.map_err(|e| AppError::internal(format!("failed to start {}: {}", program, e)))?;
    let code = status.code().unwrap_or(1);
    tracing::info!(code, "Test command finished");
    Ok(code)
}
