use std::process::ExitCode;

use tracing::error;

use super::bootstrap::AppWiring;
use super::session;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    if let Err(err) = session::run(app.config) {
        error!(error = %err, "session_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
