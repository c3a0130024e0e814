use std::fs;
use std::path::Path;
use std::sync::Arc;

use garden_agent::runtime::AdvisorRuntime;
use garden_core::advisor::catalog::Catalog;
use garden_core::config::{AppConfig, LoadOptions};
use serde_json::Value;

use crate::commands::CommandResult;

const COMMAND: &str = "analyze";

/// Exit codes: 0 report produced, 1 request rejected, 2 environment problem.
pub fn run(file: &Path, offline: bool) -> CommandResult {
    let raw = match fs::read_to_string(file) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "io",
                format!("could not read `{}`: {error}", file.display()),
                2,
            );
        }
    };
    let request = match serde_json::from_str::<Value>(&raw) {
        Ok(request) => request,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "validation_error",
                format!("`{}` is not valid JSON: {error}", file.display()),
                1,
            );
        }
    };

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2),
    };

    let advisor = if offline {
        Catalog::load_or_builtin(config.catalog.path.as_deref())
            .map(|catalog| AdvisorRuntime::offline(Arc::new(catalog)))
            .map_err(|error| error.to_string())
    } else {
        AdvisorRuntime::from_config(&config).map_err(|error| error.to_string())
    };
    let advisor = match advisor {
        Ok(advisor) => advisor,
        Err(message) => return CommandResult::failure(COMMAND, "startup", message, 2),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "startup",
                format!("failed to initialize async runtime: {error}"),
                2,
            );
        }
    };

    match runtime.block_on(advisor.analyze(&request)) {
        Ok(outcome) => {
            let message = format!(
                "report {} generated ({} warning(s), personalization {:?})",
                outcome.report.report_id,
                outcome.warnings.len(),
                outcome.personalization.state
            );
            CommandResult::success_with_data(COMMAND, message, serde_json::to_value(&outcome).ok())
        }
        Err(error) => {
            let interface = error.into_interface("cli");
            CommandResult::failure(COMMAND, interface.kind().as_str(), interface.message(), 1)
        }
    }
}
