use std::path::Path;

use product_audit_core::batch::{BatchAuditor, ProductAuditRequest};
use product_audit_core::config::{AppConfig, LoadOptions};
use product_audit_core::errors::ApplicationError;

use crate::commands::{
    read_json, CommandResult, EXIT_BATCH_INCOMPLETE, EXIT_CONFIG, EXIT_INPUT,
};

pub fn run(input_path: &Path, options: LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "batch",
                "config_validation",
                format!("configuration issue: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let requests: Vec<ProductAuditRequest> = match read_json(input_path) {
        Ok(requests) => requests,
        Err(error) => {
            let interface =
                ApplicationError::Input(format!("{error:#}")).into_interface("cli-batch");
            return CommandResult::failure("batch", "input", interface.to_string(), EXIT_INPUT);
        }
    };

    let auditor = match BatchAuditor::from_config(config.engine, config.batch) {
        Ok(auditor) => auditor,
        Err(error) => {
            return CommandResult::failure(
                "batch",
                "config_validation",
                format!("configuration issue: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "batch",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                1,
            );
        }
    };

    let report = runtime.block_on(auditor.run(requests));
    let exit_code = if report.incomplete() == 0 { 0 } else { EXIT_BATCH_INCOMPLETE };

    match serde_json::to_string_pretty(&report) {
        Ok(output) => CommandResult { exit_code, output },
        Err(error) => CommandResult::failure("batch", "serialization", error.to_string(), 1),
    }
}
