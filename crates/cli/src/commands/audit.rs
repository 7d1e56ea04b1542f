use std::path::Path;

use product_audit_core::audit::{run_product_audit, ProductAuditEngineResult, ProductAuditInput};
use product_audit_core::config::{AppConfig, LoadOptions};
use product_audit_core::errors::ApplicationError;
use tracing::info;

use crate::commands::{read_json, CommandResult, EXIT_CONFIG, EXIT_INPUT};

pub fn run(input_path: &Path, json_output: bool, options: LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "audit",
                "config_validation",
                format!("configuration issue: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let input: ProductAuditInput = match read_json(input_path) {
        Ok(input) => input,
        Err(error) => {
            let interface =
                ApplicationError::Input(format!("{error:#}")).into_interface("cli-audit");
            return CommandResult::failure("audit", "input", interface.to_string(), EXIT_INPUT);
        }
    };

    let result = match run_product_audit(&input, Some(&config.engine)) {
        Ok(result) => result,
        Err(error) => {
            return CommandResult::failure(
                "audit",
                "config_validation",
                format!("configuration issue: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    info!(
        event_name = "cli.audit.completed",
        correlation_id = "cli-audit",
        input = %input_path.display(),
        overall_score = result.overall_score,
        "audit command completed"
    );

    if json_output {
        return match serde_json::to_string_pretty(&result) {
            Ok(output) => CommandResult { exit_code: 0, output },
            Err(error) => CommandResult::failure("audit", "serialization", error.to_string(), 1),
        };
    }

    CommandResult { exit_code: 0, output: render_human(&result) }
}

fn render_human(result: &ProductAuditEngineResult) -> String {
    let mut lines = vec![format!(
        "product audit: {}/100 ({})",
        result.overall_score,
        status_label(result.overall_status)
    )];

    for dimension in result.dimension_results.values() {
        let score = dimension
            .score
            .map(|score| format!("{score:.1}"))
            .unwrap_or_else(|| "n/a".to_string());
        lines.push(format!(
            "- {}: {score} ({}, weight {:.2})",
            dimension.dimension,
            status_label(dimension.status),
            dimension.weight
        ));
    }

    if !result.priority_actions.is_empty() {
        lines.push("priority actions:".to_string());
        for (rank, action) in result.priority_actions.iter().enumerate() {
            lines.push(format!(
                "  {}. [{} impact/{} effort] {}: {} (+{:.1})",
                rank + 1,
                action.impact.as_str(),
                action.effort.as_str(),
                action.check_id,
                action.action,
                action.estimated_score_gain
            ));
        }
    }

    for (label, entries) in [
        ("strengths", &result.summary.strengths),
        ("weaknesses", &result.summary.weaknesses),
        ("opportunities", &result.summary.opportunities),
        ("threats", &result.summary.threats),
    ] {
        if !entries.is_empty() {
            lines.push(format!("{label}: {}", entries.join("; ")));
        }
    }

    lines.join("\n")
}

fn status_label(status: product_audit_core::AuditStatus) -> &'static str {
    use product_audit_core::AuditStatus::*;

    match status {
        Passed => "passed",
        Warning => "warning",
        Failed => "failed",
        NotApplicable => "not applicable",
    }
}
