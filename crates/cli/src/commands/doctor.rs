use product_audit_core::audit::{
    run_product_audit, AuditStatus, MarketAuditData, ProductAuditInput, ProfitabilityAuditData,
};
use product_audit_core::batch::{BatchAuditor, ProductAuditRequest, ProductRef};
use product_audit_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool, options: LoadOptions) -> String {
    let report = build_report(options);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(options: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_engine_self_test(&config));
            checks.push(check_batch_runtime(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "engine_self_test",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "batch_runtime",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn probe_input() -> ProductAuditInput {
    ProductAuditInput {
        profitability: Some(ProfitabilityAuditData {
            sell_price: Some(49.0),
            cost_price: Some(18.0),
            ..Default::default()
        }),
        market: Some(MarketAuditData { trending_score: Some(75.0), ..Default::default() }),
        ..Default::default()
    }
}

/// Audits a fixed probe product twice and requires identical results.
fn check_engine_self_test(config: &AppConfig) -> DoctorCheck {
    let input = probe_input();
    let outcome = run_product_audit(&input, Some(&config.engine)).and_then(|first| {
        run_product_audit(&input, Some(&config.engine)).map(|second| (first, second))
    });

    match outcome {
        Ok((first, second)) if first == second && first.overall_status != AuditStatus::NotApplicable => {
            DoctorCheck {
                name: "engine_self_test",
                status: CheckStatus::Pass,
                details: format!("probe product scored {}/100 deterministically", first.overall_score),
            }
        }
        Ok(_) => DoctorCheck {
            name: "engine_self_test",
            status: CheckStatus::Fail,
            details: "probe product produced inconsistent results".to_string(),
        },
        Err(error) => {
            DoctorCheck { name: "engine_self_test", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

fn check_batch_runtime(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "batch_runtime",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let auditor = match BatchAuditor::from_config(config.engine.clone(), config.batch) {
        Ok(auditor) => auditor,
        Err(error) => {
            return DoctorCheck {
                name: "batch_runtime",
                status: CheckStatus::Fail,
                details: error.to_string(),
            };
        }
    };

    let request = ProductAuditRequest {
        product: ProductRef { id: "doctor-probe".to_string(), name: "Doctor probe".to_string(), sku: None },
        input: probe_input(),
    };
    let report = runtime.block_on(auditor.run(vec![request]));

    if report.incomplete() == 0 {
        DoctorCheck {
            name: "batch_runtime",
            status: CheckStatus::Pass,
            details: format!(
                "probe batch completed (concurrency {}, item timeout {} ms)",
                config.batch.concurrency, config.batch.item_timeout_ms
            ),
        }
    } else {
        DoctorCheck {
            name: "batch_runtime",
            status: CheckStatus::Fail,
            details: format!("probe batch did not complete within {} ms", config.batch.item_timeout_ms),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
