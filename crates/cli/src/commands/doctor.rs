use std::time::Duration;

use garden_agent::llm::{provider_from_config, ProviderStatus};
use garden_core::advisor::catalog::Catalog;
use garden_core::config::{AppConfig, LoadOptions};
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
pub struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    pub fn passed(&self) -> bool {
        self.overall_status == CheckStatus::Pass
    }
}

pub fn run(json_output: bool) -> String {
    render(&build_report(), json_output)
}

pub fn render(report: &DoctorReport, json_output: bool) -> String {
    if json_output {
        return serde_json::to_string_pretty(report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(report)
}

/// Skipped checks do not fail the report; personalization is optional.
pub fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_catalog(&config));
            checks.push(check_personalization(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["catalog_load", "personalization_provider"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_catalog(config: &AppConfig) -> DoctorCheck {
    match Catalog::load_or_builtin(config.catalog.path.as_deref()) {
        Ok(catalog) => DoctorCheck {
            name: "catalog_load",
            status: CheckStatus::Pass,
            details: format!(
                "{} items loaded from {}",
                catalog.len(),
                config
                    .catalog
                    .path
                    .as_deref()
                    .map_or_else(|| "the built-in catalog".to_string(), |path| format!("`{}`", path.display()))
            ),
        },
        Err(error) => {
            DoctorCheck { name: "catalog_load", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

fn check_personalization(config: &AppConfig) -> DoctorCheck {
    match provider_from_config(&config.llm) {
        Ok(provider) if provider.status() == ProviderStatus::Disabled => DoctorCheck {
            name: "personalization_provider",
            status: CheckStatus::Skipped,
            details: "no api key configured or personalization disabled; rule reports only"
                .to_string(),
        },
        Ok(provider) => DoctorCheck {
            name: "personalization_provider",
            status: CheckStatus::Pass,
            details: format!(
                "provider `{}` ready for model `{}` with a {:?} timeout",
                provider.name(),
                config.llm.model,
                Duration::from_secs(config.llm.timeout_secs)
            ),
        },
        Err(error) => DoctorCheck {
            name: "personalization_provider",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
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
