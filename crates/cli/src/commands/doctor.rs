use chrono::Utc;
use http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, Method};
use secrecy::ExposeSecret;
use serde::Serialize;
use slashbot_core::config::{AppConfig, LoadOptions};
use slashbot_slack::verify::{
    compute_signature, RequestVerifier, FORM_CONTENT_TYPE, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};

use crate::commands::CommandResult;

const SELF_TEST_BODY: &[u8] = b"command=%2Fslashbot&text=help&response_url=http%3A%2F%2Flocalhost";

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

pub fn run(options: LoadOptions, json_output: bool) -> CommandResult {
    let report = build_report(options);
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult { exit_code, output };
    }

    CommandResult { exit_code, output: render_human(&report) }
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
            checks.push(check_signing_secret(&config));
            checks.push(check_signature_round_trip(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["signing_secret_readiness", "signature_self_test"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
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

fn check_signing_secret(config: &AppConfig) -> DoctorCheck {
    let secret = config.slack.signing_secret.expose_secret();
    if secret.trim() != secret {
        return DoctorCheck {
            name: "signing_secret_readiness",
            status: CheckStatus::Fail,
            details: "signing secret has leading or trailing whitespace".to_string(),
        };
    }

    DoctorCheck {
        name: "signing_secret_readiness",
        status: CheckStatus::Pass,
        details: format!("signing secret present ({} chars)", secret.chars().count()),
    }
}

/// Signs a fixed body with the configured secret and runs it back through the
/// same verifier the server uses.
fn check_signature_round_trip(config: &AppConfig) -> DoctorCheck {
    let now = Utc::now().timestamp();
    let timestamp = now.to_string();
    let secret = config.slack.signing_secret.expose_secret();

    let signature = compute_signature(secret, &timestamp, SELF_TEST_BODY);
    let result = signed_self_test_headers(&timestamp, &signature).and_then(|headers| {
        RequestVerifier::new(config.slack.signing_secret.clone())
            .verify(&Method::POST, &headers, SELF_TEST_BODY, now)
            .map(|_| ())
            .map_err(|error| error.to_string())
    });

    match result {
        Ok(()) => DoctorCheck {
            name: "signature_self_test",
            status: CheckStatus::Pass,
            details: "signed request verified with the configured secret".to_string(),
        },
        Err(error) => {
            DoctorCheck { name: "signature_self_test", status: CheckStatus::Fail, details: error }
        }
    }
}

fn signed_self_test_headers(timestamp: &str, signature: &str) -> Result<HeaderMap, String> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
    headers.insert(
        TIMESTAMP_HEADER,
        HeaderValue::from_str(timestamp).map_err(|error| error.to_string())?,
    );
    headers.insert(
        SIGNATURE_HEADER,
        HeaderValue::from_str(signature).map_err(|error| error.to_string())?,
    );
    Ok(headers)
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
