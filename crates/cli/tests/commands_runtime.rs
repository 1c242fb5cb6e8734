use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, Method};
use serde_json::Value;
use slashbot_cli::commands::{config, doctor, sign};
use slashbot_core::config::LoadOptions;
use slashbot_slack::verify::{
    RequestVerifier, FORM_CONTENT_TYPE, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};

const SLACK_EXAMPLE_SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";
const SLACK_EXAMPLE_BODY: &str = "token=xyzz0WbapA4vBCDEFasx0q6G&team_id=T1DC2JH3J&team_domain=testteamnow&channel_id=G8PSS9T3V&channel_name=foobar&user_id=U2CERLKJA&user_name=roadrunner&command=%2Fwebhook-collect&text=&response_url=https%3A%2F%2Fhooks.slack.com%2Fcommands%2FT1DC2JH3J%2F397700885554%2F96rGlfmibIGlgcZRskXaIFfN&trigger_id=398738663015.47445629121.803a0bc887a14d10d2c447fce8b6703c";

#[test]
fn sign_reproduces_slack_documented_signature() {
    with_env(&[("SLASHBOT_SLACK_SIGNING_SECRET", SLACK_EXAMPLE_SECRET)], || {
        let result = sign::run(LoadOptions::default(), SLACK_EXAMPLE_BODY, Some(1_531_420_618));
        assert_eq!(result.exit_code, 0, "expected signing to succeed");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "sign");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["details"]["headers"]["x-slack-request-timestamp"], "1531420618");
        assert_eq!(
            payload["details"]["headers"]["x-slack-signature"],
            "v0=a2114d57b48eac39b9ad189dd8316235a7b4a8d21a10bd27519666489c69b503"
        );
    });
}

#[test]
fn sign_output_is_accepted_by_the_verifier() {
    with_env(&[("SLASHBOT_SLACK_SIGNING_SECRET", "local-dev-secret")], || {
        let body = "command=%2Fbot&text=echo+hi&response_url=http%3A%2F%2Flocalhost%3A9000";
        let result = sign::run(LoadOptions::default(), body, None);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let timestamp = payload["details"]["headers"][TIMESTAMP_HEADER].as_str().expect("ts");
        let signature = payload["details"]["headers"][SIGNATURE_HEADER].as_str().expect("sig");

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        headers.insert(TIMESTAMP_HEADER, HeaderValue::from_str(timestamp).expect("header"));
        headers.insert(SIGNATURE_HEADER, HeaderValue::from_str(signature).expect("header"));
        let now = timestamp.parse::<i64>().expect("numeric timestamp");

        let verifier = RequestVerifier::new("local-dev-secret".to_owned().into());
        let verified = verifier.verify(&Method::POST, &headers, body.as_bytes(), now);
        assert_eq!(verified, Ok(body.as_bytes()));
    });
}

#[test]
fn sign_returns_config_failure_without_secret() {
    with_env(&[], || {
        let result = sign::run(LoadOptions::default(), "text=help", Some(1));
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "sign");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
        assert!(payload.get("details").is_none());
    });
}

#[test]
fn doctor_json_passes_with_signing_secret() {
    with_env(&[("SLASHBOT_SLACK_SIGNING_SECRET", SLACK_EXAMPLE_SECRET)], || {
        let result = doctor::run(LoadOptions::default(), true);
        assert_eq!(result.exit_code, 0);

        let report = parse_payload(&result.output);
        assert_eq!(report["overall_status"], "pass");
        let checks = report["checks"].as_array().expect("checks array");
        let names: Vec<&str> = checks.iter().filter_map(|check| check["name"].as_str()).collect();
        assert_eq!(
            names,
            vec!["config_validation", "signing_secret_readiness", "signature_self_test"]
        );
        assert!(checks.iter().all(|check| check["status"] == "pass"));
        assert!(!result.output.contains(SLACK_EXAMPLE_SECRET));
    });
}

#[test]
fn doctor_skips_dependent_checks_when_config_fails() {
    with_env(&[], || {
        let result = doctor::run(LoadOptions::default(), true);
        assert_eq!(result.exit_code, 1);

        let report = parse_payload(&result.output);
        assert_eq!(report["overall_status"], "fail");
        assert_eq!(report["checks"][0]["status"], "fail");
        assert_eq!(report["checks"][1]["status"], "skipped");
        assert_eq!(report["checks"][2]["status"], "skipped");
    });
}

#[test]
fn doctor_human_output_lists_checks() {
    with_env(&[("SLASHBOT_SLACK_SIGNING_SECRET", SLACK_EXAMPLE_SECRET)], || {
        let result = doctor::run(LoadOptions::default(), false);

        assert!(result.output.starts_with("doctor: all readiness checks passed"));
        assert!(result.output.contains("- [ok] signature_self_test:"));
    });
}

#[test]
fn config_redacts_secret_and_attributes_sources() {
    with_env(
        &[("SLASHBOT_SLACK_SIGNING_SECRET", SLACK_EXAMPLE_SECRET), ("SLASHBOT_LOG_LEVEL", "debug")],
        || {
            let output = config::run(LoadOptions::default());

            assert!(!output.contains(SLACK_EXAMPLE_SECRET));
            assert!(output.contains(
                "- slack.signing_secret = <redacted, 32 chars> (source: env (SLASHBOT_SLACK_SIGNING_SECRET))"
            ));
            assert!(output.contains("- logging.level = debug (source: env (SLASHBOT_LOG_LEVEL))"));
            assert!(output.contains("- server.port = 8080 (source: default)"));
        },
    );
}

#[test]
fn config_reports_file_sources() {
    with_env(&[], || {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("slashbot.toml");
        fs::write(&path, "[server]\nport = 9300\n\n[slack]\nsigning_secret = \"file-secret\"\n")
            .expect("write config");

        let options = LoadOptions {
            config_path: Some(path.clone()),
            require_file: true,
            ..LoadOptions::default()
        };
        let output = config::run(options);

        let expected_source = format!("(source: file ({}))", path.display());
        assert!(output.contains(&format!("- server.port = 9300 {expected_source}")));
        assert!(output.contains("- server.bind_address = 127.0.0.1 (source: default)"));
        assert!(!output.contains("file-secret"));
    });
}

#[test]
fn config_reports_validation_failure() {
    with_env(&[], || {
        let output = config::run(LoadOptions::default());
        assert!(output.starts_with("config validation failed:"));
        assert!(output.contains("slack.signing_secret"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "SLASHBOT_ENV",
        "SLASHBOT_SERVER_BIND_ADDRESS",
        "SLASHBOT_SERVER_PORT",
        "SLASHBOT_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "SLASHBOT_SLACK_SIGNING_SECRET",
        "SLASHBOT_SLACK_REPLY_TIMEOUT_SECS",
        "SLASHBOT_LOGGING_LEVEL",
        "SLASHBOT_LOGGING_FORMAT",
        "SLASHBOT_LOG_LEVEL",
        "SLASHBOT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
