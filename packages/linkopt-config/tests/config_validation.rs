use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use linkopt_config::{Config, Error};

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn sample_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let mut table = root.as_table_mut().expect("Sample config must be a table.");

	for part in section.split('.') {
		table = table
			.get_mut(part)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Sample config must include [{section}]."));
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render sample config.")
}

fn write_temp_config(payload: &str) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("linkopt_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: &str) -> linkopt_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = linkopt_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn expect_validation(payload: &str, needle: &str) {
	let err = load_payload(payload).expect_err("Expected a validation error.");

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error kind: {err:?}");
	assert!(err.to_string().contains(needle), "Unexpected error message: {err}");
}

#[test]
fn sample_config_loads_and_normalizes() {
	let cfg = load_payload(SAMPLE_CONFIG_TOML).expect("Sample config must load.");

	assert_eq!(cfg.provider.api_base, "http://127.0.0.1:8000");
	assert_eq!(cfg.provider.retry.retry_statuses, vec![500, 502, 503, 504]);
	assert_eq!(cfg.solver.time_limit_ms, 10_000);
	assert_eq!(cfg.service.log_level, "info");
}

#[test]
fn solver_and_retry_sections_are_optional() {
	let payload = r#"
[service]
http_bind = "127.0.0.1:5000"

[provider]
api_base = "https://scores.internal"
timeout_ms = 2000
"#;
	let cfg = load_payload(payload).expect("Minimal config must load.");

	assert_eq!(cfg.provider.retry.max_attempts, 3);
	assert_eq!(cfg.provider.retry.backoff_base_ms, 300);
	assert_eq!(cfg.solver.max_concurrent_solves, 4);
	assert_eq!(cfg.service.log_level, "info");
}

#[test]
fn api_base_must_be_http() {
	let payload = sample_with("provider", "api_base", Value::String("ftp://scores".to_string()));

	expect_validation(&payload, "provider.api_base must be an http or https URL.");
}

#[test]
fn timeout_must_be_positive() {
	let payload = sample_with("provider", "timeout_ms", Value::Integer(0));

	expect_validation(&payload, "provider.timeout_ms must be greater than zero.");
}

#[test]
fn retry_attempts_must_be_positive() {
	let payload = sample_with("provider.retry", "max_attempts", Value::Integer(0));

	expect_validation(&payload, "provider.retry.max_attempts must be greater than zero.");
}

#[test]
fn retry_statuses_must_be_server_errors() {
	let payload = sample_with(
		"provider.retry",
		"retry_statuses",
		Value::Array(vec![Value::Integer(503), Value::Integer(404)]),
	);

	expect_validation(&payload, "got 404");
}

#[test]
fn backoff_base_must_not_exceed_max() {
	let payload = sample_with("provider.retry", "backoff_base_ms", Value::Integer(10_000));

	expect_validation(&payload, "provider.retry.backoff_base_ms must not exceed");
}

#[test]
fn solver_time_limit_must_be_positive() {
	let payload = sample_with("solver", "time_limit_ms", Value::Integer(0));

	expect_validation(&payload, "solver.time_limit_ms must be greater than zero.");
}

#[test]
fn default_header_values_must_be_strings() {
	let payload = sample_with("provider.default_headers", "x-retries", Value::Integer(3));

	expect_validation(&payload, "provider.default_headers.x-retries must be a string.");
}

#[test]
fn missing_file_reports_read_error() {
	let mut path = env::temp_dir();

	path.push("linkopt_config_test_missing.toml");

	let err = linkopt_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }), "Unexpected error: {err:?}");
}

#[test]
fn malformed_toml_reports_parse_error() {
	let err = load_payload("[service\nhttp_bind = ").expect_err("Expected parse error.");

	assert!(matches!(err, Error::ParseConfig { .. }), "Unexpected error: {err:?}");
}
