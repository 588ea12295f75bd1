use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub provider: ProviderConfig,
	#[serde(default)]
	pub solver: Solver,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

/// Connection settings for the external qualification/classifier service.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
	pub api_base: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	#[serde(default)]
	pub retry: Retry,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Retry {
	pub max_attempts: u32,
	pub backoff_base_ms: u64,
	pub backoff_max_ms: u64,
	/// Only responses with one of these statuses are retried.
	pub retry_statuses: Vec<u16>,
}
impl Default for Retry {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			backoff_base_ms: 300,
			backoff_max_ms: 5_000,
			retry_statuses: vec![500, 502, 503, 504],
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Solver {
	pub time_limit_ms: u64,
	pub max_concurrent_solves: u32,
}
impl Default for Solver {
	fn default() -> Self {
		Self { time_limit_ms: 10_000, max_concurrent_solves: 4 }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}
