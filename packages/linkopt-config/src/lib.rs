mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, ProviderConfig, Retry, Service, Solver};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.provider.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "provider.api_base must be non-empty.".to_string(),
		});
	}
	if !cfg.provider.api_base.starts_with("http://") && !cfg.provider.api_base.starts_with("https://")
	{
		return Err(Error::Validation {
			message: "provider.api_base must be an http or https URL.".to_string(),
		});
	}
	if cfg.provider.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "provider.timeout_ms must be greater than zero.".to_string(),
		});
	}

	for (key, value) in &cfg.provider.default_headers {
		if !value.is_string() {
			return Err(Error::Validation {
				message: format!("provider.default_headers.{key} must be a string."),
			});
		}
	}

	let retry = &cfg.provider.retry;

	if retry.max_attempts == 0 {
		return Err(Error::Validation {
			message: "provider.retry.max_attempts must be greater than zero.".to_string(),
		});
	}
	if retry.backoff_base_ms > retry.backoff_max_ms {
		return Err(Error::Validation {
			message: "provider.retry.backoff_base_ms must not exceed provider.retry.backoff_max_ms."
				.to_string(),
		});
	}
	if let Some(status) = retry.retry_statuses.iter().find(|status| !(500..=599).contains(*status))
	{
		return Err(Error::Validation {
			message: format!(
				"provider.retry.retry_statuses must only contain server error statuses, got {status}."
			),
		});
	}
	if cfg.solver.time_limit_ms == 0 {
		return Err(Error::Validation {
			message: "solver.time_limit_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.solver.max_concurrent_solves == 0 {
		return Err(Error::Validation {
			message: "solver.max_concurrent_solves must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let trimmed = cfg.provider.api_base.trim().trim_end_matches('/').to_string();

	cfg.provider.api_base = trimmed;

	cfg.provider.retry.retry_statuses.sort_unstable();
	cfg.provider.retry.retry_statuses.dedup();
}
