use std::time::Duration;

use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::Value;
use tokio::time;

use crate::{Error, Result};

const MAX_BACKOFF_EXPONENT: u32 = 16;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	pub max_attempts: u32,
	pub backoff_base: Duration,
	pub backoff_max: Duration,
	pub retry_statuses: Vec<u16>,
}
impl RetryPolicy {
	pub fn from_config(cfg: &linkopt_config::Retry) -> Self {
		Self {
			max_attempts: cfg.max_attempts.max(1),
			backoff_base: Duration::from_millis(cfg.backoff_base_ms),
			backoff_max: Duration::from_millis(cfg.backoff_max_ms),
			retry_statuses: cfg.retry_statuses.clone(),
		}
	}

	/// Sleep after failed attempt `attempt` (1-based): `base * 2^(attempt - 1)`, capped.
	pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
		let exp = attempt.max(1).saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
		let base = self.backoff_base.saturating_mul(1 << exp);

		base.min(self.backoff_max)
	}

	pub fn is_retryable(&self, status: u16) -> bool {
		self.retry_statuses.contains(&status)
	}
}

/// `reqwest::Client` that retries retryable statuses with exponential backoff.
///
/// Transport errors and non-retryable statuses fail immediately.
#[derive(Clone, Debug)]
pub struct RetryingClient {
	client: Client,
	policy: RetryPolicy,
}
impl RetryingClient {
	pub fn new(client: Client, policy: RetryPolicy) -> Self {
		Self { client, policy }
	}

	pub fn policy(&self) -> &RetryPolicy {
		&self.policy
	}

	/// POSTs `body` as JSON and returns the decoded body of the first 2xx response, `Null` when
	/// that body is empty.
	pub async fn post_json<B>(&self, url: Url, body: &B) -> Result<Value>
	where
		B: Serialize + ?Sized,
	{
		let mut attempt = 1;

		loop {
			let res = self.client.post(url.clone()).json(body).send().await?;
			let status = res.status();

			if status.is_success() {
				let bytes = res.bytes().await?;

				if bytes.is_empty() {
					return Ok(Value::Null);
				}

				return Ok(serde_json::from_slice(&bytes)?);
			}

			let status = status.as_u16();

			if !self.policy.is_retryable(status) || attempt >= self.policy.max_attempts {
				return Err(Error::Status { status });
			}

			let backoff = self.policy.backoff_for_attempt(attempt);

			tracing::warn!(
				%url,
				status,
				attempt,
				backoff_ms = backoff.as_millis() as u64,
				"Provider request failed. Retrying."
			);
			time::sleep(backoff).await;

			attempt += 1;
		}
	}
}
