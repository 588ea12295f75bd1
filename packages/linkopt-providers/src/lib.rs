pub mod classifier;
pub mod qualification;
pub mod retry;

mod error;

pub use error::{Error, Result};
pub use qualification::QualificationClient;
pub use retry::{RetryPolicy, RetryingClient};

use reqwest::header::{HeaderMap, HeaderName};
use serde_json::{Map, Value};

/// Headers sent with every provider request.
pub fn default_headers(default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: format!("Default header {key} must be a string."),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}
