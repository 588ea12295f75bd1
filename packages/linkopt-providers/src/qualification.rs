use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::Value;

use linkopt_config::ProviderConfig;
use linkopt_domain::{RawQualifications, SuggestLinksRequest};

use crate::{Error, Result, RetryPolicy, RetryingClient};

/// Client for the external qualification service.
#[derive(Clone, Debug)]
pub struct QualificationClient {
	api_base: Url,
	http: RetryingClient,
}
impl QualificationClient {
	pub fn new(cfg: &ProviderConfig) -> Result<Self> {
		let api_base = Url::parse(&cfg.api_base).map_err(|err| Error::InvalidConfig {
			message: format!("provider.api_base is not a valid URL: {err}."),
		})?;

		if api_base.cannot_be_a_base() {
			return Err(Error::InvalidConfig {
				message: "provider.api_base cannot be used as a base URL.".to_string(),
			});
		}

		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(crate::default_headers(&cfg.default_headers)?)
			.build()?;
		let http = RetryingClient::new(client, RetryPolicy::from_config(&cfg.retry));

		Ok(Self { api_base, http })
	}

	/// Fetches the `sources × targets` qualification matrix, scoped to `user_id` when given.
	pub async fn qualifications(
		&self,
		user_id: Option<&str>,
		request: &SuggestLinksRequest,
	) -> Result<RawQualifications> {
		let url = match user_id {
			Some(user_id) => self.endpoint(&["model", user_id, "qualifications"]),
			None => self.endpoint(&["qualifications"]),
		};
		let json = self.http.post_json(url, request).await?;

		parse_qualifications(json)
	}

	/// `api_base` with `segments` appended as percent-encoded path segments.
	pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
		let mut url = self.api_base.clone();

		if let Ok(mut path) = url.path_segments_mut() {
			path.pop_if_empty().extend(segments);
		}

		url
	}

	pub(crate) fn http(&self) -> &RetryingClient {
		&self.http
	}
}

fn parse_qualifications(json: Value) -> Result<RawQualifications> {
	let Value::Object(mut body) = json else {
		return Err(Error::InvalidResponse {
			message: "Qualification response must be a JSON object.".to_string(),
		});
	};
	let rows = body.remove("qualifications").ok_or_else(|| Error::InvalidResponse {
		message: "Qualification response is missing qualifications.".to_string(),
	})?;

	Ok(serde_json::from_value(rows)?)
}
