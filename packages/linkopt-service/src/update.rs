use serde_json::Value;

use linkopt_domain::{UpdateModelRequest, UpdateModelResponse};

use crate::{Error, LinkService, Result};

impl LinkService {
	/// Forwards link feedback to the user's classifier. Provider failures are reported in the
	/// response message, never as errors.
	pub async fn update_model(&self, user_id: &str, payload: Value) -> Result<UpdateModelResponse> {
		let request: UpdateModelRequest =
			serde_json::from_value(payload).map_err(|err| Error::InvalidRequest {
				message: format!("Update payload is malformed: {err}."),
				fields: vec!["$".to_string()],
			})?;

		match self.providers.classifier.update_model(user_id, &request).await {
			Ok(response) => {
				tracing::info!(user_id, is_link = request.is_link, "Classifier model updated.");

				Ok(response)
			},
			Err(err) => {
				tracing::warn!(user_id, error = %err, "Classifier model update failed.");

				Ok(UpdateModelResponse::failed())
			},
		}
	}
}
