use linkopt_domain::{UpdateModelRequest, UpdateModelResponse};

use crate::{QualificationClient, Result};

impl QualificationClient {
	/// Forwards link feedback to the user's classifier.
	///
	/// Any 2xx response counts as an update; the response body is not inspected.
	pub async fn update_model(
		&self,
		user_id: &str,
		request: &UpdateModelRequest,
	) -> Result<UpdateModelResponse> {
		let url = self.endpoint(&["model", user_id, "update"]);

		self.http().post_json(url, request).await?;

		Ok(UpdateModelResponse::updated())
	}
}
