use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ElementId;

/// A suggested link, the projection of one selected assignment variable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
	pub source_id: ElementId,
	pub target_id: ElementId,
	pub qualification: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub info: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LinksResponse {
	pub links: Vec<Link>,
}
impl LinksResponse {
	pub fn empty() -> Self {
		Self::default()
	}
}

/// The link a user accepted or rejected, as echoed back by the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackLink {
	pub source_id: ElementId,
	pub target_id: ElementId,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModelRequest {
	pub link: FeedbackLink,
	pub is_link: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateModelResponse {
	pub message: String,
}
impl UpdateModelResponse {
	pub const FAILED: &'static str = "model update failed";
	pub const UPDATED: &'static str = "model updated";

	pub fn updated() -> Self {
		Self { message: Self::UPDATED.to_string() }
	}

	pub fn failed() -> Self {
		Self { message: Self::FAILED.to_string() }
	}
}
