use axum::{
	Json, Router,
	extract::{Path, State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use crate::state::AppState;
use linkopt_domain::{LinksResponse, UpdateModelResponse};
use linkopt_service::Error as ServiceError;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/", get(banner))
		.route("/health", get(health))
		.route("/links", post(links))
		.route("/model/{user_id}/links", post(user_links))
		.route("/model/{user_id}/update", post(update_model))
		.with_state(state)
}

pub fn banner_text() -> String {
	format!("Suggested Link Optimizer App v{}", linkopt_cli::VERSION)
}

async fn banner() -> String {
	banner_text()
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn links(
	State(state): State<AppState>,
	payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<LinksResponse>, ApiError> {
	let Json(payload) = payload?;

	suggest(&state, payload, None).await
}

async fn user_links(
	State(state): State<AppState>,
	Path(user_id): Path<String>,
	payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<LinksResponse>, ApiError> {
	let Json(payload) = payload?;

	suggest(&state, payload, Some(&user_id)).await
}

async fn suggest(
	state: &AppState,
	payload: Value,
	user_id: Option<&str>,
) -> Result<Json<LinksResponse>, ApiError> {
	let span = tracing::info_span!("suggest_links", request_id = %Uuid::new_v4(), user_id);
	let response = state.service.suggest_links(payload, user_id).instrument(span).await?;

	Ok(Json(response))
}

async fn update_model(
	State(state): State<AppState>,
	Path(user_id): Path<String>,
	payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<UpdateModelResponse>, ApiError> {
	let Json(payload) = payload?;
	let span = tracing::info_span!("update_model", request_id = %Uuid::new_v4());
	let response = state.service.update_model(&user_id, payload).instrument(span).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message, fields } => ApiError::new(
				StatusCode::BAD_REQUEST,
				"invalid_request",
				message,
				(!fields.is_empty()).then_some(fields),
			),
			ServiceError::Internal { message } => {
				tracing::error!(%message, "Request failed.");

				ApiError::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					"internal_error",
					"Internal error.",
					None,
				)
			},
			ServiceError::Cancelled => ApiError::new(
				StatusCode::SERVICE_UNAVAILABLE,
				"cancelled",
				"Request was cancelled.",
				None,
			),
		}
	}
}

impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		ApiError::new(
			StatusCode::BAD_REQUEST,
			"invalid_request",
			rejection.body_text(),
			Some(vec!["$".to_string()]),
		)
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}
