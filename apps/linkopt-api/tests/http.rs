use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode, header::CONTENT_TYPE},
};
use serde_json::{Map, Value};
use tower::util::ServiceExt;

use linkopt_api::{routes, state::AppState};
use linkopt_config::{Config, ProviderConfig, Retry, Service, Solver};
use linkopt_testkit::{FakeProvider, ScriptedResponse};

fn test_config(api_base: String) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		provider: ProviderConfig {
			api_base,
			timeout_ms: 2_000,
			default_headers: Map::new(),
			retry: Retry {
				max_attempts: 1,
				backoff_base_ms: 1,
				backoff_max_ms: 1,
				retry_statuses: vec![503],
			},
		},
		solver: Solver { time_limit_ms: 5_000, max_concurrent_solves: 1 },
	}
}

async fn app() -> (FakeProvider, Router) {
	let fake = FakeProvider::start().await.expect("Failed to start fake provider.");
	let state = AppState::new(test_config(fake.base_url())).expect("Failed to build app state.");

	(fake, routes::router(state))
}

fn post_json(uri: &str, body: String) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.header(CONTENT_TYPE, "application/json")
		.body(Body::from(body))
		.expect("Failed to build request.")
}

fn links_payload() -> String {
	serde_json::json!({
		"sources": [
			{ "id": 1, "parent": "nav", "label": "Pricing", "color": { "r": 0.1, "g": 0.2, "b": 0.3 } },
			{ "id": 2, "label": "Docs" }
		],
		"targets": [
			{ "id": "a", "topics": ["billing"] },
			{ "id": "b" }
		]
	})
	.to_string()
}

async fn read_json(response: axum::response::Response) -> Value {
	let bytes = body::to_bytes(response.into_body(), usize::MAX).await.expect("Failed to read body.");

	serde_json::from_slice(&bytes).expect("Body is not JSON.")
}

#[tokio::test]
async fn serves_the_banner_and_health() {
	let (_fake, app) = app().await;
	let response = app
		.clone()
		.oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
		.await
		.expect("Failed to call /.");

	assert_eq!(response.status(), StatusCode::OK);

	let bytes = body::to_bytes(response.into_body(), usize::MAX).await.expect("body");

	assert_eq!(bytes.as_ref(), routes::banner_text().as_bytes());
	assert!(routes::banner_text().starts_with("Suggested Link Optimizer App v"));

	let response = app
		.oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
		.await
		.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn returns_ranked_links() {
	let (fake, app) = app().await;

	fake.push(ScriptedResponse::ok(serde_json::json!({
		"qualifications": [
			[-4, { "qualification": 0.7, "info": { "reason": "topic" } }],
			[0.2, -4]
		]
	})));

	let response =
		app.oneshot(post_json("/links", links_payload())).await.expect("Failed to call /links.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(
		read_json(response).await,
		serde_json::json!({
			"links": [
				{ "sourceId": 1, "targetId": "b", "qualification": 0.7, "info": { "reason": "topic" } },
				{ "sourceId": 2, "targetId": "a", "qualification": 0.2 }
			]
		})
	);
	assert_eq!(fake.last_request().map(|req| req.path), Some("/qualifications".to_string()));
}

#[tokio::test]
async fn wide_numeric_ids_round_trip() {
	let (fake, app) = app().await;
	let payload = serde_json::json!({
		"sources": [{ "id": 1.0 }, { "id": u64::MAX }],
		"targets": [{ "id": "a" }, { "id": "b" }]
	});

	fake.push(ScriptedResponse::qualifications(&[vec![0.9, 0.1], vec![0.2, 0.3]]));

	let response =
		app.oneshot(post_json("/links", payload.to_string())).await.expect("Failed to call /links.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(
		read_json(response).await,
		serde_json::json!({
			"links": [
				{ "sourceId": 1.0, "targetId": "a", "qualification": 0.9 },
				{ "sourceId": u64::MAX, "targetId": "b", "qualification": 0.3 }
			]
		})
	);
}

#[tokio::test]
async fn user_routes_reach_the_user_model() {
	let (fake, app) = app().await;

	fake.push(ScriptedResponse::qualifications(&[vec![0.5, 0.1], vec![0.1, 0.5]]));

	let response = app
		.oneshot(post_json("/model/alice/links", links_payload()))
		.await
		.expect("Failed to call user links.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(read_json(response).await["links"].as_array().map(Vec::len), Some(2));
	assert_eq!(
		fake.last_request().map(|req| req.path),
		Some("/model/alice/qualifications".to_string())
	);
}

#[tokio::test]
async fn rejects_invalid_requests_with_field_paths() {
	let (fake, app) = app().await;
	let payload = serde_json::json!({
		"sources": [{ "label": "no id", "color": { "r": 2, "g": 0, "b": 0 } }],
		"targets": [{ "id": "a", "topics": [1] }]
	});
	let response =
		app.oneshot(post_json("/links", payload.to_string())).await.expect("Failed to call /links.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let body = read_json(response).await;

	assert_eq!(body["error_code"], "invalid_request");

	let fields: Vec<&str> = body["fields"]
		.as_array()
		.expect("Missing fields.")
		.iter()
		.filter_map(Value::as_str)
		.collect();

	assert!(fields.contains(&"sources[0].id"), "{fields:?}");
	assert!(fields.contains(&"sources[0].color.r"), "{fields:?}");
	assert!(fields.contains(&"targets"), "{fields:?}");
	assert!(fields.contains(&"targets[0].topics[0]"), "{fields:?}");
	assert_eq!(fake.request_count(), 0);
}

#[tokio::test]
async fn rejects_malformed_json() {
	let (_fake, app) = app().await;
	let response = app
		.oneshot(post_json("/links", "{ not json".to_string()))
		.await
		.expect("Failed to call /links.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(read_json(response).await["fields"], serde_json::json!(["$"]));
}

#[tokio::test]
async fn provider_failures_return_no_links() {
	let (fake, app) = app().await;

	fake.push(ScriptedResponse::status(500));

	let response =
		app.oneshot(post_json("/links", links_payload())).await.expect("Failed to call /links.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(read_json(response).await, serde_json::json!({ "links": [] }));
}

#[tokio::test]
async fn ragged_matrices_are_internal_errors() {
	let (fake, app) = app().await;

	fake.push(ScriptedResponse::ok(serde_json::json!({ "qualifications": [[0.1, 0.2], [0.3]] })));

	let response =
		app.oneshot(post_json("/links", links_payload())).await.expect("Failed to call /links.");

	assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(read_json(response).await["error_code"], "internal_error");
}

#[tokio::test]
async fn forwards_model_updates() {
	let (fake, app) = app().await;
	let payload = serde_json::json!({
		"link": { "sourceId": 1, "targetId": "a", "label": "Pricing" },
		"isLink": true
	});

	fake.push(ScriptedResponse::ok(serde_json::json!({})));
	fake.push(ScriptedResponse::status(500));

	let response = app
		.clone()
		.oneshot(post_json("/model/alice/update", payload.to_string()))
		.await
		.expect("Failed to call update.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(read_json(response).await, serde_json::json!({ "message": "model updated" }));

	let recorded = fake.last_request().expect("Missing recorded request.");

	assert_eq!(recorded.path, "/model/alice/update");
	assert_eq!(recorded.body["link"]["label"], "Pricing");

	let response = app
		.oneshot(post_json("/model/alice/update", payload.to_string()))
		.await
		.expect("Failed to call update.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(read_json(response).await, serde_json::json!({ "message": "model update failed" }));
}
