mod error;

pub use error::{Error, Result};

use std::{
	collections::VecDeque,
	net::SocketAddr,
	sync::{Arc, Mutex, MutexGuard},
	time::Duration,
};

use axum::{
	Json, Router,
	body::Bytes,
	extract::State,
	http::{HeaderMap, Method, StatusCode, Uri},
	response::{IntoResponse, Response},
};
use serde_json::Value;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle, time};

/// One canned reply of the fake provider.
#[derive(Clone, Debug)]
pub struct ScriptedResponse {
	pub status: u16,
	pub body: Value,
	pub delay: Option<Duration>,
}
impl ScriptedResponse {
	pub fn ok(body: Value) -> Self {
		Self { status: 200, body, delay: None }
	}

	pub fn status(status: u16) -> Self {
		Self { status, body: serde_json::json!({ "error": "scripted failure" }), delay: None }
	}

	/// `{ "qualifications": rows }` with bare numeric cells.
	pub fn qualifications(rows: &[Vec<f64>]) -> Self {
		Self::ok(serde_json::json!({ "qualifications": rows }))
	}

	pub fn delayed(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);

		self
	}
}

#[derive(Clone, Debug)]
pub struct RecordedRequest {
	pub method: Method,
	pub path: String,
	pub headers: HeaderMap,
	/// `Value::Null` when the body was not JSON.
	pub body: Value,
}

struct Shared {
	script: Mutex<VecDeque<ScriptedResponse>>,
	fallback: Mutex<ScriptedResponse>,
	requests: Mutex<Vec<RecordedRequest>>,
}

/// In-process stand-in for the qualification service, bound to an ephemeral loopback port.
///
/// Queued responses are served in order; once the queue is empty every request gets the
/// fallback response, which starts as an empty qualification matrix.
pub struct FakeProvider {
	addr: SocketAddr,
	shared: Arc<Shared>,
	shutdown: Option<oneshot::Sender<()>>,
	task: JoinHandle<()>,
}
impl FakeProvider {
	pub async fn start() -> Result<Self> {
		let listener = TcpListener::bind("127.0.0.1:0").await?;
		let addr = listener.local_addr()?;
		let shared = Arc::new(Shared {
			script: Mutex::new(VecDeque::new()),
			fallback: Mutex::new(ScriptedResponse::qualifications(&[])),
			requests: Mutex::new(Vec::new()),
		});
		let app = Router::new().fallback(respond).with_state(shared.clone());
		let (shutdown, signal) = oneshot::channel::<()>();
		let task = tokio::spawn(async move {
			let server = axum::serve(listener, app).with_graceful_shutdown(async {
				let _ = signal.await;
			});

			if let Err(err) = server.await {
				eprintln!("Fake provider stopped with an error: {err}.");
			}
		});

		Ok(Self { addr, shared, shutdown: Some(shutdown), task })
	}

	pub fn addr(&self) -> SocketAddr {
		self.addr
	}

	/// Base URL suitable for `provider.api_base`.
	pub fn base_url(&self) -> String {
		format!("http://{}", self.addr)
	}

	pub fn push(&self, response: ScriptedResponse) {
		lock(&self.shared.script).push_back(response);
	}

	pub fn set_fallback(&self, response: ScriptedResponse) {
		*lock(&self.shared.fallback) = response;
	}

	pub fn request_count(&self) -> usize {
		lock(&self.shared.requests).len()
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		lock(&self.shared.requests).clone()
	}

	pub fn last_request(&self) -> Option<RecordedRequest> {
		lock(&self.shared.requests).last().cloned()
	}
}
impl Drop for FakeProvider {
	fn drop(&mut self) {
		if let Some(shutdown) = self.shutdown.take() {
			let _ = shutdown.send(());
		}

		self.task.abort();
	}
}

async fn respond(
	State(shared): State<Arc<Shared>>,
	method: Method,
	uri: Uri,
	headers: HeaderMap,
	body: Bytes,
) -> Response {
	let body = serde_json::from_slice(&body).unwrap_or(Value::Null);

	lock(&shared.requests).push(RecordedRequest {
		method,
		path: uri.path().to_string(),
		headers,
		body,
	});

	let scripted = lock(&shared.script).pop_front();
	let response = scripted.unwrap_or_else(|| lock(&shared.fallback).clone());

	if let Some(delay) = response.delay {
		time::sleep(delay).await;
	}

	let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

	(status, Json(response.body)).into_response()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|err| err.into_inner())
}
