//! In-process stand-in for the platform REST API, used by tool tests.
//!
//! Every request is recorded so tests can assert on exactly which remote
//! calls a tool made. Responses are queued per `(method, path)`; the last
//! queued response repeats. A `PUT` also replaces the `GET` response of the
//! same path with the uploaded body, so save-then-read round trips work.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use dssmcp_api::{ClientOptions, DssConnector, ForwardedBearer};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::server::tools::CallContext;

const API_PREFIX: &str = "/public/api/";

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    /// Path below `/public/api/`.
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
struct MockResponse {
    status: StatusCode,
    content_type: &'static str,
    body: String,
}

#[derive(Debug, Default)]
struct MockState {
    routes: HashMap<(Method, String), VecDeque<MockResponse>>,
    requests: Vec<RecordedRequest>,
}

pub(crate) struct MockDss {
    base_url: String,
    state: Arc<Mutex<MockState>>,
    server: JoinHandle<()>,
}

impl Drop for MockDss {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl MockDss {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock platform");
        let address = listener.local_addr().expect("mock address");
        let state = Arc::new(Mutex::new(MockState::default()));
        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            base_url: format!("http://{address}"),
            state,
            server,
        }
    }

    /// Queue a JSON response for `method` on `path` (relative to `/public/api/`).
    pub fn respond(&self, method: Method, path: &str, status: StatusCode, body: Value) -> &Self {
        self.enqueue(method, path, status, "application/json", body.to_string())
    }

    pub fn respond_text(&self, method: Method, path: &str, content_type: &'static str, body: &str) -> &Self {
        self.enqueue(method, path, StatusCode::OK, content_type, body.to_string())
    }

    fn enqueue(&self, method: Method, path: &str, status: StatusCode, content_type: &'static str, body: String) -> &Self {
        let mut state = self.state.lock().expect("mock state");
        state
            .routes
            .entry((method, path.to_string()))
            .or_default()
            .push_back(MockResponse { status, content_type, body });
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().expect("mock state").requests.clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == method && request.path == path)
            .collect()
    }

    pub fn connector(&self) -> Arc<DssConnector> {
        let options = ClientOptions {
            poll_interval: Duration::from_millis(5),
            request_timeout: Duration::from_secs(5),
            ..ClientOptions::default()
        };
        Arc::new(DssConnector::new(&self.base_url, &options, Arc::new(ForwardedBearer)).expect("connector"))
    }

    /// Context of a caller presenting `Bearer test-key`.
    pub fn context(&self) -> CallContext {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer test-key"));
        CallContext::new(self.connector(), Some(headers))
    }

    /// Context of a caller that sent no Authorization header.
    pub fn anonymous_context(&self) -> CallContext {
        CallContext::new(self.connector(), Some(HeaderMap::new()))
    }
}

async fn handle(State(state): State<Arc<Mutex<MockState>>>, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let path = uri.path().strip_prefix(API_PREFIX).unwrap_or(uri.path()).to_string();
    let parsed_body = if body.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&body).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned())))
    };
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let mut state = state.lock().expect("mock state");
    state.requests.push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        authorization,
        body: parsed_body,
    });

    if method == Method::PUT {
        let stored = MockResponse {
            status: StatusCode::OK,
            content_type: "application/json",
            body: String::from_utf8_lossy(&body).into_owned(),
        };
        state.routes.insert((Method::GET, path.clone()), VecDeque::from([stored]));
    }

    let response = match state.routes.get_mut(&(method.clone(), path.clone())) {
        Some(queue) if queue.len() > 1 => queue.pop_front(),
        Some(queue) => queue.front().cloned(),
        None if method == Method::PUT => Some(MockResponse {
            status: StatusCode::OK,
            content_type: "application/json",
            body: "{}".to_string(),
        }),
        None => None,
    };
    let response = response.unwrap_or_else(|| MockResponse {
        status: StatusCode::NOT_FOUND,
        content_type: "application/json",
        body: json!({
            "errorType": "com.dataiku.dip.exceptions.UnknownObjectException",
            "message": format!("no mock for {method} {path}"),
        })
        .to_string(),
    });
    (response.status, [(header::CONTENT_TYPE, response.content_type)], response.body).into_response()
}
