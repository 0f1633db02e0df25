// In-process stand-in for the QRebel REST service.
#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use qrebel_gate::fields::Fields;
use qrebel_gate::gate::{Allowances, ComparisonStrategy, IssueTypeSelection};

pub const APP_NAME: &str = "foobar";
pub const TARGET_BUILD: &str = "2.0.6RC3";
pub const TARGET_VERSION: &str = "1";
pub const BASELINE_BUILD: &str = "2.05RC1";
pub const BASELINE_VERSION: &str = TARGET_VERSION;
pub const API_TOKEN: &str = "correct-key";
pub const CLIENT_VERSION: &str = "0.1.0";

pub const IGNORE_ALL_SLOW_REQUESTS: u64 = 15;
pub const TOO_MANY_SLOW_REQUESTS: u64 = 13;
pub const IGNORE_ALL_EXCESSIVE_IO_ISSUES: u64 = 0;
pub const IGNORE_ALL_EXCEPTIONS: u64 = 2;
pub const FASTEST_REQUEST: u64 = 26;
pub const SLOWEST_REQUEST: u64 = 3770;
pub const GLOBAL_LIMIT_ABOVE_SLOWEST: u64 = SLOWEST_REQUEST + 1;

pub const ISSUES_JSON: &str = include_str!("../fixtures/issues.json");

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: String,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct MockQRebel {
    pub base_url: String,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockQRebel {
    /// Serve `body` with `status` for the issues endpoint; baseline PUTs get 204.
    pub async fn start(status: StatusCode, body: &str) -> Self {
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            status,
            body: body.to_string(),
            recorded: recorded.clone(),
        };
        let app = Router::new().fallback(handle).with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            recorded,
        }
    }

    pub async fn ok() -> Self {
        Self::start(StatusCode::OK, ISSUES_JSON).await
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.recorded.lock().unwrap().clone()
    }

    pub fn issues_requests(&self) -> Vec<RecordedRequest> {
        let issues_path = format!("/api/applications/{}/issues/", APP_NAME);
        self.requests()
            .into_iter()
            .filter(|r| r.method == Method::GET && r.path == issues_path)
            .collect()
    }

    /// The single issues request the step is expected to make.
    pub fn issues_query(&self) -> HashMap<String, String> {
        let requests = self.issues_requests();
        assert_eq!(requests.len(), 1, "expected exactly one issues request");
        requests[0].query.clone()
    }
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let query = url::form_urlencoded::parse(uri.query().unwrap_or("").as_bytes())
        .into_owned()
        .collect();
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    state.recorded.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        query,
        authorization,
        body: String::from_utf8_lossy(&body).to_string(),
    });

    if method == Method::PUT {
        return (StatusCode::NO_CONTENT, String::new());
    }
    (state.status, state.body.clone())
}

pub fn default_fields(server_url: &str) -> Fields {
    Fields {
        app_name: Some(APP_NAME.to_string()),
        target_build: Some(TARGET_BUILD.to_string()),
        target_version: Some(TARGET_VERSION.to_string()),
        baseline_build: Some(BASELINE_BUILD.to_string()),
        baseline_version: Some(BASELINE_VERSION.to_string()),
        api_token: Some(API_TOKEN.to_string()),
        server_url: Some(server_url.to_string()),
        comparison_strategy: ComparisonStrategy::DefaultBaseline,
        allowances: Allowances {
            slow_requests_allowed: IGNORE_ALL_SLOW_REQUESTS,
            excessive_io_allowed: IGNORE_ALL_EXCESSIVE_IO_ISSUES,
            exceptions_allowed: IGNORE_ALL_EXCEPTIONS,
            sla_global_limit: GLOBAL_LIMIT_ABOVE_SLOWEST,
        },
        issue_types: IssueTypeSelection::all(),
    }
}
