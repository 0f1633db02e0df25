use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::config::AUTHORIZATION_HEADER;
use crate::error::{GateError, GateResult};
use crate::gate::request::{IssuesQuery, CONNECTION_PARAMS_BLANK};
use crate::gate::{EntryPointLatencies, IssueCounters};

// ============================================================================
// Wire model
// ============================================================================

/// A build name with an optional version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BuildClassifier {
    #[serde(alias = "build")]
    pub name: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct DefaultBaselineBody<'a> {
    build: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationStats {
    pub slowest_percentile: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryPoint {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub duration: Option<DurationStats>,
}

/// Body of `GET /api/applications/{app}/issues/`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IssuesResponse {
    pub app_name: Option<String>,
    pub app_view_url: Option<String>,
    pub issues_count: IssueCounters,
    pub entry_points: Vec<EntryPoint>,
    pub target: Option<BuildClassifier>,
    pub target_build: Option<String>,
    pub target_version: Option<String>,
    pub baseline_build: Option<String>,
    pub baseline_version: Option<String>,
}

impl IssuesResponse {
    pub fn latencies(&self) -> EntryPointLatencies {
        self.entry_points
            .iter()
            .map(|ep| ep.duration.as_ref().and_then(|d| d.slowest_percentile))
            .collect()
    }

    /// Target build echoed by the service, flat or nested.
    pub fn echoed_target(&self) -> BuildClassifier {
        let nested = self.target.clone().unwrap_or_default();
        BuildClassifier {
            name: self.target_build.clone().or(nested.name),
            version: self.target_version.clone().or(nested.version),
        }
    }

    pub fn echoed_baseline(&self) -> BuildClassifier {
        BuildClassifier {
            name: self.baseline_build.clone(),
            version: self.baseline_version.clone(),
        }
    }
}

// ============================================================================
// Client
// ============================================================================

pub struct QRebelClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl QRebelClient {
    pub fn new(server_url: &str, timeout: Duration) -> GateResult<Self> {
        let base_url = Url::parse(server_url.trim())
            .map_err(|e| GateError::config(format!("Invalid server URL '{}': {}", server_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(GateError::config(format!("Invalid server URL '{}'", server_url)));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            timeout,
        })
    }

    /// `{server}/api/applications/{app}/{segments...}/`, keeping any path prefix.
    fn endpoint(&self, app_name: &str, segments: &[&str]) -> GateResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| GateError::config(format!("Invalid server URL '{}'", self.base_url)))?;
            path.pop_if_empty()
                .extend(["api", "applications", app_name])
                .extend(segments)
                .push("");
        }
        Ok(url)
    }

    pub fn issues_url(&self, app_name: &str, query: &IssuesQuery) -> GateResult<Url> {
        let mut url = self.endpoint(app_name, &["issues"])?;
        url.query_pairs_mut().extend_pairs(query.pairs());
        Ok(url)
    }

    /// Fetch issue counts and entry-point latencies for the target build.
    pub async fn get_issues(
        &self,
        api_token: &str,
        app_name: &str,
        query: &IssuesQuery,
    ) -> GateResult<IssuesResponse> {
        let url = self.issues_url(app_name, query)?;
        info!("[QRebel] ---> GET {}", url);

        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION_HEADER, api_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(self.timeout)
            .send()
            .await?;
        info!("[QRebel] <--- {}", resp.status());

        let body = error_for_status(resp).await?;
        debug!("Issues response: {}", body);
        Ok(serde_json::from_str(&body)?)
    }

    /// Make `build` the service's default baseline for `app_name`.
    pub async fn set_default_baseline(
        &self,
        api_token: &str,
        app_name: &str,
        build: &str,
        version: Option<&str>,
    ) -> GateResult<()> {
        let url = self.endpoint(app_name, &["baselines", "default"])?;
        info!("[QRebel] ---> PUT {}", url);

        let resp = self
            .http
            .put(url)
            .header(AUTHORIZATION_HEADER, api_token)
            .json(&DefaultBaselineBody { build, version })
            .timeout(self.timeout)
            .send()
            .await?;
        info!("[QRebel] <--- {}", resp.status());

        error_for_status(resp).await.map(|_| ())
    }

    /// Probe the issues endpoint with no query, translating the usual failures.
    pub async fn test_connection(&self, api_token: &str, app_name: &str) -> GateResult<()> {
        let url = self.endpoint(app_name, &["issues"])?;
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION_HEADER, api_token)
            .timeout(self.timeout)
            .send()
            .await?;

        match resp.status() {
            StatusCode::UNAUTHORIZED => Err(GateError::Remote("Authorization failed".to_string())),
            StatusCode::NOT_FOUND => Err(GateError::Remote("No application found".to_string())),
            _ => error_for_status(resp).await.map(|_| ()),
        }
    }
}

/// Body text of a successful response; the body, or the status line when the
/// body is empty, as a `Remote` error otherwise. A failed body read is a
/// `Transport` error.
async fn error_for_status(resp: reqwest::Response) -> GateResult<String> {
    let status = resp.status();
    let body = resp.text().await?;
    if status.is_success() {
        return Ok(body);
    }
    if body.trim().is_empty() {
        Err(GateError::Remote(format!("HTTP {}", status)))
    } else {
        Err(GateError::Remote(body))
    }
}

/// Connection test entry point shared by the CLI.
pub async fn check_connection(
    app_name: Option<&str>,
    api_token: Option<&str>,
    server_url: Option<&str>,
    timeout: Duration,
) -> GateResult<()> {
    let blank = |v: Option<&str>| v.map_or(true, |s| s.trim().is_empty());
    if blank(app_name) || blank(api_token) || blank(server_url) {
        return Err(GateError::config(CONNECTION_PARAMS_BLANK));
    }
    let client = QRebelClient::new(server_url.unwrap_or_default(), timeout)?;
    client
        .test_connection(
            api_token.unwrap_or_default().trim(),
            app_name.unwrap_or_default().trim(),
        )
        .await
}
