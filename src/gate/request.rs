use super::ComparisonStrategy;
use crate::error::{GateError, GateResult};
use crate::fields::Fields;

// Query keys understood by the issues endpoint.
pub const TARGET_BUILD: &str = "targetBuild";
pub const TARGET_VERSION: &str = "targetVersion";
pub const SLOW_REQUESTS_ALLOWED: &str = "slowRequestsAllowed";
pub const EXCESSIVE_IO_ALLOWED: &str = "excessiveIOAllowed";
pub const EXCEPTIONS_ALLOWED: &str = "exceptionsAllowed";
pub const CLIENT_VERSION: &str = "jenkinsPluginVersion";
pub const ISSUES: &str = "issues";
pub const DEFAULT_BASELINE: &str = "defaultBaseline";
pub const BASELINE_BUILD: &str = "baselineBuild";
pub const BASELINE_VERSION: &str = "baselineVersion";

pub const CONNECTION_PARAMS_BLANK: &str = "Connection parameters cannot be blank";
pub const TARGET_BUILD_BLANK: &str = "Target build name cannot be blank";
pub const BASELINE_BUILD_BLANK: &str = "Baseline build name cannot be blank";

/// Query parameters for the issues endpoint, in insertion order, keys unique.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IssuesQuery {
    pairs: Vec<(&'static str, String)>,
}

impl IssuesQuery {
    fn set(&mut self, key: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    fn set_optional(&mut self, key: &'static str, value: Option<&str>) {
        if let Some(value) = value {
            self.set(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// Checks run before any remote call. Messages are shown verbatim in the build log.
pub fn validate_mandatory(fields: &Fields) -> GateResult<()> {
    if fields.app_name.is_none() || fields.server_url.is_none() || fields.api_token.is_none() {
        return Err(GateError::config(CONNECTION_PARAMS_BLANK));
    }
    require_builds(fields).map(|_| ())
}

fn require_builds(fields: &Fields) -> GateResult<&str> {
    let target_build = fields
        .target_build
        .as_deref()
        .ok_or_else(|| GateError::config(TARGET_BUILD_BLANK))?;
    if fields.comparison_strategy == ComparisonStrategy::Baseline && fields.baseline_build.is_none() {
        return Err(GateError::config(BASELINE_BUILD_BLANK));
    }
    Ok(target_build)
}

/// Build the issues query for `fields`.
///
/// The issue-type filter is always sent, as an empty string when nothing is
/// selected. Baseline fields are sent only for `BASELINE`, the default-baseline
/// flag only for `DEFAULT_BASELINE`.
pub fn build_issues_query(fields: &Fields, client_version: &str) -> GateResult<IssuesQuery> {
    let target_build = require_builds(fields)?;
    let allowances = &fields.allowances;

    let mut query = IssuesQuery::default();
    query.set(TARGET_BUILD, target_build);
    query.set_optional(TARGET_VERSION, fields.target_version.as_deref());
    query.set(SLOW_REQUESTS_ALLOWED, allowances.slow_requests_allowed.to_string());
    query.set(EXCESSIVE_IO_ALLOWED, allowances.excessive_io_allowed.to_string());
    query.set(EXCEPTIONS_ALLOWED, allowances.exceptions_allowed.to_string());
    query.set(CLIENT_VERSION, client_version);
    query.set(ISSUES, fields.issue_types.to_query_value());

    match fields.comparison_strategy {
        ComparisonStrategy::Baseline => {
            query.set_optional(BASELINE_BUILD, fields.baseline_build.as_deref());
            query.set_optional(BASELINE_VERSION, fields.baseline_version.as_deref());
        }
        ComparisonStrategy::DefaultBaseline => query.set(DEFAULT_BASELINE, "true"),
        ComparisonStrategy::Threshold => {}
    }

    Ok(query)
}
