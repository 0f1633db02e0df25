use std::collections::HashMap;

use crate::config::StepConfig;
use crate::error::GateResult;
use crate::gate::{Allowances, ComparisonStrategy, IssueTypeSelection};
use crate::params::{parse_param_pairs, ParameterResolver};

/// Step configuration after placeholder resolution. Blank strings are `None`.
///
/// Immutable once built; derive a variant with struct update syntax,
/// e.g. `Fields { comparison_strategy: ComparisonStrategy::Threshold, ..fields }`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fields {
    pub app_name: Option<String>,
    pub target_build: Option<String>,
    pub target_version: Option<String>,
    pub baseline_build: Option<String>,
    pub baseline_version: Option<String>,
    pub api_token: Option<String>,
    pub server_url: Option<String>,
    pub comparison_strategy: ComparisonStrategy,
    pub allowances: Allowances,
    pub issue_types: IssueTypeSelection,
}

impl Fields {
    pub fn resolve(config: &StepConfig, resolver: &ParameterResolver) -> GateResult<Self> {
        let comparison_strategy = match resolver.resolve_field(config.comparison_strategy.as_deref())? {
            Some(name) => ComparisonStrategy::parse(&name)?,
            None => ComparisonStrategy::default(),
        };

        let issue_type_names = config
            .issue_types
            .iter()
            .map(|name| resolver.resolve(name))
            .collect::<GateResult<Vec<_>>>()?;

        Ok(Fields {
            app_name: resolver.resolve_field(config.app_name.as_deref())?,
            target_build: resolver.resolve_field(config.target_build.as_deref())?,
            target_version: resolver.resolve_field(config.target_version.as_deref())?,
            baseline_build: resolver.resolve_field(config.baseline_build.as_deref())?,
            baseline_version: resolver.resolve_field(config.baseline_version.as_deref())?,
            api_token: resolver.resolve_field(config.api_token.as_deref())?,
            server_url: resolver.resolve_field(config.server_url.as_deref())?,
            comparison_strategy,
            allowances: Allowances {
                slow_requests_allowed: config.slow_requests_allowed,
                excessive_io_allowed: config.excessive_io_allowed,
                exceptions_allowed: config.exceptions_allowed,
                sla_global_limit: config.sla_global_limit,
            },
            issue_types: IssueTypeSelection::parse_names(&issue_type_names)?,
        })
    }

    /// Resolve against `--param` values and the process environment.
    pub fn resolve_from_env(config: &StepConfig) -> GateResult<Self> {
        let params: HashMap<String, String> = parse_param_pairs(&config.params)?;
        Self::resolve(config, &ParameterResolver::from_process_env(params))
    }

    pub fn app_name(&self) -> &str {
        self.app_name.as_deref().unwrap_or_default()
    }
}
