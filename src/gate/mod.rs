pub mod evaluator;
pub mod report;
pub mod request;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GateError, GateResult};

// ============================================================================
// Comparison strategy / issue types
// ============================================================================

/// How the target build is compared by the QRebel service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonStrategy {
    /// Compare against an explicitly named baseline build/version.
    Baseline,
    /// Compare against the baseline the service tracks as default.
    #[default]
    DefaultBaseline,
    /// No baseline, only absolute counts and the global SLA limit apply.
    Threshold,
}

impl ComparisonStrategy {
    pub const ALL: [ComparisonStrategy; 3] = [
        ComparisonStrategy::Baseline,
        ComparisonStrategy::DefaultBaseline,
        ComparisonStrategy::Threshold,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ComparisonStrategy::Baseline => "BASELINE",
            ComparisonStrategy::DefaultBaseline => "DEFAULT_BASELINE",
            ComparisonStrategy::Threshold => "THRESHOLD",
        }
    }

    pub fn parse(name: &str) -> GateResult<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| GateError::config(format!("Unknown comparison strategy: {}", name)))
    }

    pub fn uses_baseline(self) -> bool {
        self != ComparisonStrategy::Threshold
    }
}

impl fmt::Display for ComparisonStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Issue categories the service can be asked to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueType {
    #[serde(rename = "DURATION")]
    Duration,
    #[serde(rename = "IO")]
    Io,
    #[serde(rename = "EXCEPTIONS")]
    Exceptions,
}

impl IssueType {
    pub const ALL: [IssueType; 3] = [IssueType::Duration, IssueType::Io, IssueType::Exceptions];

    pub fn name(self) -> &'static str {
        match self {
            IssueType::Duration => "DURATION",
            IssueType::Io => "IO",
            IssueType::Exceptions => "EXCEPTIONS",
        }
    }

    pub fn parse(name: &str) -> GateResult<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| GateError::config(format!("Unknown issue type: {}", name)))
    }
}

/// Set of issue types requested from the service. Affects the request only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IssueTypeSelection {
    pub duration: bool,
    pub io: bool,
    pub exceptions: bool,
}

impl IssueTypeSelection {
    pub fn all() -> Self {
        Self {
            duration: true,
            io: true,
            exceptions: true,
        }
    }

    pub fn with(mut self, issue_type: IssueType) -> Self {
        match issue_type {
            IssueType::Duration => self.duration = true,
            IssueType::Io => self.io = true,
            IssueType::Exceptions => self.exceptions = true,
        }
        self
    }

    pub fn contains(&self, issue_type: IssueType) -> bool {
        match issue_type {
            IssueType::Duration => self.duration,
            IssueType::Io => self.io,
            IssueType::Exceptions => self.exceptions,
        }
    }

    /// Parses names like `DURATION`, accepting comma separated lists per entry.
    pub fn parse_names<S: AsRef<str>>(names: &[S]) -> GateResult<Self> {
        let mut selection = Self::default();
        for entry in names {
            for name in entry.as_ref().split(',').filter(|n| !n.trim().is_empty()) {
                selection = selection.with(IssueType::parse(name)?);
            }
        }
        Ok(selection)
    }

    /// Comma-joined names in DURATION, IO, EXCEPTIONS order; empty when none.
    pub fn to_query_value(&self) -> String {
        IssueType::ALL
            .into_iter()
            .filter(|t| self.contains(*t))
            .map(IssueType::name)
            .collect::<Vec<_>>()
            .join(",")
    }
}

// ============================================================================
// Observed data
// ============================================================================

/// Issue counts reported for the target build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IssueCounters {
    #[serde(rename = "DURATION", default)]
    pub slow_request_count: u64,
    #[serde(rename = "IO", default)]
    pub excessive_io_count: u64,
    #[serde(rename = "EXCEPTIONS", default)]
    pub exception_count: u64,
}

/// Slowest-percentile latency (ms) per entry point; `None` when the entry
/// point carried no duration data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntryPointLatencies {
    samples: Vec<Option<u64>>,
}

impl EntryPointLatencies {
    pub fn new(samples: Vec<Option<u64>>) -> Self {
        Self { samples }
    }

    pub fn present(&self) -> impl Iterator<Item = u64> + '_ {
        self.samples.iter().flatten().copied()
    }

    pub fn slowest(&self) -> Option<u64> {
        self.present().max()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl FromIterator<Option<u64>> for EntryPointLatencies {
    fn from_iter<I: IntoIterator<Item = Option<u64>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ============================================================================
// Configuration and verdict
// ============================================================================

/// Fail when an observed count strictly exceeds its allowance.
/// `sla_global_limit` of 0 disables the latency gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Allowances {
    pub slow_requests_allowed: u64,
    pub excessive_io_allowed: u64,
    pub exceptions_allowed: u64,
    pub sla_global_limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Breach {
    SlowRequests { observed: u64, allowed: u64 },
    ExcessiveIo { observed: u64, allowed: u64 },
    Exceptions { observed: u64, allowed: u64 },
    SlaGlobalLimit { limit: u64, slowest: u64 },
}

impl Breach {
    /// True for the per-category count thresholds, false for the SLA gate.
    pub fn is_issue_count(&self) -> bool {
        !matches!(self, Breach::SlaGlobalLimit { .. })
    }
}

impl fmt::Display for Breach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Breach::SlowRequests { observed, allowed } => {
                write!(f, "Slow Requests: {} found, {} allowed", observed, allowed)
            }
            Breach::ExcessiveIo { observed, allowed } => {
                write!(f, "Excessive IO: {} found, {} allowed", observed, allowed)
            }
            Breach::Exceptions { observed, allowed } => {
                write!(f, "Exceptions: {} found, {} allowed", observed, allowed)
            }
            Breach::SlaGlobalLimit { limit, slowest } => write!(
                f,
                "Slowest endpoint time {} ms reached SLA global limit {} ms",
                slowest, limit
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationResult {
    pub failed: bool,
    pub breaches: Vec<Breach>,
    /// Max over present latency samples, 0 when none were reported.
    pub slowest_duration: u64,
}

impl EvaluationResult {
    pub fn reasons(&self) -> Vec<String> {
        self.breaches.iter().map(ToString::to_string).collect()
    }

    pub fn has_issue_count_breach(&self) -> bool {
        self.breaches.iter().any(Breach::is_issue_count)
    }
}
