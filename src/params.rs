use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::config::MAX_PLACEHOLDER_DEPTH;
use crate::error::{GateError, GateResult};

// `$$` is an escaped dollar, `${NAME}` and `$NAME` are placeholders.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\$|\{([A-Za-z_][A-Za-z0-9_.]*)\}|([A-Za-z_][A-Za-z0-9_]*))").unwrap()
});

/// Resolves placeholders in step fields against build parameters first,
/// then the process environment.
#[derive(Debug, Clone, Default)]
pub struct ParameterResolver {
    params: HashMap<String, String>,
    env: HashMap<String, String>,
}

impl ParameterResolver {
    /// Build parameters plus a snapshot of the current process environment.
    pub fn from_process_env(params: HashMap<String, String>) -> Self {
        Self {
            params,
            env: std::env::vars().collect(),
        }
    }

    pub fn new(params: HashMap<String, String>, env: HashMap<String, String>) -> Self {
        Self { params, env }
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .or_else(|| self.env.get(name))
            .map(String::as_str)
    }

    /// Expand every placeholder in `value`. Values that expand to further
    /// placeholders are expanded again, up to `MAX_PLACEHOLDER_DEPTH` levels.
    pub fn resolve(&self, value: &str) -> GateResult<String> {
        self.resolve_at_depth(value, 0)
    }

    fn resolve_at_depth(&self, value: &str, depth: usize) -> GateResult<String> {
        if !value.contains('$') {
            return Ok(value.to_string());
        }
        if depth >= MAX_PLACEHOLDER_DEPTH {
            return Err(GateError::config(format!(
                "Parameter expansion is nested too deeply in '{}'",
                value
            )));
        }

        let mut out = String::with_capacity(value.len());
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(value) {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            out.push_str(&value[last..whole.start]);
            last = whole.end;
            match placeholder_name(&caps) {
                None => out.push('$'),
                Some(name) => {
                    let resolved = self
                        .lookup(name)
                        .ok_or_else(|| GateError::UnresolvedParameter(name.to_string()))?;
                    out.push_str(&self.resolve_at_depth(resolved, depth + 1)?);
                }
            }
        }
        out.push_str(&value[last..]);
        Ok(out)
    }

    /// Resolve an optional field, trimming the result; blank becomes `None`.
    pub fn resolve_field(&self, value: Option<&str>) -> GateResult<Option<String>> {
        match value {
            None => Ok(None),
            Some(raw) => Ok(trim_to_none(&self.resolve(raw)?)),
        }
    }
}

fn placeholder_name<'a>(caps: &Captures<'a>) -> Option<&'a str> {
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

pub fn trim_to_none(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse `KEY=VALUE` pairs given on the command line.
pub fn parse_param_pairs<S: AsRef<str>>(pairs: &[S]) -> GateResult<HashMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            let pair = pair.as_ref();
            match pair.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    Ok((key.trim().to_string(), value.to_string()))
                }
                _ => Err(GateError::config(format!(
                    "Invalid build parameter '{}', expected KEY=VALUE",
                    pair
                ))),
            }
        })
        .collect()
}
