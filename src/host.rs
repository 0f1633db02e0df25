use serde::Serialize;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::GateResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    Success,
    Failure,
}

impl BuildResult {
    pub fn exit_code(self) -> i32 {
        match self {
            BuildResult::Success => 0,
            BuildResult::Failure => 1,
        }
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildResult::Success => f.write_str("SUCCESS"),
            BuildResult::Failure => f.write_str("FAILURE"),
        }
    }
}

/// The CI build the step runs inside: its description, result and console.
pub trait BuildHost {
    fn description(&self) -> Option<String>;
    fn set_description(&mut self, description: &str) -> GateResult<()>;
    fn result(&self) -> BuildResult;
    fn set_result(&mut self, result: BuildResult);
    fn log(&mut self, line: &str);
}

/// Console-backed host. The build log is stdout; the description optionally
/// lives in a file so later pipeline stages can publish it.
pub struct ConsoleHost {
    description_file: Option<PathBuf>,
    description: Option<String>,
    result: BuildResult,
}

impl ConsoleHost {
    /// A missing description file means an empty description. Any other
    /// read failure is an error so the existing description is never lost.
    pub fn new(description_file: Option<PathBuf>) -> GateResult<Self> {
        let description = match &description_file {
            Some(path) => read_description(path)?,
            None => None,
        };
        Ok(Self {
            description_file,
            description,
            result: BuildResult::Success,
        })
    }
}

fn read_description(path: &Path) -> GateResult<Option<String>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let text = String::from_utf8_lossy(&bytes);
    let text = text.trim_end();
    Ok((!text.is_empty()).then(|| text.to_string()))
}

impl BuildHost for ConsoleHost {
    fn description(&self) -> Option<String> {
        self.description.clone()
    }

    fn set_description(&mut self, description: &str) -> GateResult<()> {
        if let Some(path) = &self.description_file {
            std::fs::write(path, description)?;
        }
        self.description = Some(description.to_string());
        Ok(())
    }

    fn result(&self) -> BuildResult {
        self.result
    }

    fn set_result(&mut self, result: BuildResult) {
        self.result = result;
    }

    fn log(&mut self, line: &str) {
        println!("{}", line);
    }
}

/// In-memory host, handy when embedding the step or testing it.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    pub description: Option<String>,
    pub result: BuildResult,
    pub log_lines: Vec<String>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self {
            description: None,
            result: BuildResult::Success,
            log_lines: Vec::new(),
        }
    }
}

impl MemoryHost {
    pub fn log_contains(&self, needle: &str) -> bool {
        self.log_lines.iter().any(|line| line.contains(needle))
    }
}

impl BuildHost for MemoryHost {
    fn description(&self) -> Option<String> {
        self.description.clone()
    }

    fn set_description(&mut self, description: &str) -> GateResult<()> {
        self.description = Some(description.to_string());
        Ok(())
    }

    fn result(&self) -> BuildResult {
        self.result
    }

    fn set_result(&mut self, result: BuildResult) {
        self.result = result;
    }

    fn log(&mut self, line: &str) {
        self.log_lines.push(line.to_string());
    }
}
