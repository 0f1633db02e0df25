#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("{0}")]
    Configuration(String),

    #[error("Parameter {0} is not set")]
    UnresolvedParameter(String),

    #[error("{0}")]
    Remote(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GateError {
    pub fn config(message: impl Into<String>) -> Self {
        GateError::Configuration(message.into())
    }

    /// Configuration-class errors are raised before any remote call is made.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GateError::Configuration(_) | GateError::UnresolvedParameter(_)
        )
    }

    /// Process exit code for a fatal error.
    pub fn exit_code(&self) -> i32 {
        if self.is_configuration() {
            2
        } else {
            1
        }
    }
}

pub type GateResult<T> = Result<T, GateError>;
