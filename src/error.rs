use thiserror::Error;

#[derive(Error, Debug)]
pub enum TallyError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream API error{}: {message}", .code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default())]
    UpstreamApi {
        message: String,
        code: Option<String>,
    },

    #[error("Sync failed for item {item_id}: {source}")]
    Reconciliation {
        item_id: String,
        #[source]
        source: Box<TallyError>,
    },

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl TallyError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn upstream(message: impl Into<String>, code: Option<String>) -> Self {
        Self::UpstreamApi {
            message: message.into(),
            code,
        }
    }

    /// Process exit code for the CLI boundary.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 2,
            Self::UpstreamApi { .. } => 3,
            Self::Reconciliation { .. } => 4,
            _ => 1,
        }
    }
}

impl From<reqwest::Error> for TallyError {
    fn from(e: reqwest::Error) -> Self {
        Self::upstream(e.to_string(), None)
    }
}

pub type Result<T> = std::result::Result<T, TallyError>;
