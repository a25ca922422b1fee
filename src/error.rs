use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed request #{index}: {reason}")]
    MalformedSpec { index: usize, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Blocking batch called from inside an async runtime; use Batcher::run instead")]
    NestedRuntime,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Error::MalformedSpec {
            index,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
