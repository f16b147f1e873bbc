use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed response: missing or invalid '{0}'")]
    Malformed(String),

    #[error("unsupported space: {0}")]
    UnsupportedSpace(String),

    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
