use gymnasium::Discrete;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{what} {index} is out of range 0..{len}")]
    OutOfRange {
        what: &'static str,
        index: Discrete,
        len: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("environment: {0}")]
    Env(String),

    #[error(transparent)]
    Gym(#[from] gymnasium::Error),

    #[error("config: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
