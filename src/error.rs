use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadBalancerError {
    #[error("Cannot build a strategy over an empty server pool")]
    InvalidPool,

    #[error("Server pool is empty")]
    EmptyPool,

    #[error("Request key is required by this strategy")]
    MissingKey,

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_yaml::Error),
}

// Define our custom Result type
pub type Result<T> = core::result::Result<T, LoadBalancerError>;
