use thiserror::Error;

/// Errors that can occur while tracking offsets and reading log files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to persist offset for {key}: {source}")]
    OffsetPersist {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to acquire lock for {0}")]
    LockFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur while probing filesystem usage
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Failed to spawn subprocess: {0}")]
    SubprocessSpawn(String),

    #[error("Failed to parse output: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur when delivering alerts
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Transport failed: {0}")]
    TransportFailed(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}
