/// Error types for the log scanner
pub mod error;

/// Configuration management
pub mod config;

/// Offset tracking and incremental file reading
pub mod scanner;

/// Threshold-based log line detectors
pub mod detectors;

/// Filesystem usage checker
pub mod disk;

/// Alert aggregation, rendering and delivery
pub mod alerts;

/// Single-invocation run orchestration
pub mod run;

// Re-export commonly used types
pub use error::{AlertError, ConfigError, ProbeError, ScanError};
