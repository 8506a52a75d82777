//! Common error types for Virome

use thiserror::Error;

/// Common result type for Virome operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the Virome crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message() {
        let err = Error::Config("port must be non-zero".to_string());
        assert_eq!(err.to_string(), "Configuration error: port must be non-zero");
    }

    #[test]
    fn test_io_error_converts_with_question_mark() {
        fn read_missing() -> Result<String> {
            Ok(std::fs::read_to_string("/nonexistent/virome/config.toml")?)
        }

        let err = read_missing().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().starts_with("IO error: "));
    }
}
