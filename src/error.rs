//! Error types for atvars

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtVarsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in {file} at {line}:{column}: {message}")]
    Parse { file: String, line: usize, column: usize, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },
}

pub type Result<T> = std::result::Result<T, AtVarsError>;

impl AtVarsError {
    pub fn parse(file: impl Into<String>, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            column,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
