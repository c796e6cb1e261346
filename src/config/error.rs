//! Errors raised while reading and checking sitegate.toml.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("malformed sitegate.toml: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value parsed but is unusable, named by its `[section.key]`.
    #[error("invalid sitegate.toml: {0}")]
    Validation(String),
}
