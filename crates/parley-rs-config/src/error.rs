//! Config loading errors.

use std::path::PathBuf;
use thiserror::Error;

/// Why a config could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file could not be read.
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A config file is not valid JSON5.
    #[error("{origin} is not valid JSON5: {source}")]
    Syntax {
        origin: String,
        #[source]
        source: json5::Error,
    },
    /// The merged document could not be decoded into the config model.
    #[error("cannot decode config: {0}")]
    Decode(#[from] serde_json::Error),
    /// A single field has the wrong shape or an unsupported value.
    #[error("{origin}: `{field}` {reason}")]
    Field {
        origin: String,
        field: String,
        reason: String,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}
