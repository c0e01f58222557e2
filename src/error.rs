use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum GeseError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("{url} returned status {status}: {message}")]
    NetworkStatus {
        url: String,
        status: u16,
        message: String,
    },

    #[error("{resource} unavailable: {reason}")]
    #[diagnostic(help("check your network connection or pass a local fallback file"))]
    IndexUnavailable { resource: String, reason: String },

    #[error("data for '{species}' unavailable (no local files at {path}): {reason}")]
    #[diagnostic(help("retry with download enabled once the network is reachable"))]
    DataUnavailable {
        species: String,
        path: String,
        reason: String,
    },

    #[error("Invalid species name: '{input}'. Available options are: {}", .available.join(", "))]
    UnknownSpecies {
        input: String,
        available: Vec<String>,
    },

    #[error("Trait '{trait_name}' not found. Available traits: {}", .available.join(", "))]
    UnknownTrait {
        trait_name: String,
        available: Vec<String>,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl GeseError {
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            GeseError::Network(_) | GeseError::NetworkStatus { .. }
        )
    }
}
