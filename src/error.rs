use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelegraftError {
    #[error("Service already registered with name: {0}")]
    DuplicateService(String),

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Service '{name}' failed to start: {source}")]
    ServiceStart {
        name: String,
        #[source]
        source: crate::services::StartError,
    },

    #[error("Injection produced invalid output in {artifact:?} at line {line}, column {column}: {reason}")]
    InjectionSite {
        artifact: PathBuf,
        line: usize,
        column: usize,
        reason: String,
    },

    #[error("Unknown build variant: {0}")]
    UnknownVariant(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TelegraftError>;
