//! # Configuration Error Types
//!
//! Everything that can go wrong while loading the world configuration.
//! All of these are fatal at startup; nothing here is raised while the world
//! is running.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// The file that was requested.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`crate::WorldConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds a value the generator cannot work with.
    #[error("invalid configuration: `{field}` {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// A block the terrain generator places is not registered.
    #[error("block registry is missing required block `{0}`")]
    MissingBlock(String),

    /// Two block keys map to the same id.
    #[error("block id {id} is used by both `{first}` and `{second}`")]
    DuplicateBlockId {
        /// The shared id.
        id: u8,
        /// First key registered with this id.
        first: String,
        /// Second key registered with this id.
        second: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
