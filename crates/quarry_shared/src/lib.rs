//! # QUARRY Shared
//!
//! Types handed to the world generator by its collaborators.
//!
//! ## CRITICAL RULE
//!
//! The registry and configuration are built once at startup and never
//! mutated afterwards. The generator only ever borrows them.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod block;
pub mod config;
pub mod error;

pub use block::{BlockId, BlockRegistry, BlockSpecial, BlockType};
pub use config::{FeaturePlacement, TerrainParams, WorldConfig};
pub use error::{ConfigError, ConfigResult};
