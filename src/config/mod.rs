//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line (cli.rs)     optional TOML file (loader.rs)
//!           \                   /
//!            → loader::merge (flags win)
//!            → validation.rs (required paths, value ranges)
//!            → ServerConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Every setting can come from either source so deployments can pick one
//! - Missing required paths are reported together so usage can be shown once

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::CliArgs;
pub use loader::{resolve, ConfigError};
pub use schema::{FileConfig, ServerConfig};
