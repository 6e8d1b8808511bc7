//! Configuration module for kumo
//!
//! Handles loading, parsing, and validating TOML configuration files.
//! Validation failures are the only fatal errors in the crate: a crawl run
//! never starts with an invalid configuration.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{Config, CrawlerConfig, OutputConfig, ServerConfig, StorageConfig};
pub use validation::validate;
