//! Configuration module for mycourses
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so an empty file targets the ICT Mahidol deployment.
//!
//! # Example
//!
//! ```no_run
//! use mycourses::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mycourses.toml")).unwrap();
//! println!("Moodle site: {}", config.moodle.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CacheConfig, Config, HttpConfig, MoodleConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
