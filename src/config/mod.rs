// src/config/mod.rs

//! Configuration loading and validation for eye.
//!
//! Responsibilities:
//! - Define the data model (`model.rs`).
//! - Load the optional `eye.toml` from disk (`loader.rs`).
//! - Derive defaults from the working directory (`defaults.rs`).
//! - Merge flags, file and defaults and check invariants (`validate.rs`).

pub mod defaults;
pub mod loader;
pub mod model;
pub mod validate;

pub use defaults::{default_command, default_ignore};
pub use loader::{CONFIG_FILE_NAME, discover, load_from_path};
pub use model::{CommandSpec, DEFAULT_DELAY_MS, FileConfig, Overrides, SupervisorOptions};
pub use validate::{parse_delay, resolve_options, validate_options};
