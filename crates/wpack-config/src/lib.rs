//! Declarative configuration for wpack builds.
//!
//! A [`BuildConfig`] is assembled once per build from defaults, a config file
//! (`wpack.toml`, `wpack.json` or the `wpack` field of `package.json`) and
//! `WPACK_*` environment variables, validated, and then shared read-only with
//! every pipeline stage.

pub mod config;
pub mod discovery;
pub mod error;
pub mod extensions;
pub mod settings;
pub mod shrink;
pub mod thresholds;
pub mod validation;

pub use config::*;
pub use error::*;
pub use extensions::ExtensionSets;
pub use settings::*;
pub use shrink::*;
pub use thresholds::*;

pub use discovery::{ConfigDiscovery, from_toml_str, load_file};
pub use validation::{ConfigValidator, FsValidator, SchemaValidator, validate_fs, validate_schema};
