//! Configuration module.
//!
//! Provides `TransformerConfig` (top-level settings) with its sub-configs,
//! `AppPaths` for the platform settings location, output folder naming, and
//! TOML persistence via `TransformerConfig::load` / `TransformerConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::{parameter_folder_name, resolve_output_folder, AppPaths};
pub use settings::{OutputConfig, PipelineSwitches, TransformerConfig};
