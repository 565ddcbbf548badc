//! Configuration system for mdk
//!
//! This module provides:
//! - TOML, YAML and JSON configuration file support
//! - Auto-discovery by traversing up directories
//! - Merging of configuration layers (CLI flags over file settings)
//! - Resolution into the fully-defaulted [`PackOptions`] the pipeline uses
//!
//! ## Configuration Files
//!
//! The packer looks for, in order: `mdk.toml`, `mdk.yaml`, `mdk.yml`,
//! `mdk.json`. The first one found walking up from the project directory
//! wins. A project without configuration packs with defaults.
//!
//! ## Example Configuration (mdk.toml)
//!
//! ```toml
//! minify = "lite"
//! trim = true
//! trim_members = false
//! output = "out"
//! symbols = ["RELEASE"]
//! entry_points = ["Program", "Program.Main", "Program.Save"]
//! preserve_names = ["Storage"]
//!
//! [macros]
//! VERSION = "1.2.0"
//!
//! [files]
//! include = ["**/*.cs"]
//! exclude = ["**/bin/**", "**/obj/**", "Tests/**"]
//! ```

mod loader;
mod options;
mod pack_config;

pub use loader::ConfigLoader;
pub use options::{
    DEFAULT_ENTRY_POINTS, DEFAULT_EXCLUDE, DEFAULT_INCLUDE, DEFAULT_LINE_WIDTH,
    DEFAULT_STRIPPED_ATTRIBUTES, PackOptions,
};
pub use pack_config::{FilesConfiguration, PackConfig};
