//! On-disk configuration structure
//!
//! Every field is optional so configuration layers can be merged; unset
//! fields fall back to the defaults in [`super::PackOptions`].

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::PackError;
use crate::minifier::MinifierLevel;
use crate::result::Result;

/// Packer configuration as written in `mdk.toml` / `mdk.yaml` / `mdk.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackConfig {
    /// Minifier level (`none`, `stripcomments`, `lite`, `full`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minify: Option<MinifierLevel>,

    /// Remove unreachable types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim: Option<bool>,

    /// Also remove unreachable members of reachable types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_members: Option<bool>,

    /// Output directory, relative to the project root unless absolute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Macro values substituted for `$NAME$`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macros: Option<IndexMap<String, String>>,

    /// Preprocessor symbols defined for `#if`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbols: Option<Vec<String>>,

    /// Entry rules seeding the trimmer (`Program.Main`, `Program.*`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_points: Option<Vec<String>>,

    /// Names the renamer must never touch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserve_names: Option<Vec<String>>,

    /// Attributes removed by the attribute stripper
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strip_attributes: Option<Vec<String>>,

    /// Unwrap namespace declarations in the packed script
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flatten_namespaces: Option<bool>,

    /// Column limit used by the line wrapper at the `full` level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_width: Option<usize>,

    /// Prepend the project README to the script
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<bool>,

    /// Source file discovery
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<FilesConfiguration>,
}

/// Include/exclude glob patterns, relative to the project root
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilesConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
}

impl PackConfig {
    /// Load configuration from file
    ///
    /// The format is chosen by extension: `.toml`, `.yaml`/`.yml` or `.json`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| PackError::io_error(path, e))?;
        let ext = path.extension().and_then(|e| e.to_str());

        let parsed = match ext {
            Some("toml") => toml::from_str(&content).map_err(|e| e.to_string()),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
            Some("json") => serde_json::from_str(&content).map_err(|e| e.to_string()),
            _ => Err("unsupported file extension (expected .toml, .yaml, .yml or .json)".to_string()),
        };

        parsed.map_err(|message| {
            PackError::config_error(format!(
                "Failed to load config from '{}': {}",
                path.display(),
                message
            ))
        })
    }

    /// Merge another config into this one (current takes precedence)
    ///
    /// Scalars and lists keep the current value when set. Macro tables are
    /// merged key by key and symbol sets are unioned.
    pub fn merge_with(&mut self, other: PackConfig) {
        if self.minify.is_none() {
            self.minify = other.minify;
        }
        if self.trim.is_none() {
            self.trim = other.trim;
        }
        if self.trim_members.is_none() {
            self.trim_members = other.trim_members;
        }
        if self.output.is_none() {
            self.output = other.output;
        }
        if self.entry_points.is_none() {
            self.entry_points = other.entry_points;
        }
        if self.preserve_names.is_none() {
            self.preserve_names = other.preserve_names;
        }
        if self.strip_attributes.is_none() {
            self.strip_attributes = other.strip_attributes;
        }
        if self.flatten_namespaces.is_none() {
            self.flatten_namespaces = other.flatten_namespaces;
        }
        if self.line_width.is_none() {
            self.line_width = other.line_width;
        }
        if self.readme.is_none() {
            self.readme = other.readme;
        }

        if let Some(other_macros) = other.macros {
            let macros = self.macros.get_or_insert_with(IndexMap::new);
            for (name, value) in other_macros {
                macros.entry(name).or_insert(value);
            }
        }

        if let Some(other_symbols) = other.symbols {
            let symbols = self.symbols.get_or_insert_with(Vec::new);
            for symbol in other_symbols {
                if !symbols.contains(&symbol) {
                    symbols.push(symbol);
                }
            }
        }

        if let Some(other_files) = other.files {
            if let Some(ref mut files) = self.files {
                if files.include.is_none() {
                    files.include = other_files.include;
                }
                if files.exclude.is_none() {
                    files.exclude = other_files.exclude;
                }
            } else {
                self.files = Some(other_files);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mdk.toml");
        fs::write(
            &path,
            r#"
minify = "full"
trim = true
symbols = ["RELEASE"]

[macros]
VERSION = "1.0"
"#,
        )
        .unwrap();

        let config = PackConfig::load(&path).unwrap();
        assert_eq!(config.minify, Some(MinifierLevel::Full));
        assert_eq!(config.trim, Some(true));
        assert_eq!(config.symbols, Some(vec!["RELEASE".to_string()]));
        assert_eq!(config.macros.unwrap()["VERSION"], "1.0");
    }

    #[test]
    fn test_load_yaml_and_json() {
        let temp_dir = TempDir::new().unwrap();
        let yaml = temp_dir.path().join("mdk.yaml");
        fs::write(&yaml, "minify: lite\ntrim_members: true\n").unwrap();
        let config = PackConfig::load(&yaml).unwrap();
        assert_eq!(config.minify, Some(MinifierLevel::Lite));
        assert_eq!(config.trim_members, Some(true));

        let json = temp_dir.path().join("mdk.json");
        fs::write(&json, r#"{"minify": "stripcomments", "readme": false}"#).unwrap();
        let config = PackConfig::load(&json).unwrap();
        assert_eq!(config.minify, Some(MinifierLevel::StripComments));
        assert_eq!(config.readme, Some(false));
    }

    #[test]
    fn test_bad_minifier_name_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mdk.toml");
        fs::write(&path, "minify = \"extreme\"\n").unwrap();
        let error = PackConfig::load(&path).unwrap_err();
        assert_eq!(error.kind(), crate::error::ErrorKind::Config);
    }

    #[test]
    fn test_merge_prefers_current() {
        let mut cli = PackConfig {
            minify: Some(MinifierLevel::Full),
            symbols: Some(vec!["DEBUG".into()]),
            macros: Some(IndexMap::from([("A".to_string(), "cli".to_string())])),
            ..Default::default()
        };
        let file = PackConfig {
            minify: Some(MinifierLevel::Lite),
            trim: Some(true),
            symbols: Some(vec!["RELEASE".into(), "DEBUG".into()]),
            macros: Some(IndexMap::from([
                ("A".to_string(), "file".to_string()),
                ("B".to_string(), "file".to_string()),
            ])),
            ..Default::default()
        };

        cli.merge_with(file);
        assert_eq!(cli.minify, Some(MinifierLevel::Full));
        assert_eq!(cli.trim, Some(true));
        assert_eq!(cli.symbols, Some(vec!["DEBUG".into(), "RELEASE".into()]));
        let macros = cli.macros.unwrap();
        assert_eq!(macros["A"], "cli");
        assert_eq!(macros["B"], "file");
    }
}
