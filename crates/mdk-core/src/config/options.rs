//! Resolved pack options

use std::path::PathBuf;

use indexmap::IndexMap;

use super::PackConfig;
use crate::cst::PreprocessorSymbols;
use crate::error::PackError;
use crate::minifier::MinifierLevel;
use crate::result::Result;
use crate::trimmer::SymbolPattern;

pub const DEFAULT_ENTRY_POINTS: &[&str] = &["Program", "Program.Main", "Program.Save"];
pub const DEFAULT_INCLUDE: &[&str] = &["**/*.cs"];
pub const DEFAULT_EXCLUDE: &[&str] = &["**/bin/**", "**/obj/**"];
pub const DEFAULT_LINE_WIDTH: usize = 120;
pub const DEFAULT_STRIPPED_ATTRIBUTES: &[&str] = &[
    "DebuggerBrowsable",
    "DebuggerDisplay",
    "DebuggerHidden",
    "DebuggerNonUserCode",
    "DebuggerStepThrough",
];

/// Fully resolved options for one pack run
#[derive(Debug, Clone, PartialEq)]
pub struct PackOptions {
    pub minify: MinifierLevel,
    pub trim: bool,
    pub trim_members: bool,
    /// `None` means `<project root>/out`
    pub output: Option<PathBuf>,
    pub macros: IndexMap<String, String>,
    pub symbols: PreprocessorSymbols,
    pub entry_points: Vec<SymbolPattern>,
    pub preserve_names: Vec<String>,
    pub strip_attributes: Vec<String>,
    pub flatten_namespaces: bool,
    pub line_width: usize,
    pub readme: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub dry_run: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            minify: MinifierLevel::None,
            trim: false,
            trim_members: false,
            output: None,
            macros: IndexMap::new(),
            symbols: PreprocessorSymbols::new(),
            entry_points: DEFAULT_ENTRY_POINTS
                .iter()
                .filter_map(|rule| SymbolPattern::parse(rule).ok())
                .collect(),
            preserve_names: Vec::new(),
            strip_attributes: to_strings(DEFAULT_STRIPPED_ATTRIBUTES),
            flatten_namespaces: true,
            line_width: DEFAULT_LINE_WIDTH,
            readme: true,
            include: to_strings(DEFAULT_INCLUDE),
            exclude: to_strings(DEFAULT_EXCLUDE),
            dry_run: false,
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl PackOptions {
    /// Resolve a (merged) configuration, applying defaults for unset fields
    pub fn from_config(config: PackConfig) -> Result<Self> {
        let defaults = Self::default();

        let entry_points = match config.entry_points {
            Some(rules) => rules
                .iter()
                .map(|rule| SymbolPattern::parse(rule))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| PackError::config_error(format!("invalid entry point: {e}")))?,
            None => defaults.entry_points,
        };

        if config.line_width == Some(0) {
            return Err(PackError::config_error("line_width must be greater than zero"));
        }

        let files = config.files.unwrap_or_default();

        Ok(Self {
            minify: config.minify.unwrap_or(defaults.minify),
            trim: config.trim.unwrap_or(defaults.trim),
            trim_members: config.trim_members.unwrap_or(defaults.trim_members),
            output: config.output,
            macros: config.macros.unwrap_or_default(),
            symbols: config.symbols.unwrap_or_default().into_iter().collect(),
            entry_points,
            preserve_names: config.preserve_names.unwrap_or_default(),
            strip_attributes: config
                .strip_attributes
                .unwrap_or(defaults.strip_attributes),
            flatten_namespaces: config
                .flatten_namespaces
                .unwrap_or(defaults.flatten_namespaces),
            line_width: config.line_width.unwrap_or(defaults.line_width),
            readme: config.readme.unwrap_or(defaults.readme),
            include: files.include.unwrap_or(defaults.include),
            exclude: files.exclude.unwrap_or(defaults.exclude),
            dry_run: false,
        })
    }
}
