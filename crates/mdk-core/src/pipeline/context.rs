//! Read-mostly configuration threaded through the pipeline

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::PackOptions;
use crate::cst::PreprocessorSymbols;
use crate::minifier::MinifierLevel;
use crate::project::Project;

pub const MACRO_DATETIME: &str = "MDK_DATETIME";
pub const MACRO_DATE: &str = "MDK_DATE";
pub const MACRO_TIME: &str = "MDK_TIME";

/// Pipeline context
///
/// Never mutated once built; the `with_*` methods return a modified copy.
/// Cloning is cheap since the options and macro table are shared.
#[derive(Debug, Clone)]
pub struct PackContext {
    project_name: String,
    project_root: PathBuf,
    options: Arc<PackOptions>,
    macros: Arc<IndexMap<String, String>>,
}

impl PackContext {
    pub fn new(
        project_name: impl Into<String>,
        project_root: impl Into<PathBuf>,
        options: PackOptions,
    ) -> Self {
        let macros = build_macros(&options);
        Self {
            project_name: project_name.into(),
            project_root: project_root.into(),
            options: Arc::new(options),
            macros: Arc::new(macros),
        }
    }

    pub fn for_project(project: &Project, options: PackOptions) -> Self {
        Self::new(project.name(), project.root(), options)
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn options(&self) -> &PackOptions {
        &self.options
    }

    /// Macro table (names without `$`): built-ins overridden by configuration
    pub fn macros(&self) -> &IndexMap<String, String> {
        &self.macros
    }

    pub fn minifier_level(&self) -> MinifierLevel {
        self.options.minify
    }

    pub fn symbols(&self) -> &PreprocessorSymbols {
        &self.options.symbols
    }

    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// Output directory, resolved against the project root
    pub fn output_dir(&self) -> PathBuf {
        match &self.options.output {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.project_root.join(path),
            None => self.project_root.join("out"),
        }
    }

    pub fn with_options(&self, options: PackOptions) -> Self {
        Self::new(self.project_name.clone(), self.project_root.clone(), options)
    }

    pub fn with_minifier_level(&self, level: MinifierLevel) -> Self {
        let mut options = self.options().clone();
        options.minify = level;
        Self {
            options: Arc::new(options),
            ..self.clone()
        }
    }

    pub fn with_dry_run(&self, dry_run: bool) -> Self {
        let mut options = self.options().clone();
        options.dry_run = dry_run;
        Self {
            options: Arc::new(options),
            ..self.clone()
        }
    }

    pub fn with_macro(&self, name: &str, value: impl Into<String>) -> Self {
        let mut macros = self.macros().clone();
        macros.insert(normalize_macro_name(name), value.into());
        Self {
            macros: Arc::new(macros),
            ..self.clone()
        }
    }
}

fn build_macros(options: &PackOptions) -> IndexMap<String, String> {
    let now = chrono::Local::now();
    let mut macros = IndexMap::new();
    macros.insert(
        MACRO_DATETIME.to_string(),
        now.format("%Y-%m-%d %H:%M").to_string(),
    );
    macros.insert(MACRO_DATE.to_string(), now.format("%Y-%m-%d").to_string());
    macros.insert(MACRO_TIME.to_string(), now.format("%H:%M").to_string());
    for (name, value) in &options.macros {
        macros.insert(normalize_macro_name(name), value.clone());
    }
    macros
}

/// Accept both `NAME` and `$NAME$` spellings
fn normalize_macro_name(name: &str) -> String {
    name.trim_matches('$').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_macros_can_be_overridden() {
        let mut options = PackOptions::default();
        options.macros.insert("$MDK_DATE$".into(), "today".into());
        options.macros.insert("VERSION".into(), "1.0".into());
        let context = PackContext::new("Demo", "/tmp/demo", options);

        assert_eq!(context.macros()["MDK_DATE"], "today");
        assert_eq!(context.macros()["VERSION"], "1.0");
        assert!(context.macros().contains_key(MACRO_DATETIME));
        assert!(context.macros().contains_key(MACRO_TIME));
    }

    #[test]
    fn test_with_methods_leave_original_untouched() {
        let context = PackContext::new("Demo", "/tmp/demo", PackOptions::default());
        let full = context.with_minifier_level(MinifierLevel::Full);
        let extra = context.with_macro("EXTRA", "x");

        assert_eq!(context.minifier_level(), MinifierLevel::None);
        assert_eq!(full.minifier_level(), MinifierLevel::Full);
        assert!(!context.macros().contains_key("EXTRA"));
        assert_eq!(extra.macros()["EXTRA"], "x");
    }

    #[test]
    fn test_output_dir_resolution() {
        let context = PackContext::new("Demo", "/tmp/demo", PackOptions::default());
        assert_eq!(context.output_dir(), PathBuf::from("/tmp/demo/out"));

        let options = PackOptions {
            output: Some(PathBuf::from("build")),
            ..PackOptions::default()
        };
        assert_eq!(
            context.with_options(options).output_dir(),
            PathBuf::from("/tmp/demo/build")
        );
    }
}
