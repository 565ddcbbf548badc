//! Loading projects from disk

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::{AdditionalDocument, Document, Project};
use crate::config::PackOptions;
use crate::cst::PreprocessorSymbols;
use crate::error::PackError;
use crate::result::Result;

const README_NAMES: &[&str] = &["readme.md", "README.md", "readme.txt", "README.txt"];
const THUMBNAIL_NAME: &str = "thumb.png";

/// Discovers and parses the source files of a project directory
#[derive(Debug, Clone)]
pub struct ProjectLoader {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    symbols: PreprocessorSymbols,
}

impl ProjectLoader {
    pub fn new(options: &PackOptions) -> Result<Self> {
        Ok(Self {
            include: compile_patterns(&options.include)?,
            exclude: compile_patterns(&options.exclude)?,
            symbols: options.symbols.clone(),
        })
    }

    /// Load the project rooted at `root`. The project is named after the
    /// directory.
    pub fn load(&self, root: &Path) -> Result<Project> {
        if !root.is_dir() {
            return Err(PackError::config_error(format!(
                "Project directory not found: {}",
                root.display()
            )));
        }

        let name = root
            .canonicalize()
            .ok()
            .and_then(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "Script".to_string());
        info!("Loading project '{}' from {}", name, root.display());

        let mut project = Project::new(name, root);
        for (relative, path) in self.discover(root) {
            let source = fs::read_to_string(&path).map_err(|e| PackError::io_error(&path, e))?;
            debug!("Parsing {}", relative);
            project.add_document(Document::parse(relative, Some(path), &source, &self.symbols));
        }

        for readme in README_NAMES {
            let path = root.join(readme);
            if path.is_file() {
                let text = fs::read_to_string(&path).map_err(|e| PackError::io_error(&path, e))?;
                project.add_additional(AdditionalDocument::Readme {
                    path: Some(path),
                    text,
                });
                break;
            }
        }

        let thumbnail = root.join(THUMBNAIL_NAME);
        if thumbnail.is_file() {
            project.add_additional(AdditionalDocument::Thumbnail { path: thumbnail });
        }

        info!("Loaded {} document(s)", project.documents().len());
        Ok(project)
    }

    /// Matching source files as `(relative path, absolute path)`, ordered by
    /// relative path
    fn discover(&self, root: &Path) -> Vec<(String, PathBuf)> {
        let mut files: Vec<(String, PathBuf)> = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let relative = entry
                    .path()
                    .strip_prefix(root)
                    .ok()?
                    .to_string_lossy()
                    .replace('\\', "/");
                self.is_included(&relative)
                    .then(|| (relative, entry.path().to_path_buf()))
            })
            .collect();
        files.sort_by(|a, b| a.0.cmp(&b.0));
        files
    }

    fn is_included(&self, relative: &str) -> bool {
        self.include.iter().any(|pattern| pattern.matches(relative))
            && !self.exclude.iter().any(|pattern| pattern.matches(relative))
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|e| {
                PackError::config_error(format!("Invalid glob pattern '{pattern}': {e}"))
            })
        })
        .collect()
}
