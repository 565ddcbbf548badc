//! Output artifacts of a pack run
//!
//! The producer turns the final script text into files: the script itself,
//! optionally prefixed with the project readme as line comments, and the
//! project thumbnail when there is one. Artifacts go through an
//! [`OutputWriter`], which is either the real file system or a dry run log.

mod writer;

pub use writer::{DryRunWriter, FileSystemWriter, OutputWriter};

use std::path::PathBuf;

use tracing::{debug, info};

use crate::pipeline::{PackContext, ScriptProducer};
use crate::project::Project;
use crate::result::Result;

/// File name of the produced script
pub const SCRIPT_FILE_NAME: &str = "Script.cs";

/// File name of the copied thumbnail
pub const THUMBNAIL_FILE_NAME: &str = "thumb.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Script,
    Thumbnail,
}

/// A file written (or, on a dry run, planned) by the producer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub bytes: usize,
}

/// Writes `Script.cs` and `thumb.png` to the context's output directory
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptFileProducer;

impl ScriptProducer for ScriptFileProducer {
    fn produce(
        &self,
        script: &str,
        project: &Project,
        context: &PackContext,
        writer: &dyn OutputWriter,
    ) -> Result<Vec<Artifact>> {
        let output_dir = context.output_dir();
        let mut artifacts = Vec::new();

        let mut contents = String::with_capacity(script.len());
        if context.options().readme
            && let Some(readme) = project.readme()
        {
            contents.push_str(&readme_header(readme));
        }
        contents.push_str(script);

        let script_path = output_dir.join(SCRIPT_FILE_NAME);
        writer.write(&script_path, contents.as_bytes())?;
        artifacts.push(Artifact {
            kind: ArtifactKind::Script,
            path: script_path,
            bytes: contents.len(),
        });

        if let Some(thumbnail) = project.thumbnail() {
            let path = output_dir.join(THUMBNAIL_FILE_NAME);
            let bytes = writer.copy(thumbnail, &path)?;
            debug!("Copied thumbnail {}", thumbnail.display());
            artifacts.push(Artifact {
                kind: ArtifactKind::Thumbnail,
                path,
                bytes,
            });
        }

        info!(
            "Produced {} artifact(s) in {}",
            artifacts.len(),
            output_dir.display()
        );
        Ok(artifacts)
    }
}

/// The readme as `// ` comment lines
fn readme_header(readme: &str) -> String {
    let mut header = String::new();
    for line in readme.lines() {
        header.push_str("//");
        if !line.trim().is_empty() {
            header.push(' ');
            header.push_str(line.trim_end());
        }
        header.push('\n');
    }
    header
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackOptions;
    use crate::project::AdditionalDocument;
    use std::fs;
    use tempfile::TempDir;

    fn project(root: &std::path::Path) -> Project {
        let mut project = Project::new("Demo", root);
        project.add_additional(AdditionalDocument::Readme {
            path: None,
            text: "Demo script\n\nUsage: run it".into(),
        });
        project
    }

    #[test]
    fn test_readme_is_prefixed_as_comments() {
        let dir = TempDir::new().unwrap();
        let options = PackOptions {
            readme: true,
            ..PackOptions::default()
        };
        let context = PackContext::new("Demo", dir.path(), options);
        let writer = DryRunWriter::new();

        let artifacts = ScriptFileProducer
            .produce("class Program { }\n", &project(dir.path()), &context, &writer)
            .unwrap();

        let expected = "// Demo script\n//\n// Usage: run it\nclass Program { }\n";
        assert_eq!(
            artifacts,
            vec![Artifact {
                kind: ArtifactKind::Script,
                path: dir.path().join("out").join(SCRIPT_FILE_NAME),
                bytes: expected.len(),
            }]
        );
    }

    #[test]
    fn test_thumbnail_is_copied() {
        let dir = TempDir::new().unwrap();
        let thumbnail = dir.path().join("thumb.png");
        fs::write(&thumbnail, [0x89, b'P', b'N', b'G']).unwrap();

        let mut project = Project::new("Demo", dir.path());
        project.add_additional(AdditionalDocument::Thumbnail {
            path: thumbnail.clone(),
        });
        let options = PackOptions {
            output: Some(dir.path().join("dist")),
            ..PackOptions::default()
        };
        let context = PackContext::new("Demo", dir.path(), options);

        let artifacts = ScriptFileProducer
            .produce("", &project, &context, &FileSystemWriter)
            .unwrap();
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[1].kind, ArtifactKind::Thumbnail);
        assert_eq!(
            fs::read(dir.path().join("dist").join(THUMBNAIL_FILE_NAME)).unwrap(),
            vec![0x89, b'P', b'N', b'G']
        );
        assert!(dir.path().join("dist").join(SCRIPT_FILE_NAME).exists());
    }

    #[test]
    fn test_dry_run_plans_the_thumbnail_without_copying() {
        let dir = TempDir::new().unwrap();
        let thumbnail = dir.path().join("thumb.png");
        fs::write(&thumbnail, [0x89, b'P', b'N', b'G']).unwrap();

        let mut project = Project::new("Demo", dir.path());
        project.add_additional(AdditionalDocument::Thumbnail {
            path: thumbnail.clone(),
        });
        let context = PackContext::new("Demo", dir.path(), PackOptions::default());
        let writer = DryRunWriter::new();

        let artifacts = ScriptFileProducer
            .produce("", &project, &context, &writer)
            .unwrap();
        assert_eq!(artifacts[1].bytes, 4);
        assert_eq!(
            writer.recorded()[1],
            (dir.path().join("out").join(THUMBNAIL_FILE_NAME), 4)
        );
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_readme_is_skipped_when_disabled() {
        let dir = TempDir::new().unwrap();
        let options = PackOptions {
            readme: false,
            ..PackOptions::default()
        };
        let context = PackContext::new("Demo", dir.path(), options);
        let writer = DryRunWriter::new();

        ScriptFileProducer
            .produce("class Program { }\n", &project(dir.path()), &context, &writer)
            .unwrap();
        assert_eq!(writer.recorded()[0].1, "class Program { }\n".len());
    }
}
