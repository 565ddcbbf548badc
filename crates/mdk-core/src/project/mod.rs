//! Project model: parsed source documents plus non-code documents
//!
//! A [`Project`] is built once per pack run, either by the
//! [`ProjectLoader`] from disk or directly from in-memory sources, and is
//! consumed by the pipeline.

mod loader;

pub use loader::ProjectLoader;

use std::path::{Path, PathBuf};

use rowan::GreenNode;

use crate::cst::{CsSyntaxNode, PreprocessorSymbols, parse_csharp, render_green};
use crate::diagnostics::Diagnostic;

/// One parsed source file
///
/// Documents are immutable: rewrites produce a new document via
/// [`Document::with_root`] whose unchanged subtrees are shared with this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    name: String,
    path: Option<PathBuf>,
    root: GreenNode,
    diagnostics: Vec<Diagnostic>,
}

impl Document {
    /// Parse `source` with the given preprocessor symbols
    pub fn parse(
        name: impl Into<String>,
        path: Option<PathBuf>,
        source: &str,
        symbols: &PreprocessorSymbols,
    ) -> Self {
        let name = name.into();
        let (root, errors) = parse_csharp(source, symbols).into_parts();
        let diagnostics = errors
            .iter()
            .map(|error| Diagnostic::from_parse_error(&name, source, error))
            .collect();
        Self {
            name,
            path,
            root,
            diagnostics,
        }
    }

    /// Wrap an already built tree
    pub fn from_green(name: impl Into<String>, path: Option<PathBuf>, root: GreenNode) -> Self {
        Self {
            name: name.into(),
            path,
            root,
            diagnostics: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn green(&self) -> &GreenNode {
        &self.root
    }

    /// Fresh red view of the tree
    pub fn syntax(&self) -> CsSyntaxNode {
        CsSyntaxNode::new_root(self.root.clone())
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Source text of the document, without annotation markers
    pub fn render(&self) -> String {
        render_green(&self.root)
    }

    /// New document with the same identity and a new tree
    pub fn with_root(&self, root: GreenNode) -> Self {
        Self {
            name: self.name.clone(),
            path: self.path.clone(),
            root,
            diagnostics: self.diagnostics.clone(),
        }
    }
}

/// Non-code documents that travel with a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdditionalDocument {
    Readme { path: Option<PathBuf>, text: String },
    Thumbnail { path: PathBuf },
}

/// An ordered set of documents plus project metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    name: String,
    root: PathBuf,
    documents: Vec<Document>,
    additional: Vec<AdditionalDocument>,
}

impl Project {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            documents: Vec::new(),
            additional: Vec::new(),
        }
    }

    /// Build a project from in-memory `(name, source)` pairs
    pub fn from_sources<'a>(
        name: impl Into<String>,
        sources: impl IntoIterator<Item = (&'a str, &'a str)>,
        symbols: &PreprocessorSymbols,
    ) -> Self {
        let mut project = Self::new(name, PathBuf::from("."));
        for (document_name, source) in sources {
            project.add_document(Document::parse(document_name, None, source, symbols));
        }
        project
    }

    pub fn add_document(&mut self, document: Document) {
        self.documents.push(document);
    }

    pub fn add_additional(&mut self, document: AdditionalDocument) {
        self.additional.push(document);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn additional(&self) -> &[AdditionalDocument] {
        &self.additional
    }

    pub fn readme(&self) -> Option<&str> {
        self.additional.iter().find_map(|document| match document {
            AdditionalDocument::Readme { text, .. } => Some(text.as_str()),
            AdditionalDocument::Thumbnail { .. } => None,
        })
    }

    pub fn thumbnail(&self) -> Option<&Path> {
        self.additional.iter().find_map(|document| match document {
            AdditionalDocument::Thumbnail { path } => Some(path.as_path()),
            AdditionalDocument::Readme { .. } => None,
        })
    }

    /// Every error diagnostic across all documents
    pub fn error_diagnostics(&self) -> Vec<Diagnostic> {
        self.documents
            .iter()
            .flat_map(|document| document.diagnostics().iter())
            .filter(|diagnostic| diagnostic.is_error())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_round_trip() {
        let source = "// header\nclass Program\n{\n    void Main() { }\n}\n";
        let document = Document::parse("Program.cs", None, source, &PreprocessorSymbols::new());
        assert!(!document.has_errors());
        assert_eq!(document.render(), source);
        assert_eq!(document.syntax().text().to_string(), source);
    }

    #[test]
    fn test_parse_errors_become_diagnostics() {
        let document = Document::parse("Bad.cs", None, "class A { int ; }", &PreprocessorSymbols::new());
        assert!(document.has_errors());
        assert_eq!(document.diagnostics()[0].document, "Bad.cs");
    }

    #[test]
    fn test_additional_documents() {
        let mut project = Project::new("Demo", "/tmp/demo");
        project.add_additional(AdditionalDocument::Readme {
            path: None,
            text: "Hello".into(),
        });
        project.add_additional(AdditionalDocument::Thumbnail {
            path: PathBuf::from("/tmp/demo/thumb.png"),
        });
        assert_eq!(project.readme(), Some("Hello"));
        assert_eq!(project.thumbnail(), Some(Path::new("/tmp/demo/thumb.png")));
    }
}
