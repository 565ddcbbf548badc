//! Processor traits for each pipeline stage

use super::PackContext;
use crate::producer::{Artifact, OutputWriter};
use crate::project::{Document, Project};
use crate::result::Result;

/// A named pipeline step with ordering relations to other steps of the same
/// stage
pub trait Processor: Send + Sync {
    /// Unique name within the stage
    fn name(&self) -> &str;

    /// Names of processors this one must run before
    fn run_before(&self) -> &[&str] {
        &[]
    }

    /// Names of processors this one must run after
    fn run_after(&self) -> &[&str] {
        &[]
    }

    fn descriptor(&self) -> ProcessorDescriptor {
        ProcessorDescriptor {
            name: self.name().to_string(),
            run_before: self.run_before().iter().map(|name| name.to_string()).collect(),
            run_after: self.run_after().iter().map(|name| name.to_string()).collect(),
        }
    }
}

/// Tree to tree step: preprocessors, the trimmer and postprocessors
pub trait DocumentProcessor: Processor {
    fn process(&self, document: Document, context: &PackContext) -> Result<Document>;
}

/// Merges the preprocessed documents into one
pub trait DocumentCombiner: Send + Sync {
    fn combine(&self, documents: Vec<Document>, context: &PackContext) -> Result<Document>;
}

/// Renders the final tree to text
pub trait DocumentComposer: Send + Sync {
    fn compose(&self, document: &Document, context: &PackContext) -> Result<String>;
}

/// Text to text step run after composition
pub trait ComposedProcessor: Processor {
    fn process(&self, script: String, context: &PackContext) -> Result<String>;
}

/// Writes the packed script and its sibling artifacts
pub trait ScriptProducer: Send + Sync {
    fn produce(
        &self,
        script: &str,
        project: &Project,
        context: &PackContext,
        writer: &dyn OutputWriter,
    ) -> Result<Vec<Artifact>>;
}

/// Ordering metadata of a processor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorDescriptor {
    pub name: String,
    pub run_before: Vec<String>,
    pub run_after: Vec<String>,
}

impl ProcessorDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            run_before: Vec::new(),
            run_after: Vec::new(),
        }
    }

    pub fn before(mut self, name: impl Into<String>) -> Self {
        self.run_before.push(name.into());
        self
    }

    pub fn after(mut self, name: impl Into<String>) -> Self {
        self.run_after.push(name.into());
        self
    }
}
