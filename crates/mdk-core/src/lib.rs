//! MDK Core
//!
//! Packing pipeline that bundles a multi-file C# script project into a
//! single in-game programmable block script. Documents are parsed into
//! lossless syntax trees, run through ordered processors (conditional
//! compilation, macro expansion, merging, type trimming and minification),
//! composed back into text and written out with their artifacts.

pub mod config;
pub mod cst; // Concrete Syntax Tree (lossless, Rowan-based)
pub mod diagnostics;
pub mod error;
pub mod minifier;
pub mod pipeline;
pub mod processors;
pub mod producer;
pub mod project;
pub mod result;
pub mod trimmer;

// Re-export commonly used types
pub use config::{ConfigLoader, FilesConfiguration, PackConfig, PackOptions};
pub use diagnostics::{Diagnostic, Location, Severity};
pub use error::{ErrorKind, PackError};
pub use minifier::{
    CommentStripper, MinifierLevel, ParseLevelError, RUNTIME_NAMES, SymbolRenamer,
    WhitespaceTrimmer,
};
pub use pipeline::{
    ComposedProcessor, DocumentCombiner, DocumentComposer, DocumentProcessor, PackContext,
    PackOutcome, PackPipeline, PackPipelineBuilder, Processor, ProcessorDescriptor,
    ScriptProducer,
};
pub use processors::{
    AttributeStripper, LineWrapper, MacroExpander, NamespaceFlattener, PreprocessorConditionals,
    RegionAnnotator, ScriptComposer, ScriptSizeCheck, SourceCombiner,
};
pub use producer::{
    Artifact, ArtifactKind, DryRunWriter, FileSystemWriter, OutputWriter, ScriptFileProducer,
};
pub use project::{AdditionalDocument, Document, Project, ProjectLoader};
pub use result::Result;
pub use trimmer::{PatternError, SymbolPattern, TypeTrimmer};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mdk=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
