//! Pipeline assembly and execution

use tracing::{debug, info};

use super::ordering::resolve_order;
use super::{
    ComposedProcessor, DocumentCombiner, DocumentComposer, DocumentProcessor, PackContext,
    Processor, ScriptProducer,
};
use crate::error::PackError;
use crate::minifier::{CommentStripper, MinifierLevel, SymbolRenamer, WhitespaceTrimmer};
use crate::processors::{
    AttributeStripper, LineWrapper, MacroExpander, NamespaceFlattener, PreprocessorConditionals,
    RegionAnnotator, ScriptComposer, ScriptSizeCheck, SourceCombiner,
};
use crate::producer::{Artifact, OutputWriter, ScriptFileProducer};
use crate::project::{Document, Project};
use crate::result::Result;
use crate::trimmer::TypeTrimmer;

/// Result of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackOutcome {
    pub script: String,
    pub artifacts: Vec<Artifact>,
}

/// Ordered processors of every stage
///
/// Built with [`PackPipeline::builder`]; ordering relations are resolved once
/// when the pipeline is built.
pub struct PackPipeline {
    preprocessors: Vec<Box<dyn DocumentProcessor>>,
    combiner: Box<dyn DocumentCombiner>,
    trimmer: Box<dyn DocumentProcessor>,
    postprocessors: Vec<Box<dyn DocumentProcessor>>,
    composer: Box<dyn DocumentComposer>,
    composed: Vec<Box<dyn ComposedProcessor>>,
    producer: Box<dyn ScriptProducer>,
}

impl PackPipeline {
    pub fn builder() -> PackPipelineBuilder {
        PackPipelineBuilder::new()
    }

    /// Pipeline with the built-in processors enabled by `context`
    pub fn default_for(context: &PackContext) -> Result<Self> {
        Self::builder().with_default_processors(context).build()
    }

    /// Names of the preprocessors in execution order
    pub fn preprocessor_names(&self) -> Vec<&str> {
        self.preprocessors.iter().map(|p| p.name()).collect()
    }

    /// Names of the postprocessors in execution order
    pub fn postprocessor_names(&self) -> Vec<&str> {
        self.postprocessors.iter().map(|p| p.name()).collect()
    }

    /// Names of the post-composition processors in execution order
    pub fn composed_processor_names(&self) -> Vec<&str> {
        self.composed.iter().map(|p| p.name()).collect()
    }

    /// Run every stage up to and including the post-composition processors
    pub fn build_script(&self, project: &Project, context: &PackContext) -> Result<String> {
        let diagnostics = project.error_diagnostics();
        if !diagnostics.is_empty() {
            return Err(PackError::Diagnostics { diagnostics });
        }

        info!(
            "Packing '{}': {} document(s), minifier level {}",
            project.name(),
            project.documents().len(),
            context.minifier_level()
        );

        let mut documents = Vec::with_capacity(project.documents().len());
        for document in project.documents() {
            let mut document = document.clone();
            for processor in &self.preprocessors {
                document = run_document_processor(processor.as_ref(), document, context)?;
            }
            documents.push(document);
        }

        let mut document = self.combiner.combine(documents, context)?;
        document = run_document_processor(self.trimmer.as_ref(), document, context)?;
        for processor in &self.postprocessors {
            document = run_document_processor(processor.as_ref(), document, context)?;
        }

        let mut script = self.composer.compose(&document, context)?;
        for processor in &self.composed {
            debug!("Running {}", processor.name());
            script = processor.process(script, context)?;
        }

        info!("Composed script: {} characters", script.chars().count());
        Ok(script)
    }

    /// Run the whole pipeline and write the artifacts through `writer`
    pub fn run(
        &self,
        project: &Project,
        context: &PackContext,
        writer: &dyn OutputWriter,
    ) -> Result<PackOutcome> {
        let script = self.build_script(project, context)?;
        let artifacts = self.producer.produce(&script, project, context, writer)?;
        info!("Produced {} artifact(s)", artifacts.len());
        Ok(PackOutcome { script, artifacts })
    }
}

fn run_document_processor(
    processor: &dyn DocumentProcessor,
    document: Document,
    context: &PackContext,
) -> Result<Document> {
    debug!("Running {} on {}", processor.name(), document.name());
    processor.process(document, context)
}

/// Collects processors for each stage
pub struct PackPipelineBuilder {
    preprocessors: Vec<Box<dyn DocumentProcessor>>,
    combiner: Box<dyn DocumentCombiner>,
    trimmer: Box<dyn DocumentProcessor>,
    postprocessors: Vec<Box<dyn DocumentProcessor>>,
    composer: Box<dyn DocumentComposer>,
    composed: Vec<Box<dyn ComposedProcessor>>,
    producer: Box<dyn ScriptProducer>,
}

impl Default for PackPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PackPipelineBuilder {
    /// Empty processor stages with the built-in combiner, trimmer, composer
    /// and producer
    pub fn new() -> Self {
        Self {
            preprocessors: Vec::new(),
            combiner: Box::new(SourceCombiner),
            trimmer: Box::new(TypeTrimmer),
            postprocessors: Vec::new(),
            composer: Box::new(ScriptComposer),
            composed: Vec::new(),
            producer: Box::new(ScriptFileProducer),
        }
    }

    /// Register the built-in processors enabled by `context`
    pub fn with_default_processors(mut self, context: &PackContext) -> Self {
        let level = context.minifier_level();

        self.preprocessors.push(Box::new(PreprocessorConditionals));
        self.preprocessors.push(Box::new(RegionAnnotator));
        self.preprocessors.push(Box::new(MacroExpander));

        self.postprocessors.push(Box::new(NamespaceFlattener));
        self.postprocessors.push(Box::new(AttributeStripper));
        if level >= MinifierLevel::Full {
            self.postprocessors.push(Box::new(SymbolRenamer));
        }
        if level >= MinifierLevel::StripComments {
            self.postprocessors.push(Box::new(CommentStripper));
        }
        if level >= MinifierLevel::Lite {
            self.postprocessors.push(Box::new(WhitespaceTrimmer));
        }

        if level >= MinifierLevel::Full {
            self.composed.push(Box::new(LineWrapper));
        }
        self.composed.push(Box::new(ScriptSizeCheck));
        self
    }

    pub fn preprocessor(mut self, processor: impl DocumentProcessor + 'static) -> Self {
        self.preprocessors.push(Box::new(processor));
        self
    }

    pub fn postprocessor(mut self, processor: impl DocumentProcessor + 'static) -> Self {
        self.postprocessors.push(Box::new(processor));
        self
    }

    pub fn composed_processor(mut self, processor: impl ComposedProcessor + 'static) -> Self {
        self.composed.push(Box::new(processor));
        self
    }

    pub fn combiner(mut self, combiner: impl DocumentCombiner + 'static) -> Self {
        self.combiner = Box::new(combiner);
        self
    }

    pub fn trimmer(mut self, trimmer: impl DocumentProcessor + 'static) -> Self {
        self.trimmer = Box::new(trimmer);
        self
    }

    pub fn composer(mut self, composer: impl DocumentComposer + 'static) -> Self {
        self.composer = Box::new(composer);
        self
    }

    pub fn producer(mut self, producer: impl ScriptProducer + 'static) -> Self {
        self.producer = Box::new(producer);
        self
    }

    /// Resolve the ordering of every stage
    pub fn build(self) -> Result<PackPipeline> {
        Ok(PackPipeline {
            preprocessors: ordered(self.preprocessors)?,
            combiner: self.combiner,
            trimmer: self.trimmer,
            postprocessors: ordered(self.postprocessors)?,
            composer: self.composer,
            composed: ordered(self.composed)?,
            producer: self.producer,
        })
    }
}

fn ordered<P: Processor + ?Sized>(processors: Vec<Box<P>>) -> Result<Vec<Box<P>>> {
    let descriptors: Vec<_> = processors.iter().map(|p| p.descriptor()).collect();
    let order = resolve_order(&descriptors)?;

    let mut slots: Vec<Option<Box<P>>> = processors.into_iter().map(Some).collect();
    let mut sorted = Vec::with_capacity(slots.len());
    for index in order {
        if let Some(processor) = slots[index].take() {
            sorted.push(processor);
        }
    }
    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackOptions;
    use crate::cst::PreprocessorSymbols;
    use crate::producer::DryRunWriter;

    fn context(level: MinifierLevel) -> PackContext {
        let options = PackOptions {
            minify: level,
            ..PackOptions::default()
        };
        PackContext::new("Demo", "/tmp/demo", options)
    }

    struct Tagger {
        name: &'static str,
        after: &'static [&'static str],
    }

    impl Processor for Tagger {
        fn name(&self) -> &str {
            self.name
        }

        fn run_after(&self) -> &[&str] {
            self.after
        }
    }

    impl DocumentProcessor for Tagger {
        fn process(&self, document: Document, _context: &PackContext) -> Result<Document> {
            Ok(document)
        }
    }

    struct Failing;

    impl Processor for Failing {
        fn name(&self) -> &str {
            "failing"
        }
    }

    impl DocumentProcessor for Failing {
        fn process(&self, _document: Document, _context: &PackContext) -> Result<Document> {
            Err(PackError::processor_error("failing", "boom"))
        }
    }

    #[test]
    fn test_default_ordering_per_level() {
        let pipeline = PackPipeline::default_for(&context(MinifierLevel::Full)).unwrap();
        assert_eq!(
            pipeline.preprocessor_names(),
            vec!["conditionals", "region-annotator", "macro-expander"]
        );
        assert_eq!(
            pipeline.postprocessor_names(),
            vec![
                "namespace-flattener",
                "attribute-stripper",
                "symbol-renamer",
                "comment-stripper",
                "whitespace-trimmer"
            ]
        );
        assert_eq!(
            pipeline.composed_processor_names(),
            vec!["line-wrapper", "script-size-check"]
        );

        let none = PackPipeline::default_for(&context(MinifierLevel::None)).unwrap();
        assert_eq!(
            none.postprocessor_names(),
            vec!["namespace-flattener", "attribute-stripper"]
        );
    }

    #[test]
    fn test_custom_processor_is_ordered() {
        let pipeline = PackPipeline::builder()
            .preprocessor(Tagger {
                name: "second",
                after: &["first"],
            })
            .preprocessor(Tagger {
                name: "first",
                after: &[],
            })
            .build()
            .unwrap();
        assert_eq!(pipeline.preprocessor_names(), vec!["first", "second"]);
    }

    #[test]
    fn test_unknown_relation_fails_at_build() {
        let result = PackPipeline::builder()
            .postprocessor(Tagger {
                name: "lonely",
                after: &["nobody"],
            })
            .build();
        assert!(matches!(result, Err(PackError::UnresolvedOrdering { .. })));
    }

    #[test]
    fn test_parse_errors_abort_before_processing() {
        let project = Project::from_sources(
            "Demo",
            [("Bad.cs", "class A { int ; }")],
            &PreprocessorSymbols::new(),
        );
        let pipeline = PackPipeline::default_for(&context(MinifierLevel::None)).unwrap();
        let result = pipeline.build_script(&project, &context(MinifierLevel::None));
        assert!(matches!(result, Err(PackError::Diagnostics { .. })));
    }

    #[test]
    fn test_failing_processor_aborts_run() {
        let project = Project::from_sources(
            "Demo",
            [("Program.cs", "class Program { }")],
            &PreprocessorSymbols::new(),
        );
        let pipeline = PackPipeline::builder().postprocessor(Failing).build().unwrap();
        let writer = DryRunWriter::new();
        let result = pipeline.run(&project, &context(MinifierLevel::None), &writer);
        assert!(matches!(result, Err(PackError::Processor { .. })));
        assert!(writer.recorded().is_empty());
    }
}
