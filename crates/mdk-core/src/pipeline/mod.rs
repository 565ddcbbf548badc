//! Processor pipeline framework
//!
//! A pack run flows through these stages:
//!
//! 1. Preprocessors, once per document
//! 2. The combiner (N documents to 1)
//! 3. The type trimmer
//! 4. Postprocessors on the merged document
//! 5. The composer (tree to text)
//! 6. Post-composition processors (text to text)
//! 7. The producer
//!
//! Processors of one stage declare `run_before`/`run_after` relations by
//! name; [`resolve_order`] turns them into one deterministic order when the
//! pipeline is built.

mod context;
mod ordering;
mod processor;
mod runner;

pub use context::{MACRO_DATE, MACRO_DATETIME, MACRO_TIME, PackContext};
pub use ordering::resolve_order;
pub use processor::{
    ComposedProcessor, DocumentCombiner, DocumentComposer, DocumentProcessor, Processor,
    ProcessorDescriptor, ScriptProducer,
};
pub use runner::{PackOutcome, PackPipeline, PackPipelineBuilder};
