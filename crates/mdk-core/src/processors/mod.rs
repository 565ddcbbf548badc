//! Built-in pipeline processors
//!
//! Preprocessors run per document, in this order unless configured
//! otherwise:
//!
//! - [`PreprocessorConditionals`] drops resolved `#if` blocks
//! - [`RegionAnnotator`] turns `#region mdk ...` into annotations
//! - [`MacroExpander`] expands `$NAME$` in literals and comments
//!
//! The other processors here run on the merged document or on the
//! composed script.

mod attributes;
mod combiner;
mod composer;
mod conditionals;
mod line_wrapper;
mod macros;
mod namespaces;
mod regions;
mod size_check;

pub use attributes::AttributeStripper;
pub use combiner::{COMBINED_DOCUMENT_NAME, SourceCombiner};
pub use composer::ScriptComposer;
pub use conditionals::PreprocessorConditionals;
pub use line_wrapper::LineWrapper;
pub use macros::{MacroExpander, NO_MACROS_TAG, expand as expand_macros};
pub use namespaces::NamespaceFlattener;
pub use regions::{MDK_REGION_MARKER, RegionAnnotator};
pub use size_check::{MAX_SCRIPT_CHARACTERS, ScriptSizeCheck};
