//! Tree to text

use crate::pipeline::{DocumentComposer, PackContext};
use crate::project::Document;
use crate::result::Result;

/// Renders the final document, leaving out annotation markers
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptComposer;

impl DocumentComposer for ScriptComposer {
    fn compose(&self, document: &Document, _context: &PackContext) -> Result<String> {
        Ok(document.render())
    }
}
