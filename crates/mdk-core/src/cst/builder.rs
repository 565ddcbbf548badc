//! Thin wrapper over rowan's green node builder speaking [`CsSyntaxKind`]

use rowan::{Checkpoint, GreenNode, GreenNodeBuilder};

use super::{CsSyntaxKind, CstToken};

/// Incremental green tree builder used by the parser
#[derive(Default)]
pub struct CstBuilder {
    inner: GreenNodeBuilder<'static>,
}

impl CstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_node(&mut self, kind: CsSyntaxKind) {
        self.inner.start_node(kind.into());
    }

    /// Wrap everything emitted since `checkpoint` in a node of `kind`
    pub fn start_node_at(&mut self, checkpoint: Checkpoint, kind: CsSyntaxKind) {
        self.inner.start_node_at(checkpoint, kind.into());
    }

    pub fn checkpoint(&self) -> Checkpoint {
        self.inner.checkpoint()
    }

    pub fn finish_node(&mut self) {
        self.inner.finish_node();
    }

    pub fn token(&mut self, kind: CsSyntaxKind, text: &str) {
        self.inner.token(kind.into(), text);
    }

    pub fn add_token(&mut self, token: &CstToken) {
        self.token(token.kind, &token.text);
    }

    pub fn finish(self) -> GreenNode {
        self.inner.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::{CsSyntaxNode, CsSyntaxNodeExt};

    #[test]
    fn test_checkpoint_wraps_prior_tokens() {
        let mut builder = CstBuilder::new();
        builder.start_node(CsSyntaxKind::CompilationUnit);
        let checkpoint = builder.checkpoint();
        builder.token(CsSyntaxKind::PublicKw, "public");
        builder.token(CsSyntaxKind::Whitespace, " ");
        builder.start_node_at(checkpoint, CsSyntaxKind::FieldDeclaration);
        builder.token(CsSyntaxKind::IntKw, "int");
        builder.finish_node();
        builder.finish_node();

        let root = CsSyntaxNode::new_root(builder.finish());
        let field = root.child_of_kind(CsSyntaxKind::FieldDeclaration).unwrap();
        assert_eq!(field.text().to_string(), "public int");
    }
}
