//! Generic document model consumed by the chapter tree builder.
//!
//! Markup parsing stays outside the core: a frontend (see [`crate::markdown`])
//! renders each block to a raw HTML fragment while it builds this tree, so
//! the builder only routes bytes and never touches source syntax. The model
//! is a closed tagged-variant type; [`NodeKind::Other`] is the permissive
//! catch-all for block kinds only the renderer understands.

/// Classification of a document node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Root of a parsed source document.
    Document,
    /// A heading together with everything nested under it.
    Heading { level: u8, html: Vec<u8> },
    /// A paragraph block.
    Paragraph { html: Vec<u8> },
    /// Literal text captured from inside a heading.
    Text { literal: String },
    /// Any other block the renderer knows how to emit.
    Other { html: Vec<u8> },
}

/// A node in the document tree. Children are in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocNode {
    pub kind: NodeKind,
    pub children: Vec<DocNode>,
}

impl DocNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    pub fn document(children: Vec<DocNode>) -> Self {
        Self {
            kind: NodeKind::Document,
            children,
        }
    }

    pub fn heading(level: u8, html: impl Into<Vec<u8>>) -> Self {
        Self::new(NodeKind::Heading {
            level,
            html: html.into(),
        })
    }

    pub fn paragraph(html: impl Into<Vec<u8>>) -> Self {
        Self::new(NodeKind::Paragraph { html: html.into() })
    }

    pub fn text(literal: impl Into<String>) -> Self {
        Self::new(NodeKind::Text {
            literal: literal.into(),
        })
    }

    pub fn other(html: impl Into<Vec<u8>>) -> Self {
        Self::new(NodeKind::Other { html: html.into() })
    }

    pub fn with_children(mut self, children: Vec<DocNode>) -> Self {
        self.children = children;
        self
    }

    /// Render this node and its descendants to raw HTML bytes, in document
    /// order. `Text` children are skipped: their literal is already part of
    /// the heading fragment they belong to.
    pub fn render_html(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut Vec<u8>) {
        match &self.kind {
            NodeKind::Document => {}
            NodeKind::Text { .. } => return,
            NodeKind::Heading { html, .. }
            | NodeKind::Paragraph { html }
            | NodeKind::Other { html } => {
                out.extend_from_slice(html);
            }
        }
        for child in &self.children {
            child.render_into(out);
        }
    }

    /// Literal of the first `Text` child, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.children.iter().find_map(|child| match &child.kind {
            NodeKind::Text { literal } => Some(literal.as_str()),
            _ => None,
        })
    }
}
