//! Arena-backed chapter forest.
//!
//! Chapters live in a flat arena indexed by [`ChapterId`]; parent/child
//! links are ids, never references, so a chapter cannot end up under two
//! parents. Ids are assigned sequentially at creation and never reused.

use crate::error::{Error, Result};

use super::normalize::normalize;

/// Identifier of a chapter within its owning tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChapterId(u32);

impl ChapterId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ChapterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Byte span of a chapter in the assembled body, including all descendant
/// bytes. Filled in by the layout pass; undefined before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterSpan {
    pub offset: usize,
    pub len: usize,
}

#[derive(Debug, Clone)]
struct ChapterNode {
    parent: Option<ChapterId>,
    title: String,
    html: Vec<u8>,
    children: Vec<ChapterId>,
    span: Option<ChapterSpan>,
}

/// An ordered forest of chapters.
#[derive(Debug, Clone, Default)]
pub struct ChapterTree {
    nodes: Vec<ChapterNode>,
    roots: Vec<ChapterId>,
}

impl ChapterTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new root-level chapter and return its id.
    pub fn new_root(&mut self, title: &str, content: &[u8]) -> ChapterId {
        let id = self.alloc(None, title, content);
        self.roots.push(id);
        id
    }

    /// Append a new chapter under `parent`. Content is normalized on entry.
    pub fn add_child(&mut self, parent: ChapterId, title: &str, content: &[u8]) -> Result<ChapterId> {
        self.get(parent)?;
        let id = self.alloc(Some(parent), title, content);
        self.nodes[parent.index()].children.push(id);
        Ok(id)
    }

    /// Move an existing root chapter under `parent`.
    ///
    /// A chapter that already has a parent cannot be attached again; doing
    /// so is a programming error reported as [`Error::AlreadyAttached`].
    pub fn attach(&mut self, parent: ChapterId, child: ChapterId) -> Result<()> {
        self.get(parent)?;
        if parent == child || self.get(child)?.parent.is_some() {
            return Err(Error::AlreadyAttached(child));
        }
        self.roots.retain(|&root| root != child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
        Ok(())
    }

    pub fn set_title(&mut self, id: ChapterId, title: &str) -> Result<()> {
        self.get_mut(id)?.title = title.to_string();
        Ok(())
    }

    pub fn title(&self, id: ChapterId) -> Result<&str> {
        Ok(self.get(id)?.title.as_str())
    }

    /// Replace a chapter's content. Normalized on entry.
    pub fn set_content(&mut self, id: ChapterId, content: &[u8]) -> Result<()> {
        self.get_mut(id)?.html = normalize(content);
        Ok(())
    }

    /// Append to a chapter's content, preserving document order.
    pub fn append_content(&mut self, id: ChapterId, content: &[u8]) -> Result<()> {
        let normalized = normalize(content);
        self.get_mut(id)?.html.extend_from_slice(&normalized);
        Ok(())
    }

    pub fn content(&self, id: ChapterId) -> Result<&[u8]> {
        Ok(self.get(id)?.html.as_slice())
    }

    pub fn parent(&self, id: ChapterId) -> Result<Option<ChapterId>> {
        Ok(self.get(id)?.parent)
    }

    pub fn child_count(&self, id: ChapterId) -> Result<usize> {
        Ok(self.get(id)?.children.len())
    }

    pub fn children(&self, id: ChapterId) -> Result<&[ChapterId]> {
        Ok(self.get(id)?.children.as_slice())
    }

    pub fn roots(&self) -> &[ChapterId] {
        &self.roots
    }

    /// Total number of chapters in the forest.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Layout result for a chapter, if a layout pass has run.
    pub fn span(&self, id: ChapterId) -> Result<Option<ChapterSpan>> {
        Ok(self.get(id)?.span)
    }

    /// Assemble the body stream and record every chapter's span.
    ///
    /// Each chapter emits a heading framed with its title, its content,
    /// every child span in order, and a trailing pagination boundary
    /// marker; a chapter's recorded length therefore covers all of its
    /// descendants' bytes. Offsets address this uncompressed stream.
    pub fn layout(&mut self) -> Vec<u8> {
        let mut body = Vec::new();
        for root in self.roots.clone() {
            self.emit(root, &mut body);
        }
        body
    }

    fn emit(&mut self, id: ChapterId, out: &mut Vec<u8>) {
        let start = out.len();
        {
            let node = &self.nodes[id.index()];
            out.extend_from_slice(b"<h1>");
            out.extend_from_slice(node.title.as_bytes());
            out.extend_from_slice(b"</h1>");
            out.extend_from_slice(&node.html);
        }
        for child in self.nodes[id.index()].children.clone() {
            self.emit(child, out);
        }
        out.extend_from_slice(b"<mbp:pagebreak/>");
        self.nodes[id.index()].span = Some(ChapterSpan {
            offset: start,
            len: out.len() - start,
        });
    }

    fn alloc(&mut self, parent: Option<ChapterId>, title: &str, content: &[u8]) -> ChapterId {
        let id = ChapterId(self.nodes.len() as u32);
        self.nodes.push(ChapterNode {
            parent,
            title: title.to_string(),
            html: normalize(content),
            children: Vec::new(),
            span: None,
        });
        id
    }

    fn get(&self, id: ChapterId) -> Result<&ChapterNode> {
        self.nodes.get(id.index()).ok_or(Error::InvalidParent(id))
    }

    fn get_mut(&mut self, id: ChapterId) -> Result<&mut ChapterNode> {
        self.nodes
            .get_mut(id.index())
            .ok_or(Error::InvalidParent(id))
    }
}
