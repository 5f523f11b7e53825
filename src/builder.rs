//! Chapter tree construction from a document tree.
//!
//! Recursive descent over [`DocNode`]s with the current chapter as the
//! accumulator. Headings at or above the cutoff start new chapters;
//! everything else either joins the current chapter's content or becomes an
//! untitled leaf sub-chapter.

use crate::document::{DocNode, NodeKind};
use crate::error::Result;
use crate::mobi::{ChapterId, ChapterTree};

/// Populate `chapter` from `node`.
///
/// `max_level` controls chapter granularity: 0 renders the entire node into
/// the current chapter; N > 0 turns headings with level <= N into child
/// chapters, while deeper headings and non-heading blocks degrade to leaf
/// content under the nearest enclosing chapter. Never aborts on unknown
/// node kinds; they are rendered and kept as leaves.
pub fn populate_chapter(
    tree: &mut ChapterTree,
    chapter: ChapterId,
    node: &DocNode,
    max_level: u8,
) -> Result<()> {
    if max_level == 0 {
        return tree.append_content(chapter, &node.render_html());
    }

    match &node.kind {
        NodeKind::Document => {
            for child in &node.children {
                populate_chapter(tree, chapter, child, max_level)?;
            }
        }
        // Heading classification takes precedence over titling: the level
        // check decides the node's fate before any text child is looked at.
        NodeKind::Heading { level, .. } if *level <= max_level => {
            let sub = tree.add_child(chapter, "", b"")?;
            for child in &node.children {
                populate_chapter(tree, sub, child, max_level)?;
            }
        }
        NodeKind::Heading { .. } | NodeKind::Other { .. } => {
            tree.add_child(chapter, "", &node.render_html())?;
        }
        NodeKind::Paragraph { html } => {
            tree.append_content(chapter, html)?;
        }
        // A text child titles its chapter; the first one wins and later
        // attempts on an already-titled chapter are ignored.
        NodeKind::Text { literal } => {
            if tree.title(chapter)?.is_empty() {
                tree.set_title(chapter, literal)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocNode;

    fn build(doc: &DocNode, max_level: u8) -> (ChapterTree, ChapterId) {
        let mut tree = ChapterTree::new();
        let root = tree.new_root("File", b"");
        populate_chapter(&mut tree, root, doc, max_level).unwrap();
        (tree, root)
    }

    fn sample_doc() -> DocNode {
        // # Title / Hello / ## Sub / World
        DocNode::document(vec![
            DocNode::heading(1, &b"<h1>Title</h1>"[..]).with_children(vec![
                DocNode::text("Title"),
                DocNode::paragraph(&b"<p>Hello</p>"[..]),
                DocNode::heading(2, &b"<h2>Sub</h2>"[..]).with_children(vec![
                    DocNode::text("Sub"),
                    DocNode::paragraph(&b"<p>World</p>"[..]),
                ]),
            ]),
        ])
    }

    #[test]
    fn max_level_zero_yields_single_chapter() {
        let (tree, root) = build(&sample_doc(), 0);
        assert_eq!(tree.len(), 1);
        let content = tree.content(root).unwrap();
        assert_eq!(
            content,
            b"<h1>Title</h1><p>Hello</p><h2>Sub</h2><p>World</p>"
        );
    }

    #[test]
    fn heading_within_cutoff_becomes_titled_chapter() {
        let (tree, root) = build(&sample_doc(), 1);

        assert_eq!(tree.child_count(root).unwrap(), 1);
        let title = tree.children(root).unwrap()[0];
        assert_eq!(tree.title(title).unwrap(), "Title");
        assert_eq!(tree.content(title).unwrap(), b"<p>Hello</p>");

        // Level 2 > max_level 1: the whole block degrades to one untitled
        // leaf under "Title".
        assert_eq!(tree.child_count(title).unwrap(), 1);
        let leaf = tree.children(title).unwrap()[0];
        assert_eq!(tree.title(leaf).unwrap(), "");
        assert_eq!(tree.content(leaf).unwrap(), b"<h2>Sub</h2><p>World</p>");
        assert_eq!(tree.child_count(leaf).unwrap(), 0);
    }

    #[test]
    fn deeper_cutoff_titles_nested_heading() {
        let (tree, root) = build(&sample_doc(), 2);
        let title = tree.children(root).unwrap()[0];
        let sub = tree.children(title).unwrap()[0];
        assert_eq!(tree.title(sub).unwrap(), "Sub");
        assert_eq!(tree.content(sub).unwrap(), b"<p>World</p>");
    }

    #[test]
    fn first_text_child_wins() {
        let doc = DocNode::document(vec![
            DocNode::heading(1, &b"<h1>First Second</h1>"[..]).with_children(vec![
                DocNode::text("First"),
                DocNode::text("Second"),
            ]),
        ]);
        let (tree, root) = build(&doc, 1);
        let chapter = tree.children(root).unwrap()[0];
        assert_eq!(tree.title(chapter).unwrap(), "First");
    }

    #[test]
    fn untitled_heading_stays_untitled() {
        let doc = DocNode::document(vec![DocNode::heading(1, &b"<h1></h1>"[..])]);
        let (tree, root) = build(&doc, 1);
        let chapter = tree.children(root).unwrap()[0];
        assert_eq!(tree.title(chapter).unwrap(), "");
    }

    #[test]
    fn non_heading_blocks_become_untitled_leaves() {
        let doc = DocNode::document(vec![
            DocNode::heading(1, &b"<h1>T</h1>"[..]).with_children(vec![
                DocNode::text("T"),
                DocNode::other(&b"<ul><li>x</li></ul>"[..]),
                DocNode::paragraph(&b"<p>p</p>"[..]),
            ]),
        ]);
        let (tree, root) = build(&doc, 1);
        let chapter = tree.children(root).unwrap()[0];

        // Paragraph joined the chapter content; the list became a leaf.
        assert_eq!(tree.content(chapter).unwrap(), b"<p>p</p>");
        assert_eq!(tree.child_count(chapter).unwrap(), 1);
        let leaf = tree.children(chapter).unwrap()[0];
        assert_eq!(tree.content(leaf).unwrap(), b"<ul><li>x</li></ul>");
        assert_eq!(tree.title(leaf).unwrap(), "");
    }

    #[test]
    fn paragraphs_keep_document_order() {
        let doc = DocNode::document(vec![
            DocNode::paragraph(&b"<p>one</p>"[..]),
            DocNode::paragraph(&b"<p>two</p>"[..]),
        ]);
        let (tree, root) = build(&doc, 1);
        assert_eq!(tree.content(root).unwrap(), b"<p>one</p><p>two</p>");
    }

    #[test]
    fn preexisting_root_title_is_kept() {
        // The root chapter is named by the caller (e.g. from the filename);
        // a stray text node must not rename it.
        let doc = DocNode::document(vec![DocNode::text("Stray")]);
        let (tree, root) = build(&doc, 1);
        assert_eq!(tree.title(root).unwrap(), "File");
    }
}
