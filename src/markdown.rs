//! Markdown frontend.
//!
//! Parses Markdown with `pulldown-cmark` and renders every block to an HTML
//! fragment as it goes, then nests the flat block sequence under its
//! governing headings so the tree builder sees a hierarchical document: a
//! heading node owns all subordinate content as children.

use pulldown_cmark::{Event, Options, Parser, Tag, html};

use crate::document::{DocNode, NodeKind};

/// Parse a Markdown source string into a document tree.
pub fn parse_document(source: &str) -> DocNode {
    let blocks = collect_blocks(source);
    let (children, _) = nest_blocks(&blocks, 0, 0);
    DocNode::document(children)
}

/// A flat top-level block with its rendered fragment.
enum Block {
    Heading {
        level: u8,
        literal: String,
        html: Vec<u8>,
    },
    Paragraph {
        html: Vec<u8>,
    },
    Other {
        html: Vec<u8>,
    },
}

enum OpenKind {
    Heading(u8),
    Paragraph,
    Other,
}

fn collect_blocks(source: &str) -> Vec<Block> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut blocks = Vec::new();
    let mut pending: Vec<Event> = Vec::new();
    let mut depth = 0usize;
    let mut open = OpenKind::Other;

    for event in Parser::new_ext(source, options) {
        match &event {
            Event::Start(tag) => {
                if depth == 0 {
                    open = match tag {
                        Tag::Heading { level, .. } => OpenKind::Heading(*level as u8),
                        Tag::Paragraph => OpenKind::Paragraph,
                        _ => OpenKind::Other,
                    };
                }
                depth += 1;
                pending.push(event);
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                pending.push(event);
                if depth == 0 {
                    let events = std::mem::take(&mut pending);
                    blocks.push(finish_block(&open, events));
                }
            }
            // Loose top-level event, e.g. a thematic break.
            _ if depth == 0 => blocks.push(Block::Other {
                html: render_events(std::slice::from_ref(&event)),
            }),
            _ => pending.push(event),
        }
    }

    blocks
}

fn finish_block(open: &OpenKind, events: Vec<Event>) -> Block {
    match open {
        OpenKind::Heading(level) => Block::Heading {
            level: *level,
            literal: heading_literal(&events),
            html: render_events(&events),
        },
        OpenKind::Paragraph => Block::Paragraph {
            html: render_events(&events),
        },
        OpenKind::Other => Block::Other {
            html: render_events(&events),
        },
    }
}

/// Concatenated literal text of a heading's inline content.
fn heading_literal(events: &[Event]) -> String {
    let mut literal = String::new();
    for event in events {
        match event {
            Event::Text(text) | Event::Code(text) => literal.push_str(text),
            _ => {}
        }
    }
    literal
}

fn render_events(events: &[Event]) -> Vec<u8> {
    let mut out = String::new();
    html::push_html(&mut out, events.iter().cloned());
    out.into_bytes()
}

/// Group flat blocks into a tree: content attaches to the nearest preceding
/// heading, deeper headings nest under shallower ones. Stops at a heading
/// with level below `min_level` so the caller can claim it.
fn nest_blocks(blocks: &[Block], mut i: usize, min_level: u8) -> (Vec<DocNode>, usize) {
    let mut nodes = Vec::new();

    while i < blocks.len() {
        match &blocks[i] {
            Block::Heading { level, .. } if *level < min_level => break,
            Block::Heading {
                level,
                literal,
                html,
            } => {
                let level = *level;
                let mut node = DocNode::heading(level, html.clone());
                if !literal.is_empty() {
                    node.children.push(DocNode::text(literal.clone()));
                }
                i += 1;

                // Content up to the next heading belongs to this one.
                while i < blocks.len() {
                    match &blocks[i] {
                        Block::Heading { .. } => break,
                        block => {
                            node.children.push(content_node(block));
                            i += 1;
                        }
                    }
                }

                // Deeper headings become nested children.
                let (children, next) = nest_blocks(blocks, i, level + 1);
                node.children.extend(children);
                i = next;
                nodes.push(node);
            }
            block => {
                nodes.push(content_node(block));
                i += 1;
            }
        }
    }

    (nodes, i)
}

fn content_node(block: &Block) -> DocNode {
    match block {
        Block::Paragraph { html } => DocNode::paragraph(html.clone()),
        Block::Other { html } => DocNode::other(html.clone()),
        // Headings are claimed by the caller; treat a stray one as opaque.
        Block::Heading { html, .. } => DocNode::other(html.clone()),
    }
}
