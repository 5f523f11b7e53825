//! End-to-end conversion tests: Markdown source through the tree builder
//! into a finished container on disk.

use kindling::{ChapterTree, MobiWriter, builder, markdown};

fn populate(source: &str, max_level: u8) -> (ChapterTree, kindling::ChapterId) {
    let doc = markdown::parse_document(source);
    let mut tree = ChapterTree::new();
    let root = tree.new_root("file", b"");
    builder::populate_chapter(&mut tree, root, &doc, max_level).unwrap();
    (tree, root)
}

fn text(tree: &ChapterTree, id: kindling::ChapterId) -> String {
    String::from_utf8(tree.content(id).unwrap().to_vec()).unwrap()
}

#[test]
fn heading_cutoff_scenario() {
    let (tree, root) = populate("# Title\n\nHello\n\n## Sub\n\nWorld", 1);

    // One chapter from the level-1 heading.
    assert_eq!(tree.child_count(root).unwrap(), 1);
    let title = tree.children(root).unwrap()[0];
    assert_eq!(tree.title(title).unwrap(), "Title");
    assert!(text(&tree, title).contains("<p>Hello</p>"));

    // Level 2 exceeds the cutoff: one untitled leaf holding the whole
    // rendered block.
    assert_eq!(tree.child_count(title).unwrap(), 1);
    let leaf = tree.children(title).unwrap()[0];
    assert_eq!(tree.title(leaf).unwrap(), "");
    assert_eq!(tree.child_count(leaf).unwrap(), 0);
    let leaf_text = text(&tree, leaf);
    assert!(leaf_text.contains("<h2>Sub</h2>"));
    assert!(leaf_text.contains("<p>World</p>"));
}

#[test]
fn max_level_zero_keeps_everything_in_one_chapter() {
    let (tree, root) = populate("# A\n\none\n\n# B\n\ntwo\n\n### C\n\nthree", 0);
    assert_eq!(tree.len(), 1);
    let content = text(&tree, root);
    assert!(content.contains("<h1>A</h1>"));
    assert!(content.contains("<h3>C</h3>"));
    assert!(content.contains("<p>three</p>"));
}

#[test]
fn deep_headings_never_produce_titled_chapters() {
    let (tree, root) = populate("# One\n\n## Two\n\n### Three\n\nbody", 2);

    let one = tree.children(root).unwrap()[0];
    let two = tree.children(one).unwrap()[0];
    assert_eq!(tree.title(one).unwrap(), "One");
    assert_eq!(tree.title(two).unwrap(), "Two");

    // Level 3 degrades to an untitled leaf under "Two".
    let leaf = tree.children(two).unwrap()[0];
    assert_eq!(tree.title(leaf).unwrap(), "");
    assert!(text(&tree, leaf).contains("<h3>Three</h3>"));
}

#[test]
fn multiple_files_accumulate_root_chapters() {
    let mut writer = MobiWriter::from_writer(Vec::new());
    writer.set_title("Collected");

    for (name, source) in [
        ("alpha", "# First\n\ncontent"),
        ("beta", "# Second\n\nmore content"),
    ] {
        let doc = markdown::parse_document(source);
        let root = writer.new_chapter(name, b"");
        builder::populate_chapter(writer.chapters_mut(), root, &doc, 1).unwrap();
    }

    assert_eq!(writer.chapters().roots().len(), 2);
    let bytes = writer.finalize().unwrap();
    assert_eq!(&bytes[60..68], b"BOOKMOBI");

    let body_start = String::from_utf8_lossy(&bytes);
    assert!(body_start.contains("<h1>alpha</h1>"));
    assert!(body_start.contains("<h1>beta</h1>"));
}

#[test]
fn script_blocks_in_markdown_are_normalized_away() {
    let source = "# T\n\n<script>alert(1)</script>\n\nplain";
    let (tree, root) = populate(source, 1);
    let title = tree.children(root).unwrap()[0];

    let mut all = text(&tree, title);
    for &child in tree.children(title).unwrap() {
        all.push_str(&text(&tree, child));
    }
    assert!(!all.contains("<script>"));
    assert!(!all.contains("alert"));
    assert!(all.contains("plain"));
}

#[test]
fn finalize_writes_the_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.mobi");

    let mut writer = MobiWriter::create(&path).unwrap();
    writer.set_title("On Disk");
    let doc = markdown::parse_document("# Chapter\n\nbody text");
    let root = writer.new_chapter("On Disk", b"");
    builder::populate_chapter(writer.chapters_mut(), root, &doc, 1).unwrap();
    let returned = writer.finalize().unwrap();

    let written = std::fs::read(&path).unwrap();
    assert_eq!(written, returned);
    assert_eq!(&written[60..68], b"BOOKMOBI");
}

#[test]
fn create_fails_for_unwritable_destination() {
    let err = MobiWriter::create("/nonexistent/dir/out.mobi").unwrap_err();
    assert!(matches!(err, kindling::Error::Io(_)));
}

#[test]
fn layout_spans_nest_after_conversion() {
    let (mut tree, root) = populate("# A\n\ntext\n\n## B\n\nnested", 2);
    let body = tree.layout();

    let root_span = tree.span(root).unwrap().unwrap();
    assert_eq!(root_span.offset, 0);
    assert_eq!(root_span.len, body.len());

    let a = tree.children(root).unwrap()[0];
    let b = tree.children(a).unwrap()[0];
    let a_span = tree.span(a).unwrap().unwrap();
    let b_span = tree.span(b).unwrap().unwrap();

    assert!(a_span.offset >= root_span.offset);
    assert!(b_span.offset >= a_span.offset);
    assert!(b_span.offset + b_span.len <= a_span.offset + a_span.len);
    assert!(a_span.offset + a_span.len <= root_span.offset + root_span.len);
}
