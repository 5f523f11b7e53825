//! # kindling
//!
//! A small library and CLI for converting Markdown documents into MOBI
//! ebooks readable on Kindle devices.
//!
//! ## Features
//!
//! - Chapter tree construction from Markdown headings, with a configurable
//!   nesting cutoff
//! - Palm database output with byte-accurate record offsets
//! - Optional PalmDoc LZ77 body compression
//! - EXTH metadata records, cover image and thumbnail embedding
//!
//! ## Quick Start
//!
//! ```no_run
//! use kindling::{MobiWriter, ExthKind, builder, markdown};
//!
//! let source = std::fs::read_to_string("book.md")?;
//! let doc = markdown::parse_document(&source);
//!
//! let mut writer = MobiWriter::create("book.mobi")?;
//! writer.set_title("My Book");
//! writer.set_author("Someone");
//! writer.add_metadata_record(ExthKind::DocType, "EBOK");
//!
//! let root = writer.new_chapter("My Book", b"");
//! builder::populate_chapter(writer.chapters_mut(), root, &doc, 1)?;
//! writer.finalize()?;
//! # Ok::<(), kindling::Error>(())
//! ```

pub mod builder;
#[cfg(feature = "cli")]
pub mod config;
pub mod document;
pub mod error;
pub mod markdown;
pub mod mobi;

#[cfg(feature = "cli")]
pub use config::Config;
pub use error::{Error, Result};
pub use mobi::{ChapterId, ChapterSpan, ChapterTree, Compression, ExthKind, MobiWriter};
