//! MOBI container writer.
//!
//! Owns the document-level state for one conversion (title, author,
//! compression mode, metadata records, cover assets, chapter forest) and
//! assembles the Palm database on finalize.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use log::{debug, warn};

use crate::error::{Error, Result};

use super::chapter::{ChapterId, ChapterTree};
use super::headers::{Compression, ExthBuilder, ExthKind, NULL_INDEX, Record0, TEXT_RECORD_SIZE};
use super::palmdoc;

/// Offset of the record index within the PDB header.
const PDB_HEADER_LEN: usize = 78;

#[derive(Debug)]
struct CoverAssets {
    cover: Vec<u8>,
    thumb: Vec<u8>,
}

/// Writer for a single MOBI document.
///
/// All state is instance-scoped: the chapter id counter, metadata records
/// and cover assets belong to this writer alone, so sequential conversions
/// in one process never interfere. The destination is acquired once at
/// creation and released when the writer is consumed or dropped.
#[derive(Debug)]
pub struct MobiWriter<W: Write> {
    out: W,
    title: String,
    author: String,
    compression: Compression,
    metadata: Vec<(ExthKind, String)>,
    cover: Option<CoverAssets>,
    tree: ChapterTree,
}

impl MobiWriter<io::BufWriter<File>> {
    /// Open `path` for writing, truncating any existing file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(io::BufWriter::new(file)))
    }
}

impl<W: Write> MobiWriter<W> {
    /// Build a writer over any [`Write`] destination, e.g. a `Vec<u8>`.
    pub fn from_writer(out: W) -> Self {
        Self {
            out,
            title: String::new(),
            author: String::new(),
            compression: Compression::None,
            metadata: Vec::new(),
            cover: None,
            tree: ChapterTree::new(),
        }
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub fn set_author(&mut self, author: &str) {
        self.author = author.to_string();
    }

    pub fn set_compression(&mut self, compression: Compression) {
        self.compression = compression;
    }

    /// Store cover assets for embedding.
    ///
    /// Both the cover image and the thumbnail must be non-empty; a partial
    /// pair is a caller error that degrades to "no cover" with a warning
    /// rather than failing the conversion.
    pub fn add_cover(&mut self, cover: Vec<u8>, thumb: Vec<u8>) {
        if cover.is_empty() || thumb.is_empty() {
            warn!("{}", Error::IncompleteCoverAssets);
            return;
        }
        self.cover = Some(CoverAssets { cover, thumb });
    }

    /// Append a metadata record. Duplicates of a kind are legal and keep
    /// their insertion order in the output.
    pub fn add_metadata_record(&mut self, kind: ExthKind, value: &str) {
        self.metadata.push((kind, value.to_string()));
    }

    /// Create a new root-level chapter. Ids are assigned sequentially from
    /// this writer's counter and never reused.
    pub fn new_chapter(&mut self, title: &str, content: &[u8]) -> ChapterId {
        self.tree.new_root(title, content)
    }

    pub fn chapters(&self) -> &ChapterTree {
        &self.tree
    }

    pub fn chapters_mut(&mut self) -> &mut ChapterTree {
        &mut self.tree
    }

    /// Run the layout pass, emit the container to the destination, and
    /// return the assembled bytes.
    pub fn finalize(mut self) -> Result<Vec<u8>> {
        let container = self.assemble()?;
        self.out.write_all(&container)?;
        self.out.flush()?;
        Ok(container)
    }

    fn assemble(&mut self) -> Result<Vec<u8>> {
        let body = self.tree.layout();
        if body.len() > u32::MAX as usize {
            return Err(Error::Serialization(format!(
                "body of {} bytes exceeds the container limit",
                body.len()
            )));
        }

        // Record 0 placeholder, then text records.
        let mut records: Vec<Vec<u8>> = vec![Vec::new()];
        for chunk in body.chunks(TEXT_RECORD_SIZE) {
            let record = match self.compression {
                Compression::None => chunk.to_vec(),
                Compression::PalmDoc => palmdoc::compress(chunk),
            };
            if record.len() > 2 * TEXT_RECORD_SIZE {
                return Err(Error::Serialization(format!(
                    "text record expanded to {} bytes",
                    record.len()
                )));
            }
            records.push(record);
        }
        let text_record_count = records.len() - 1;
        let first_non_text = records.len() as u32;

        // Cover and thumbnail image records follow the text.
        let mut first_image = NULL_INDEX;
        if let Some(assets) = self.cover.take() {
            first_image = records.len() as u32;
            records.push(assets.cover);
            records.push(assets.thumb);
        }

        let flis_record = records.len() as u32;
        records.push(flis());
        let fcis_record = records.len() as u32;
        records.push(fcis(body.len() as u32));
        records.push(b"\xe9\x8e\r\n".to_vec());

        if records.len() > u16::MAX as usize {
            return Err(Error::Serialization(format!(
                "{} records exceed the record index limit",
                records.len()
            )));
        }

        records[0] = Record0 {
            title: self.title.clone(),
            compression: self.compression,
            text_length: body.len() as u32,
            text_record_count: text_record_count as u16,
            first_non_text,
            first_image,
            fcis_record,
            flis_record,
            uid: time_uid(),
            exth: self.build_exth(first_image),
        }
        .build();

        debug!(
            "assembled {} chapters into {} records ({} text bytes)",
            self.tree.len(),
            records.len(),
            body.len()
        );

        Ok(write_pdb(&self.title, &records))
    }

    fn build_exth(&self, first_image: u32) -> Vec<u8> {
        let mut exth = ExthBuilder::new();
        for (kind, value) in &self.metadata {
            exth.push_string(*kind, value);
        }

        // The metadata block always carries a document type and an author.
        if !exth.contains(ExthKind::DocType) {
            exth.push_string(ExthKind::DocType, "EBOK");
        }
        if !self.author.is_empty() && !exth.contains(ExthKind::Author) {
            exth.push_string(ExthKind::Author, &self.author);
        }

        // Offsets relative to the first image record.
        if first_image != NULL_INDEX {
            exth.push_u32(ExthKind::CoverOffset, 0);
            exth.push_u32(ExthKind::ThumbOffset, 1);
        }

        exth.build()
    }
}

/// Assemble the Palm database: header, record index, then the records.
fn write_pdb(title: &str, records: &[Vec<u8>]) -> Vec<u8> {
    let index_len = 8 * records.len() + 2;
    let data_start = PDB_HEADER_LEN + index_len;
    let total: usize = data_start + records.iter().map(Vec::len).sum::<usize>();
    let mut out = Vec::with_capacity(total);

    // Database name: truncated, filesystem-safe title.
    let name = sanitize_title(title);
    let mut name_bytes = [0u8; 32];
    let copy_len = name.len().min(31);
    name_bytes[..copy_len].copy_from_slice(&name.as_bytes()[..copy_len]);
    out.extend_from_slice(&name_bytes);

    let now = time_now_secs();
    out.extend_from_slice(&0u16.to_be_bytes()); // attributes
    out.extend_from_slice(&0u16.to_be_bytes()); // version
    out.extend_from_slice(&now.to_be_bytes()); // creation date
    out.extend_from_slice(&now.to_be_bytes()); // modification date
    out.extend_from_slice(&0u32.to_be_bytes()); // last backup
    out.extend_from_slice(&0u32.to_be_bytes()); // modification number
    out.extend_from_slice(&0u32.to_be_bytes()); // app info
    out.extend_from_slice(&0u32.to_be_bytes()); // sort info
    out.extend_from_slice(b"BOOKMOBI");
    out.extend_from_slice(&((2 * records.len() - 1) as u32).to_be_bytes()); // uid seed
    out.extend_from_slice(&0u32.to_be_bytes()); // next record list
    out.extend_from_slice(&(records.len() as u16).to_be_bytes());

    // Record index: offset plus a per-record unique id.
    let mut offset = data_start as u32;
    for (i, record) in records.iter().enumerate() {
        out.extend_from_slice(&offset.to_be_bytes());
        let id = (2 * i) as u32;
        let id_bytes = id.to_be_bytes();
        out.extend_from_slice(&[0, id_bytes[1], id_bytes[2], id_bytes[3]]);
        offset += record.len() as u32;
    }
    out.extend_from_slice(&[0, 0]);

    for record in records {
        out.extend_from_slice(record);
    }

    out
}

/// FLIS record: fixed-format filler required by device firmware.
fn flis() -> Vec<u8> {
    b"FLIS\0\0\0\x08\0\x41\0\0\0\0\0\0\xff\xff\xff\xff\0\x01\0\x03\0\0\0\x03\0\0\0\x01\xff\xff\xff\xff".to_vec()
}

/// FCIS record, parameterized on the uncompressed text length.
fn fcis(text_length: u32) -> Vec<u8> {
    let mut record = Vec::new();
    record.extend_from_slice(b"FCIS\x00\x00\x00\x14\x00\x00\x00\x10\x00\x00\x00\x02\x00\x00\x00\x00");
    record.extend_from_slice(&text_length.to_be_bytes());
    record.extend_from_slice(b"\x00\x00\x00\x00\x00\x00\x00\x28\x00\x00\x00\x00\x00\x00\x00");
    record.extend_from_slice(b"\x28\x00\x00\x00\x08\x00\x01\x00\x01\x00\x00\x00\x00");
    record
}

fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ' || *c == '_' || *c == '-')
        .collect::<String>()
        .replace(' ', "_")
}

fn time_now_secs() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

/// Time-seeded database uid.
fn time_uid() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u32)
        .unwrap_or(12345);
    seed.wrapping_mul(1103515245).wrapping_add(12345)
}
