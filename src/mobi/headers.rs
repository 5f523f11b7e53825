//! Record 0: PalmDOC header, MOBI header, and EXTH metadata block.
//!
//! The writer builds these; the parse half reads them back and exists for
//! container verification (integration tests round-trip every field that
//! the builder emits).

use std::io;

pub const NULL_INDEX: u32 = 0xFFFF_FFFF;

/// Text records hold at most this many uncompressed bytes.
pub const TEXT_RECORD_SIZE: usize = 4096;

/// MOBI header length for version 6 files (bytes 0x10..0xF8 of record 0).
const MOBI_HEADER_LEN: u32 = 232;

/// Body compression mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    PalmDoc,
}

impl Compression {
    fn code(self) -> u16 {
        match self {
            Compression::None => 1,
            Compression::PalmDoc => 2,
        }
    }

    fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Compression::None),
            2 => Some(Compression::PalmDoc),
            _ => None,
        }
    }
}

/// EXTH record kinds with their MOBI type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExthKind {
    Author,
    Publisher,
    Description,
    Isbn,
    Subject,
    PubDate,
    Rights,
    Source,
    Asin,
    CoverOffset,
    ThumbOffset,
    DocType,
    CdeType,
}

impl ExthKind {
    pub fn code(self) -> u32 {
        match self {
            ExthKind::Author => 100,
            ExthKind::Publisher => 101,
            ExthKind::Description => 103,
            ExthKind::Isbn => 104,
            ExthKind::Subject => 105,
            ExthKind::PubDate => 106,
            ExthKind::Rights => 109,
            ExthKind::Source => 112,
            ExthKind::Asin => 113,
            ExthKind::CoverOffset => 201,
            ExthKind::ThumbOffset => 202,
            ExthKind::DocType => 501,
            ExthKind::CdeType => 504,
        }
    }
}

/// Ordered EXTH block under construction. Duplicate kinds are legal and
/// preserved in insertion order; consumers must not assume uniqueness.
#[derive(Debug, Default)]
pub(crate) struct ExthBuilder {
    records: Vec<(u32, Vec<u8>)>,
}

impl ExthBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_string(&mut self, kind: ExthKind, value: &str) {
        self.records.push((kind.code(), value.as_bytes().to_vec()));
    }

    pub(crate) fn push_u32(&mut self, kind: ExthKind, value: u32) {
        self.records.push((kind.code(), value.to_be_bytes().to_vec()));
    }

    pub(crate) fn contains(&self, kind: ExthKind) -> bool {
        self.records.iter().any(|(code, _)| *code == kind.code())
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut content = Vec::new();
        content.extend_from_slice(&(self.records.len() as u32).to_be_bytes());
        for (code, data) in &self.records {
            content.extend_from_slice(&code.to_be_bytes());
            content.extend_from_slice(&(8 + data.len() as u32).to_be_bytes());
            content.extend_from_slice(data);
        }

        // Pad to a 4-byte boundary.
        while content.len() % 4 != 0 {
            content.push(0);
        }

        let mut exth = Vec::with_capacity(12 + content.len());
        exth.extend_from_slice(b"EXTH");
        exth.extend_from_slice(&(12 + content.len() as u32).to_be_bytes());
        exth.extend_from_slice(&content);
        exth
    }
}

/// Everything record 0 needs, gathered by the writer's layout pass.
#[derive(Debug)]
pub(crate) struct Record0 {
    pub(crate) title: String,
    pub(crate) compression: Compression,
    pub(crate) text_length: u32,
    pub(crate) text_record_count: u16,
    pub(crate) first_non_text: u32,
    pub(crate) first_image: u32,
    pub(crate) fcis_record: u32,
    pub(crate) flis_record: u32,
    pub(crate) uid: u32,
    pub(crate) exth: Vec<u8>,
}

impl Record0 {
    pub(crate) fn build(&self) -> Vec<u8> {
        let title_bytes = self.title.as_bytes();
        let title_offset = 16 + MOBI_HEADER_LEN + self.exth.len() as u32;

        let mut rec = Vec::with_capacity(title_offset as usize + title_bytes.len() + 8);

        // PalmDOC header (16 bytes).
        rec.extend_from_slice(&self.compression.code().to_be_bytes());
        rec.extend_from_slice(&[0, 0]);
        rec.extend_from_slice(&self.text_length.to_be_bytes());
        rec.extend_from_slice(&self.text_record_count.to_be_bytes());
        rec.extend_from_slice(&(TEXT_RECORD_SIZE as u16).to_be_bytes());
        rec.extend_from_slice(&0u16.to_be_bytes()); // encryption: none
        rec.extend_from_slice(&0u16.to_be_bytes());

        // MOBI header.
        rec.extend_from_slice(b"MOBI");
        rec.extend_from_slice(&MOBI_HEADER_LEN.to_be_bytes());
        rec.extend_from_slice(&2u32.to_be_bytes()); // type: book
        rec.extend_from_slice(&65001u32.to_be_bytes()); // UTF-8
        rec.extend_from_slice(&self.uid.to_be_bytes());
        rec.extend_from_slice(&6u32.to_be_bytes()); // file version

        // Index metadata (orthographic, inflection, names, keys, extra 0-5).
        for _ in 0..10 {
            rec.extend_from_slice(&NULL_INDEX.to_be_bytes());
        }

        rec.extend_from_slice(&self.first_non_text.to_be_bytes());
        rec.extend_from_slice(&title_offset.to_be_bytes());
        rec.extend_from_slice(&(title_bytes.len() as u32).to_be_bytes());
        rec.extend_from_slice(&9u32.to_be_bytes()); // locale: English
        rec.extend_from_slice(&0u32.to_be_bytes()); // input language
        rec.extend_from_slice(&0u32.to_be_bytes()); // output language
        rec.extend_from_slice(&6u32.to_be_bytes()); // min version
        rec.extend_from_slice(&self.first_image.to_be_bytes());

        // Huffman records (unused without HUFF/CDIC compression).
        for _ in 0..4 {
            rec.extend_from_slice(&0u32.to_be_bytes());
        }

        rec.extend_from_slice(&0x40u32.to_be_bytes()); // EXTH flag

        rec.extend_from_slice(&[0u8; 32]);
        rec.extend_from_slice(&NULL_INDEX.to_be_bytes());

        // DRM (none).
        rec.extend_from_slice(&NULL_INDEX.to_be_bytes());
        rec.extend_from_slice(&0u32.to_be_bytes());
        rec.extend_from_slice(&0u32.to_be_bytes());
        rec.extend_from_slice(&0u32.to_be_bytes());

        rec.extend_from_slice(&[0u8; 8]);

        // Content record range.
        rec.extend_from_slice(&1u16.to_be_bytes());
        rec.extend_from_slice(&self.text_record_count.to_be_bytes());

        rec.extend_from_slice(&1u32.to_be_bytes());
        rec.extend_from_slice(&self.fcis_record.to_be_bytes());
        rec.extend_from_slice(&1u32.to_be_bytes());
        rec.extend_from_slice(&self.flis_record.to_be_bytes());
        rec.extend_from_slice(&1u32.to_be_bytes());

        rec.extend_from_slice(&[0u8; 8]);
        rec.extend_from_slice(&NULL_INDEX.to_be_bytes());
        rec.extend_from_slice(&0u32.to_be_bytes());
        rec.extend_from_slice(&NULL_INDEX.to_be_bytes());
        rec.extend_from_slice(&0u32.to_be_bytes());
        rec.extend_from_slice(&0u32.to_be_bytes()); // extra record data flags
        rec.extend_from_slice(&NULL_INDEX.to_be_bytes()); // INDX record

        debug_assert_eq!(rec.len() as u32, 16 + MOBI_HEADER_LEN);

        // EXTH block, then the full title.
        rec.extend_from_slice(&self.exth);
        rec.extend_from_slice(title_bytes);
        rec.extend_from_slice(&[0, 0]);
        while rec.len() % 4 != 0 {
            rec.push(0);
        }

        rec
    }
}

/// Parsed view of record 0's fixed headers.
#[derive(Debug)]
pub struct MobiHeader {
    pub compression: Compression,
    pub text_length: u32,
    pub text_record_count: u16,
    pub text_record_size: u16,
    pub codepage: u32,
    pub uid: u32,
    pub version: u32,
    pub first_non_text: u32,
    pub first_image: u32,
    pub exth_flags: u32,
    pub title: String,
}

impl MobiHeader {
    pub fn parse(data: &[u8]) -> io::Result<Self> {
        if data.len() < 16 + MOBI_HEADER_LEN as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "record 0 too short",
            ));
        }
        if &data[16..20] != b"MOBI" {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "missing MOBI signature",
            ));
        }

        let compression = Compression::from_code(read_u16(data, 0)).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "unknown compression code")
        })?;

        let title_offset = read_u32(data, 0x54) as usize;
        let title_length = read_u32(data, 0x58) as usize;
        let title = if title_offset + title_length <= data.len() {
            String::from_utf8_lossy(&data[title_offset..title_offset + title_length]).into_owned()
        } else {
            String::new()
        };

        Ok(Self {
            compression,
            text_length: read_u32(data, 4),
            text_record_count: read_u16(data, 8),
            text_record_size: read_u16(data, 10),
            codepage: read_u32(data, 0x1C),
            uid: read_u32(data, 0x20),
            version: read_u32(data, 0x24),
            first_non_text: read_u32(data, 0x50),
            first_image: read_u32(data, 0x6C),
            exth_flags: read_u32(data, 0x80),
            title,
        })
    }

    pub fn has_exth(&self) -> bool {
        self.exth_flags & 0x40 != 0
    }
}

/// One parsed EXTH record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExthRecord {
    pub code: u32,
    pub data: Vec<u8>,
}

/// Parsed EXTH block. Records stay in file order; duplicates are kept.
#[derive(Debug, Default)]
pub struct ExthHeader {
    pub records: Vec<ExthRecord>,
}

impl ExthHeader {
    /// Parse the EXTH block starting right after the MOBI header.
    pub fn parse(data: &[u8]) -> io::Result<Self> {
        if data.len() < 12 || &data[0..4] != b"EXTH" {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "missing EXTH signature",
            ));
        }

        let record_count = read_u32(data, 8);
        let mut records = Vec::with_capacity(record_count as usize);
        let mut pos = 12;

        for _ in 0..record_count {
            if pos + 8 > data.len() {
                break;
            }
            let code = read_u32(data, pos);
            let len = read_u32(data, pos + 4) as usize;
            if len < 8 || pos + len > data.len() {
                break;
            }
            records.push(ExthRecord {
                code,
                data: data[pos + 8..pos + len].to_vec(),
            });
            pos += len;
        }

        Ok(Self { records })
    }

    /// All string values of a kind, in insertion order.
    pub fn strings(&self, kind: ExthKind) -> Vec<String> {
        self.records
            .iter()
            .filter(|rec| rec.code == kind.code())
            .map(|rec| String::from_utf8_lossy(&rec.data).into_owned())
            .collect()
    }

    /// First u32 value of a kind, if present.
    pub fn u32_value(&self, kind: ExthKind) -> Option<u32> {
        self.records
            .iter()
            .find(|rec| rec.code == kind.code())
            .and_then(|rec| rec.data.get(0..4))
            .map(|bytes| u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

fn read_u16(data: &[u8], pos: usize) -> u16 {
    u16::from_be_bytes([data[pos], data[pos + 1]])
}

fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}
