mod chapter;
mod headers;
mod normalize;
mod palmdoc;
mod writer;

pub use chapter::{ChapterId, ChapterSpan, ChapterTree};
pub use headers::{Compression, ExthHeader, ExthKind, ExthRecord, MobiHeader, NULL_INDEX};
pub use normalize::normalize;
pub use palmdoc::{compress, decompress};
pub use writer::MobiWriter;
