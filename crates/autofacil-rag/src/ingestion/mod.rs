//! Document ingestion: decode, extract, chunk, embed and index

mod chunker;
mod parser;
mod pipeline;

pub use chunker::TextChunker;
pub use parser::FileParser;
pub use pipeline::{IngestOutcome, IngestPipeline};
