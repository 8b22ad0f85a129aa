//! Retrieval-augmented question answering

mod pipeline;

pub use pipeline::{Answer, QueryPipeline};
