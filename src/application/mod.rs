pub mod chunker;
pub mod column_normalizer;
pub mod dataset_parser;
pub mod header_locator;
pub mod pipeline;
pub mod row_materializer;
mod submission;

pub use pipeline::IngestPipeline;
