pub mod chunker;
pub mod indexer;
pub mod loader;

pub use chunker::{split_document, TextChunk};
pub use indexer::{IndexBuilder, IndexSummary};
pub use loader::{load_corpus, RawDocument};
