pub mod composer;
#[allow(clippy::module_inception)]
pub mod engine;
pub mod retriever;
pub mod rewriter;

pub use composer::{AnswerComposer, AnswerResponse};
pub use engine::Engine;
pub use retriever::Retriever;
pub use rewriter::QueryRewriter;
