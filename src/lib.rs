//! Retrieval-augmented question answering for veterinary case support.
//!
//! The library exposes a stateless conversation engine: an offline-built
//! vector index over a plain-text corpus, a query rewriter that folds
//! conversation history into a standalone question, a similarity
//! retriever, and a grounded answer composer. Any front end drives it
//! through `Engine::answer(question, history)`.

pub mod core;
pub mod corpus;
pub mod engine;
pub mod history;
pub mod index;
pub mod llm;
pub mod logging;
pub mod server;
pub mod state;

#[cfg(test)]
pub mod test_util;
