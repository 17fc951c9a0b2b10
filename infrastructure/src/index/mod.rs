//! Semantic index adapters.
//!
//! [`InMemorySemanticIndex`] keeps one vector list per collection and
//! ranks by cosine similarity. Vectors come from an [`Embedder`]; the
//! default [`HashingEmbedder`] needs no model.

mod embedder;
mod memory_index;

pub use embedder::{Embedder, HashingEmbedder};
pub use memory_index::InMemorySemanticIndex;
