//! Exemplar retrieval: query synthesis, store clients and context rendering

pub mod chroma;
pub mod context;
pub mod memory;
pub mod query;
pub mod store;

pub use chroma::ChromaStore;
pub use context::{RetrievalContextFormatter, DEFAULT_MAX_EXEMPLAR_CHARS, NO_EXAMPLES_PLACEHOLDER};
pub use memory::StaticExemplarStore;
pub use query::{RetrievalQuery, MAX_QUERY_TERMS};
pub use store::{Exemplar, ExemplarStore, StoreError, StoreQuery};
