//! sitebot-vector
//!
//! LanceDB persistence for the chunk index and the two `VectorIndex`
//! backends: an exact in-memory flat L2 index loaded from a snapshot of the
//! table, and LanceDB's own `vector_search`.

pub mod flat;
pub mod schema;
pub mod search;
pub mod snapshot;
pub mod table;
pub mod writer;

pub use flat::FlatL2Index;
pub use search::LanceVectorIndex;
pub use snapshot::{load_snapshot, IndexSnapshot};
pub use writer::{rebuild_index_dir, ChunkIndexWriter};
