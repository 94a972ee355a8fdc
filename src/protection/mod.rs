//! Reference bookkeeping for safe deletes.
//!
//! Every saved reference becomes a row in the HAS_A edge table. The
//! [`DependentSet`] check reads those rows to decide whether an object can be
//! removed without leaving another object pointing at nothing;
//! [`ProtectionManager`] writes them.

pub mod deletion_guard;
pub mod edge_store;
pub mod errors;
pub mod protection_manager;
pub mod sqlite_store;

pub use deletion_guard::DependentSet;
pub use edge_store::{Edge, EdgeStore, MemoryEdgeStore, ProtectionEntry};
pub use errors::ProtectionError;
pub use protection_manager::{ProtectionManager, ProtectionStack};
pub use sqlite_store::{SqliteEdgeStore, EDGE_TABLE};
