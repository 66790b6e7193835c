//! Conversation threading.
//!
//! - [`key`]: which thread an event belongs to
//! - [`registry`]: where each thread started

pub mod key;
pub mod registry;

pub use key::{
    CommitSearch, DEFAULT_SEARCH_TIMEOUT, SearchHit, ThreadKeyResolver, direct_key, most_recent,
};
pub use registry::{FileThreadRegistry, MemoryThreadRegistry, RegistryError, ThreadRegistry};
