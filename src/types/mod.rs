//! Core domain types for the relay.

pub mod ids;

pub use ids::{MessageTs, PrNumber, Sha, THREAD_KEY_PREFIX, ThreadKey};
