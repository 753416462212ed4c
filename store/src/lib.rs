//! Tether Entity Store
//!
//! This crate defines the store contract consumed by the link orchestrator
//! and ships an in-memory implementation:
//! - `EntityStore`: find by key, find-or-create, save, populate
//! - `MemoryStore`: registry-aware tables with a join index for
//!   many-to-many links and foreign keys for one-to-many links

mod index;
mod memory;
mod store;

pub use memory::MemoryStore;
pub use store::*;
