//! Tether Registry
//!
//! Runtime type metadata. Single source of truth for record types, their
//! fields and their declared associations. The registry is immutable after
//! construction via RegistryBuilder, and answers relation lookups from a
//! table precomputed at build time.

mod builder;
mod registry;
mod types;

pub use builder::{RegistryBuilder, RegistryError, TypeBuilder};
pub use registry::Registry;
pub use types::*;
