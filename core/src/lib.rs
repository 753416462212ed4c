//! Tether Core Types
//!
//! This crate provides the foundational types shared by every Tether component:
//! - Identity types (RecordId)
//! - Value types (the Value enum and the Fields map)
//! - Record structures (Record, Association, Cardinality)
//! - The store error type, including the structural insert-conflict marker

mod error;
mod id;
mod record;
mod value;

pub use error::*;
pub use id::*;
pub use record::*;
pub use value::*;
