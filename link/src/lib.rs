//! Tether Link
//!
//! Idempotent association linking: attach a child to a parent's relation,
//! creating the child if needed, persist the parent, and notify observers
//! once per fresh link.
//!
//! # Module Structure
//!
//! - `orchestrator` - `Linker`, which sequences the whole operation
//! - `request` - link requests and child descriptors, parsed from route params
//! - `resolver` - child lookup-or-create against the entity store
//! - `mutator` - in-memory add with duplicate classification
//! - `outcome` - the populated result returned to the caller
//! - `config` - `LinkConfig`
//! - `error` - error types for link failures

mod config;
mod error;
mod mutator;
mod orchestrator;
mod outcome;
mod request;
mod resolver;

pub use config::LinkConfig;
pub use error::{LinkError, LinkResult};
pub use mutator::{absorb_conflict, apply, Applied};
pub use orchestrator::Linker;
pub use outcome::LinkOutcome;
pub use request::{strip_reserved, ChildDescriptor, LinkRequest};
pub use resolver::{ChildResolver, ResolvedChild};
