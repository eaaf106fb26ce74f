//! Unit-of-work transaction over metadata and repository backends.
//!
//! # Responsibility
//! - Save and load entities through their type's metadata and backend.
//! - Guarantee each reference is saved at most once and loaded at most once
//!   per transaction, including across cyclic relation graphs.
//!
//! # Invariants
//! - A reference is inserted into the identity map before any relation hook
//!   for it runs, so reentrant visits short-circuit.
//! - The caller's objects are never mutated; hooks work on private copies.
//! - Failures do not roll back identity-map entries.

mod identity_map;
mod unit;

pub use identity_map::EntryState;
pub use unit::Transaction;
