//! Domain object contracts shared by the unit-of-work layer.
//!
//! # Responsibility
//! - Define how persisted objects expose their runtime type and clone.
//! - Define the stable `(type, id)` reference used as identity-map key.
//!
//! # Invariants
//! - Two references are equal iff type names and canonical id digests match.
//! - Working copies handed out by a transaction are shared through
//!   `EntityHandle`, never by aliasing caller-owned values.

pub mod entity;
pub mod reference;
