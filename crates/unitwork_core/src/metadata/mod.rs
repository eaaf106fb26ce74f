//! Per-type persistence metadata.
//!
//! # Responsibility
//! - Describe how instances of one entity type are identified.
//! - Hold the ordered relation hooks that run around save and load.
//! - Map entity type names to their metadata.
//!
//! # Invariants
//! - Relations run in registration order.
//! - The registry is built during setup and only read afterwards.

pub mod descriptor;
pub mod identifier;
pub mod registry;
pub mod relation;
