//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define entity-level data access contracts over storage records.
//! - Isolate SQLite query details from service/mutation orchestration.
//!
//! # Invariants
//! - Repository writes only accept values whose shape matches the declared
//!   field kind.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod entity_repo;
