//! Value types shared by every editable entity.
//!
//! # Responsibility
//! - Define the rich-text document tree and its projections.
//! - Define the tagged-union field values that make up storage records.
//!
//! # Invariants
//! - Every value here is an immutable input/output of pure functions; no
//!   component keeps references to them across calls.
//! - `FieldValue::Null` is the only way to express "cleared".

pub mod document;
pub mod field;
