//! Domain model for provincial official records.
//!
//! # Responsibility
//! - Define the canonical official record and the fixed position table.
//! - Turn raw form input into a validated, typed write request.
//!
//! # Invariants
//! - Every persisted official is identified by a store-generated `OfficialId`.
//! - Position labels are defined once in `Position` and reused by both
//!   validation and listing.

pub mod official;
pub mod validation;
