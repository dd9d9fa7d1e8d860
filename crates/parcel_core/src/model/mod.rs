//! Parcel domain model.
//!
//! # Responsibility
//! - Define the single record type persisted by the parcel store.
//! - Name the status values the mutation guards key on.
//!
//! # Invariants
//! - A parcel's `number` is assigned by storage and never reused.
//! - Address and row existence are mutable only while status is `registered`.

pub mod parcel;
