//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data access contract for parcels.
//! - Keep SQL details out of the service layer.
//!
//! # Invariants
//! - Status guards live inside the mutating SQL statement, never in a
//!   separate read-then-write step.
//! - Repository APIs return semantic errors (`NotFound`) alongside DB
//!   transport errors.

pub mod parcel_repo;
