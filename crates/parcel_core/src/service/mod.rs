//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate parcel store calls into use-case level APIs.
//! - Own diagnostic logging for parcel operations.

pub mod parcel_service;
