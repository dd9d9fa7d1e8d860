//! Parcel record and status vocabulary.
//!
//! # Responsibility
//! - Define the canonical `Parcel` row shape shared by store and service.
//! - Provide a constructor for freshly registered parcels.
//!
//! # Invariants
//! - `created_at` is RFC 3339 UTC and is never rewritten after creation.
//! - Status is free text; only `STATUS_REGISTERED` unlocks address edits and
//!   deletion.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Storage-assigned parcel identifier (`parcel.number`).
pub type ParcelNumber = i64;

/// Owning client identifier (`parcel.client`).
pub type ClientId = i64;

/// Initial status. The only status under which address and deletion are allowed.
pub const STATUS_REGISTERED: &str = "registered";
/// Parcel handed over for delivery.
pub const STATUS_SENT: &str = "sent";
/// Parcel reached its recipient.
pub const STATUS_DELIVERED: &str = "delivered";

/// One tracked shipment, mirroring a row of the `parcel` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    /// Zero until the store assigns a number on insert.
    pub number: ParcelNumber,
    pub client: ClientId,
    pub status: String,
    pub address: String,
    /// RFC 3339 creation timestamp, e.g. `2024-05-01T10:00:00Z`.
    pub created_at: String,
}

impl Parcel {
    /// Creates an unsaved registered parcel stamped with the current UTC time.
    pub fn new(client: ClientId, address: impl Into<String>) -> Self {
        Self {
            number: 0,
            client,
            status: STATUS_REGISTERED.to_string(),
            address: address.into(),
            created_at: now_rfc3339(),
        }
    }
}

/// Current UTC time in the format stored in `parcel.created_at`.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
