//! Parcel use-case service.
//!
//! # Responsibility
//! - Register parcels, advance their delivery status, and expose per-client
//!   listings for callers such as the CLI.
//! - Emit metadata-only `parcel_*` log events; the store stays silent.
//!
//! # Invariants
//! - Address changes and deletion go through the repository's guarded
//!   statements; the service never pre-checks status for them.
//! - Status advances `registered -> sent -> delivered` and stops there.

use crate::model::parcel::{
    ClientId, Parcel, ParcelNumber, STATUS_DELIVERED, STATUS_REGISTERED, STATUS_SENT,
};
use crate::repo::parcel_repo::{ParcelRepository, RepoResult};
use log::{error, info};

/// Use-case service wrapper for parcel store operations.
pub struct ParcelService<R: ParcelRepository> {
    repo: R,
}

impl<R: ParcelRepository> ParcelService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new parcel for `client` and returns it with its number.
    pub fn register(&self, client: ClientId, address: impl Into<String>) -> RepoResult<Parcel> {
        let mut parcel = Parcel::new(client, address);
        parcel.number = self.repo.add(&parcel).inspect_err(|err| {
            error!("event=parcel_register module=service status=error client={client} error={err}");
        })?;

        info!(
            "event=parcel_register module=service status=ok number={} client={client}",
            parcel.number
        );
        Ok(parcel)
    }

    /// Lists a client's parcels ordered by number.
    pub fn client_parcels(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        let mut parcels = self.repo.get_by_client(client)?;
        parcels.sort_by_key(|parcel| parcel.number);

        info!(
            "event=parcel_list module=service status=ok client={client} count={}",
            parcels.len()
        );
        Ok(parcels)
    }

    /// Moves a parcel one step along its delivery lifecycle.
    ///
    /// Returns the new status, or `None` when the parcel is already in a
    /// terminal status and nothing was written.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when the parcel does not exist.
    pub fn next_status(&self, number: ParcelNumber) -> RepoResult<Option<String>> {
        let parcel = self.repo.get(number)?;

        let next = match parcel.status.as_str() {
            STATUS_REGISTERED => STATUS_SENT,
            STATUS_SENT => STATUS_DELIVERED,
            current => {
                info!(
                    "event=parcel_next_status module=service status=skipped number={number} current={current}"
                );
                return Ok(None);
            }
        };

        self.repo.set_status(number, next)?;
        info!(
            "event=parcel_next_status module=service status=ok number={number} from={} to={next}",
            parcel.status
        );
        Ok(Some(next.to_string()))
    }

    /// Changes the address of a parcel that is still registered.
    ///
    /// A missing or non-registered parcel is left as is without error.
    pub fn change_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()> {
        self.repo.set_address(number, address)?;
        info!("event=parcel_change_address module=service status=ok number={number}");
        Ok(())
    }

    /// Deletes a parcel that is still registered.
    ///
    /// A missing or non-registered parcel is left as is without error.
    pub fn delete(&self, number: ParcelNumber) -> RepoResult<()> {
        self.repo.delete(number)?;
        info!("event=parcel_delete module=service status=ok number={number}");
        Ok(())
    }

    /// Loads one parcel by number.
    pub fn get(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        self.repo.get(number)
    }
}
