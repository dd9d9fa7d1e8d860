//! Parcel store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over the `parcel` table.
//! - Enforce that address changes and deletion only apply to `registered`
//!   parcels.
//!
//! # Invariants
//! - Every operation is exactly one SQL statement, so no transaction is
//!   needed and no partial write can be observed.
//! - `set_status`, `set_address` and `delete` report success even when no
//!   row matched; affected-row counts are not surfaced.
//! - The store does not log; logging belongs to callers.

use crate::db::DbError;
use crate::model::parcel::{ClientId, Parcel, ParcelNumber};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PARCEL_TABLE: &str = "parcel";
const PARCEL_COLUMNS: [&str; 5] = ["number", "client", "status", "address", "created_at"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Error returned by parcel store operations.
#[derive(Debug)]
pub enum RepoError {
    /// Storage failed to execute or read a statement.
    Db(DbError),
    /// `get` matched no row.
    NotFound(ParcelNumber),
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    /// Returns whether this error is the expected "no such parcel" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(number) => write!(f, "parcel not found: {number}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "parcel repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "parcel repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for parcel CRUD operations.
pub trait ParcelRepository {
    /// Inserts a parcel and returns its storage-assigned number.
    ///
    /// `parcel.number` is ignored. Field contents are stored as given.
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber>;
    /// Loads one parcel, or `RepoError::NotFound` when no row matches.
    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel>;
    /// Loads every parcel owned by `client`, in no particular order.
    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>>;
    /// Overwrites the status regardless of the current one.
    fn set_status(&self, number: ParcelNumber, status: &str) -> RepoResult<()>;
    /// Overwrites the address if the parcel is still `registered`.
    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()>;
    /// Removes the parcel if it is still `registered`.
    fn delete(&self, number: ParcelNumber) -> RepoResult<()>;
}

/// SQLite-backed parcel store over a borrowed connection.
///
/// The store keeps no state besides the connection, so it is as shareable as
/// the connection it wraps.
pub struct SqliteParcelRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteParcelRepository<'conn> {
    /// Constructs a repository over any connection holding a `parcel` table.
    ///
    /// The schema may come from [`crate::db`] migrations or from other
    /// tooling; only the table shape is checked, not `user_version`.
    ///
    /// # Errors
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the `parcel`
    ///   table does not have the expected shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_parcel_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ParcelRepository for SqliteParcelRepository<'_> {
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber> {
        let number = self.conn.query_row(
            "INSERT INTO parcel (client, status, address, created_at)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING number;",
            params![
                parcel.client,
                parcel.status.as_str(),
                parcel.address.as_str(),
                parcel.created_at.as_str(),
            ],
            |row| row.get::<_, ParcelNumber>(0),
        )?;

        Ok(number)
    }

    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        let mut stmt = self.conn.prepare(
            "SELECT
                client,
                status,
                address,
                created_at
             FROM parcel
             WHERE number = ?1;",
        )?;

        let mut rows = stmt.query([number])?;
        let Some(row) = rows.next()? else {
            return Err(RepoError::NotFound(number));
        };

        Ok(Parcel {
            number,
            client: row.get("client")?,
            status: row.get("status")?,
            address: row.get("address")?,
            created_at: row.get("created_at")?,
        })
    }

    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                number,
                client,
                status,
                address,
                created_at
             FROM parcel
             WHERE client = ?1;",
        )?;

        let mut rows = stmt.query([client])?;
        let mut parcels = Vec::new();
        while let Some(row) = rows.next()? {
            parcels.push(parse_parcel_row(row)?);
        }

        Ok(parcels)
    }

    fn set_status(&self, number: ParcelNumber, status: &str) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE parcel
             SET status = ?2
             WHERE number = ?1;",
            params![number, status],
        )?;

        Ok(())
    }

    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE parcel
             SET address = ?2
             WHERE number = ?1
               AND status = 'registered';",
            params![number, address],
        )?;

        Ok(())
    }

    fn delete(&self, number: ParcelNumber) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM parcel
             WHERE number = ?1
               AND status = 'registered';",
            [number],
        )?;

        Ok(())
    }
}

fn parse_parcel_row(row: &Row<'_>) -> RepoResult<Parcel> {
    Ok(Parcel {
        number: row.get("number")?,
        client: row.get("client")?,
        status: row.get("status")?,
        address: row.get("address")?,
        created_at: row.get("created_at")?,
    })
}

fn ensure_parcel_connection_ready(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, PARCEL_TABLE)? {
        return Err(RepoError::MissingRequiredTable(PARCEL_TABLE));
    }

    for column in PARCEL_COLUMNS {
        if !table_has_column(conn, PARCEL_TABLE, column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: PARCEL_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
