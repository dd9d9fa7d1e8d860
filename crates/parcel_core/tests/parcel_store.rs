use parcel_core::db::{open_db, open_db_in_memory, DbError};
use parcel_core::{
    Parcel, ParcelRepository, RepoError, SqliteParcelRepository, STATUS_REGISTERED, STATUS_SENT,
};
use rusqlite::Connection;
use std::collections::HashSet;
use std::thread;

fn registered_parcel(client: i64, address: &str) -> Parcel {
    Parcel {
        number: 0,
        client,
        status: STATUS_REGISTERED.to_string(),
        address: address.to_string(),
        created_at: "2024-05-01T10:00:00Z".to_string(),
    }
}

#[test]
fn add_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();

    let parcel = registered_parcel(42, "Test Address");
    let number = repo.add(&parcel).unwrap();
    assert!(number > 0);

    let loaded = repo.get(number).unwrap();
    assert_eq!(
        loaded,
        Parcel {
            number,
            ..parcel.clone()
        }
    );
}

#[test]
fn add_ignores_caller_supplied_number() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();

    let mut parcel = registered_parcel(1, "somewhere");
    parcel.number = 9_999;
    let number = repo.add(&parcel).unwrap();

    assert_ne!(number, 9_999);
    assert!(repo.get(9_999).unwrap_err().is_not_found());
}

#[test]
fn add_stores_any_status_without_validation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();

    let mut parcel = registered_parcel(3, "");
    parcel.status = "lost in transit".to_string();
    let number = repo.add(&parcel).unwrap();

    let loaded = repo.get(number).unwrap();
    assert_eq!(loaded.status, "lost in transit");
    assert_eq!(loaded.address, "");
}

#[test]
fn numbers_are_not_reused_after_delete() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();

    let first = repo.add(&registered_parcel(1, "a")).unwrap();
    repo.delete(first).unwrap();
    let second = repo.add(&registered_parcel(1, "b")).unwrap();

    assert!(second > first);
}

#[test]
fn get_missing_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();

    let err = repo.get(12345).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(12345)));
    assert_eq!(err.to_string(), "parcel not found: 12345");
}

#[test]
fn storage_failures_surface_as_db_errors() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    let number = repo.add(&registered_parcel(5, "addr")).unwrap();

    conn.execute_batch("DROP TABLE parcel;").unwrap();

    assert!(matches!(
        repo.add(&registered_parcel(5, "addr")),
        Err(RepoError::Db(DbError::Sqlite(_)))
    ));
    assert!(matches!(repo.get(number), Err(RepoError::Db(_))));
    assert!(matches!(repo.get_by_client(5), Err(RepoError::Db(_))));
    assert!(matches!(
        repo.set_status(number, STATUS_SENT),
        Err(RepoError::Db(_))
    ));
    assert!(matches!(
        repo.set_address(number, "new"),
        Err(RepoError::Db(_))
    ));
    assert!(matches!(repo.delete(number), Err(RepoError::Db(_))));
}

#[test]
fn get_by_client_returns_only_matching_parcels() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();

    let mut expected = HashSet::new();
    for address in ["a", "b", "c"] {
        expected.insert(repo.add(&registered_parcel(10, address)).unwrap());
    }
    repo.add(&registered_parcel(11, "other")).unwrap();

    let parcels = repo.get_by_client(10).unwrap();
    assert_eq!(parcels.len(), 3);
    let numbers: HashSet<_> = parcels.iter().map(|parcel| parcel.number).collect();
    assert_eq!(numbers, expected);
    assert!(parcels.iter().all(|parcel| parcel.client == 10));
}

#[test]
fn get_by_client_without_parcels_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    repo.add(&registered_parcel(1, "a")).unwrap();

    assert!(repo.get_by_client(2).unwrap().is_empty());
}

#[test]
fn get_by_client_propagates_row_decode_failure() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    repo.add(&registered_parcel(77, "fine")).unwrap();
    conn.execute(
        "INSERT INTO parcel (client, status, address, created_at)
         VALUES (77, 'registered', X'00FF', '2024-05-01T10:00:00Z');",
        [],
    )
    .unwrap();

    let err = repo.get_by_client(77).unwrap_err();
    assert!(matches!(err, RepoError::Db(DbError::Sqlite(_))));
}

#[test]
fn set_status_is_unconditional_and_ignores_missing_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    let number = repo.add(&registered_parcel(1, "a")).unwrap();

    repo.set_status(number, STATUS_SENT).unwrap();
    repo.set_status(number, STATUS_REGISTERED).unwrap();
    assert_eq!(repo.get(number).unwrap().status, STATUS_REGISTERED);

    repo.set_status(number + 100, STATUS_SENT).unwrap();
}

#[test]
fn set_address_only_applies_to_registered_parcels() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    let registered = repo.add(&registered_parcel(1, "old")).unwrap();
    let sent = repo.add(&registered_parcel(1, "old")).unwrap();
    repo.set_status(sent, STATUS_SENT).unwrap();

    repo.set_address(registered, "new").unwrap();
    repo.set_address(sent, "new").unwrap();
    repo.set_address(sent + 100, "new").unwrap();

    assert_eq!(repo.get(registered).unwrap().address, "new");
    assert_eq!(repo.get(sent).unwrap().address, "old");
}

#[test]
fn delete_only_removes_registered_parcels() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    let registered = repo.add(&registered_parcel(1, "a")).unwrap();
    let sent = repo.add(&registered_parcel(1, "b")).unwrap();
    repo.set_status(sent, STATUS_SENT).unwrap();

    repo.delete(registered).unwrap();
    repo.delete(sent).unwrap();
    repo.delete(registered).unwrap();

    assert!(repo.get(registered).unwrap_err().is_not_found());
    let kept = repo.get(sent).unwrap();
    assert_eq!(kept.status, STATUS_SENT);
    assert_eq!(kept.address, "b");
}

#[test]
fn registered_parcel_lifecycle_scenario() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    let parcel = Parcel::new(42, "Test Address");

    let id = repo.add(&parcel).unwrap();
    assert!(id > 0);

    let stored = repo.get(id).unwrap();
    assert_eq!(stored.client, 42);
    assert_eq!(stored.status, STATUS_REGISTERED);
    assert_eq!(stored.address, "Test Address");
    assert_eq!(stored.created_at, parcel.created_at);

    repo.set_address(id, "Updated Address").unwrap();
    assert_eq!(repo.get(id).unwrap().address, "Updated Address");

    repo.set_status(id, STATUS_SENT).unwrap();
    assert_eq!(repo.get(id).unwrap().status, STATUS_SENT);

    repo.set_address(id, "New").unwrap();
    assert_eq!(repo.get(id).unwrap().address, "Updated Address");

    repo.delete(id).unwrap();
    let still_there = repo.get(id).unwrap();
    assert_eq!(still_there.status, STATUS_SENT);
    assert_eq!(still_there.address, "Updated Address");
}

#[test]
fn concurrent_delete_and_send_never_leave_registered_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parcels.db");
    let conn = open_db(&path).unwrap();
    let number = SqliteParcelRepository::try_new(&conn)
        .unwrap()
        .add(&registered_parcel(9, "race"))
        .unwrap();

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let path = path.clone();
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let repo = SqliteParcelRepository::try_new(&conn).unwrap();
                if worker == 0 {
                    repo.set_status(number, STATUS_SENT).unwrap();
                } else {
                    repo.delete(number).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    match repo.get(number) {
        Err(RepoError::NotFound(_)) => {}
        Ok(parcel) => assert_eq!(parcel.status, STATUS_SENT),
        Err(other) => panic!("unexpected error: {other}"),
    }
}

#[test]
fn concurrent_address_updates_settle_on_a_written_value() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parcels.db");
    let conn = open_db(&path).unwrap();
    let number = SqliteParcelRepository::try_new(&conn)
        .unwrap()
        .add(&registered_parcel(9, "original"))
        .unwrap();

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let path = path.clone();
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let repo = SqliteParcelRepository::try_new(&conn).unwrap();
                if worker == 0 {
                    repo.set_status(number, STATUS_SENT).unwrap();
                } else {
                    repo.set_address(number, &format!("address-{worker}")).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let parcel = SqliteParcelRepository::try_new(&conn)
        .unwrap()
        .get(number)
        .unwrap();
    let allowed = ["original", "address-1", "address-2", "address-3"];
    assert!(allowed.contains(&parcel.address.as_str()));
    assert_eq!(parcel.status, STATUS_SENT);
}

#[test]
fn repository_accepts_externally_created_parcel_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE parcel (
            number INTEGER PRIMARY KEY AUTOINCREMENT,
            client INTEGER NOT NULL,
            status TEXT NOT NULL,
            address TEXT NOT NULL,
            created_at TEXT NOT NULL
        );",
    )
    .unwrap();

    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    let parcel = registered_parcel(42, "Test Address");
    let number = repo.add(&parcel).unwrap();

    assert_eq!(repo.get(number).unwrap(), Parcel { number, ..parcel });
    let user_version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(user_version, 0);
}

#[test]
fn repository_rejects_connection_without_parcel_table() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteParcelRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("parcel"))
    ));
}

#[test]
fn repository_rejects_parcel_table_missing_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE parcel (
            number INTEGER PRIMARY KEY AUTOINCREMENT,
            client INTEGER NOT NULL,
            status TEXT NOT NULL,
            address TEXT NOT NULL
        );",
    )
    .unwrap();

    let result = SqliteParcelRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "parcel",
            column: "created_at"
        })
    ));
}
