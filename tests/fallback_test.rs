mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::{CONFIG, NOTIFICATIONS, TRANSACTIONS};
use predicates::prelude::*;
use std::process::Command;

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let mut cmd = Command::new(cargo_bin!("acquirer-feedback"));
    cmd.arg(NOTIFICATIONS)
        .arg("--acquirers")
        .arg(CONFIG)
        .arg("--transactions")
        .arg(TRANSACTIONS)
        .arg("--db-path")
        .arg("some_db");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."))
        .stdout(predicate::str::contains("SO004,authorize,320,USD,done,2217460311,"));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let mut cmd = Command::new(cargo_bin!("acquirer-feedback"));
    cmd.arg(NOTIFICATIONS)
        .arg("--acquirers")
        .arg(CONFIG)
        .arg("--transactions")
        .arg(TRANSACTIONS)
        .arg("--db-path")
        .arg(&db_path);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("WARNING").not());
}
