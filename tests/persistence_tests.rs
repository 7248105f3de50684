#![cfg(feature = "sled")]

mod common;

use common::User;
use datastone::prelude::*;

#[test]
fn test_records_survive_reopen() {
    common::init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = FileConfig::builder()
        .path(dir.path().join("store"))
        .cache_size_mb(8)
        .flush_every_ms(None)
        .build();

    let encoded = {
        let ctx = SledContext::open(&config).unwrap();
        let conn = SledConnection::new(ctx);
        let id = conn.storage("users").put(&User::new("alice", 31)).unwrap();
        conn.context().flush().unwrap();
        id.encode()
    };

    let conn = SledConnection::new(SledContext::open(&config).unwrap());
    let users = conn.storage("users");
    let id = users.decode_key(&encoded).unwrap();
    assert_eq!(users.get::<User>(&id).unwrap(), User::new("alice", 31));
}

#[test]
fn test_ids_stay_fresh_after_reopen() {
    common::init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = FileConfig::builder()
        .path(dir.path().join("store"))
        .flush_every_ms(None)
        .build();

    let first = {
        let conn = SledConnection::new(SledContext::open(&config).unwrap());
        let id = conn.storage("users").put(&User::new("a", 1)).unwrap();
        conn.context().flush().unwrap();
        id
    };

    let conn = SledConnection::new(SledContext::open(&config).unwrap());
    let second = conn.storage("users").put(&User::new("b", 2)).unwrap();
    assert_ne!(first, second);
    assert_eq!(conn.storage("users").new_query().count().unwrap(), 2);
}

#[test]
fn test_namespace_from_config() {
    common::init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = FileConfig::builder()
        .path(dir.path().join("store"))
        .namespace("tenant")
        .build();

    let conn = SledConnection::new(SledContext::open(&config).unwrap());
    let id = conn.storage("users").put(&User::new("a", 1)).unwrap();
    assert_eq!(id.namespace(), "tenant");
}
