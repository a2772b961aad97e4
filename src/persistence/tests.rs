use std::collections::BTreeMap;
use std::thread::sleep;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tempfile::{TempDir, tempdir};

use super::keys::{escape_glob, glob_match, literal_prefix};
use super::{Connection, KeySpace, Record, Swap, decode, encode};
use crate::config::StoreSettings;
use crate::utils::StoreError;

// field order matters: the connection must close before the dir goes away
struct TestConnection {
    conn: Connection,
    _dir: TempDir,
}

fn settings_for(dir: &TempDir) -> StoreSettings {
    StoreSettings {
        path: dir.path().join("db").to_str().unwrap().to_string(),
        ..StoreSettings::default()
    }
}

fn create_test_connection() -> TestConnection {
    let dir = tempdir().unwrap();
    let conn = Connection::open(&settings_for(&dir)).unwrap();
    TestConnection { conn, _dir: dir }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Probe {
    id: u64,
    label: String,
    parts: BTreeMap<u16, Vec<u8>>,
}

impl Record for Probe {
    const KIND: &'static str = "probe";
}

#[derive(Debug, Serialize, Deserialize)]
struct OtherProbe {
    id: u64,
}

impl Record for OtherProbe {
    const KIND: &'static str = "other-probe";
}

#[test]
fn test_set_get_delete() {
    let t = create_test_connection();

    t.conn.set("gossipd.k", b"value").unwrap();
    assert_eq!(t.conn.get("gossipd.k").unwrap(), Some(b"value".to_vec()));

    assert!(t.conn.delete("gossipd.k").unwrap());
    assert_eq!(t.conn.get("gossipd.k").unwrap(), None);
}

#[test]
fn test_missing_key_is_not_an_error() {
    let t = create_test_connection();
    assert_eq!(t.conn.get("nope").unwrap(), None);
    assert!(!t.conn.delete("nope").unwrap());
}

#[test]
fn test_expire_missing_key_returns_false() {
    let t = create_test_connection();
    assert!(!t.conn.expire("nope", 10).unwrap());
}

#[test]
fn test_expired_key_disappears() {
    let t = create_test_connection();
    t.conn.set("gossipd.ttl.a", b"a").unwrap();
    t.conn.set("gossipd.ttl.b", b"b").unwrap();

    assert!(t.conn.expire("gossipd.ttl.a", 1).unwrap());
    assert!(t.conn.get("gossipd.ttl.a").unwrap().is_some());

    sleep(Duration::from_millis(1200)); // wait so the TTL passes

    assert_eq!(t.conn.get("gossipd.ttl.a").unwrap(), None);
    assert_eq!(t.conn.keys("gossipd.ttl.*").unwrap(), vec!["gossipd.ttl.b"]);
}

#[test]
fn test_set_discards_ttl() {
    let t = create_test_connection();
    t.conn.set("k", b"1").unwrap();
    t.conn.expire("k", 1).unwrap();
    t.conn.set("k", b"2").unwrap();

    sleep(Duration::from_millis(1200));

    assert_eq!(t.conn.get("k").unwrap(), Some(b"2".to_vec()));
}

#[test]
fn test_compare_and_swap_discards_ttl() {
    let t = create_test_connection();
    t.conn.set("k", b"1").unwrap();
    t.conn.expire("k", 1).unwrap();
    assert_eq!(
        t.conn
            .compare_and_swap("k", Some(b"1".as_slice()), Some(b"2".to_vec()))
            .unwrap(),
        Swap::Done
    );

    sleep(Duration::from_millis(1200));

    assert_eq!(t.conn.get("k").unwrap(), Some(b"2".to_vec()));
}

#[test]
fn test_expire_zero_deletes_immediately() {
    let t = create_test_connection();
    t.conn.set("k", b"1").unwrap();
    assert!(t.conn.expire("k", 0).unwrap());
    assert_eq!(t.conn.get("k").unwrap(), None);
}

#[test]
fn test_keys_matches_pattern_only() {
    let t = create_test_connection();
    for key in ["a.x.1", "a.x.2", "a.y.1", "b.x.1", "a.x"] {
        t.conn.set(key, b"v").unwrap();
    }

    assert_eq!(t.conn.keys("a.x.*").unwrap(), vec!["a.x.1", "a.x.2"]);
    assert_eq!(t.conn.keys("*.x.1").unwrap(), vec!["a.x.1", "b.x.1"]);
    assert_eq!(t.conn.keys("a.?.1").unwrap(), vec!["a.x.1", "a.y.1"]);
    assert!(t.conn.keys("c.*").unwrap().is_empty());
}

#[test]
fn test_compare_and_swap() {
    let t = create_test_connection();

    // create if absent
    assert_eq!(
        t.conn.compare_and_swap("k", None, Some(b"1".to_vec())).unwrap(),
        Swap::Done
    );
    // stale expectation reports the current value
    assert_eq!(
        t.conn.compare_and_swap("k", None, Some(b"2".to_vec())).unwrap(),
        Swap::Conflict(Some(b"1".to_vec()))
    );
    assert_eq!(
        t.conn
            .compare_and_swap("k", Some(b"1".as_slice()), Some(b"2".to_vec()))
            .unwrap(),
        Swap::Done
    );
    // delete if unchanged
    assert_eq!(
        t.conn.compare_and_swap("k", Some(b"2".as_slice()), None).unwrap(),
        Swap::Done
    );
    assert_eq!(t.conn.get("k").unwrap(), None);
}

#[test]
fn test_data_survives_reopen() {
    let dir = tempdir().unwrap();
    let settings = settings_for(&dir);
    {
        let conn = Connection::open(&settings).unwrap();
        conn.set("durable", b"yes").unwrap();
        conn.flush().unwrap();
    }

    let conn = Connection::open(&settings).unwrap();
    assert_eq!(conn.get("durable").unwrap(), Some(b"yes".to_vec()));
}

#[test]
fn test_open_fails_on_unusable_path() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("not-a-dir");
    std::fs::write(&file, b"plain file").unwrap();

    let settings = StoreSettings {
        path: file.join("db").to_str().unwrap().to_string(),
        ..StoreSettings::default()
    };
    let err = Connection::open(&settings).unwrap_err();
    assert!(matches!(err, StoreError::Connection { .. }));
}

#[test]
fn test_record_roundtrip() {
    let probe = Probe {
        id: 7,
        label: "sensors/temp".into(),
        parts: BTreeMap::from([(1, vec![0, 255]), (65535, vec![])]),
    };

    let bytes = encode(&probe).unwrap();
    assert_eq!(decode::<Probe>(&bytes).unwrap(), probe);
}

#[test]
fn test_decode_wrong_kind_is_schema_mismatch() {
    let bytes = encode(&OtherProbe { id: 1 }).unwrap();

    let err = decode::<Probe>(&bytes).unwrap_err();
    assert!(err.is_serialization());
    match err {
        StoreError::KindMismatch { expected, found } => {
            assert_eq!(expected, "probe");
            assert_eq!(found, "other-probe");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_decode_garbage_is_recoverable() {
    let err = decode::<Probe>(b"\x00\x01 definitely not json").unwrap_err();
    assert!(matches!(err, StoreError::Serialization { op: "decode", .. }));
}

#[test]
fn test_glob_match() {
    assert!(glob_match("*", ""));
    assert!(glob_match("gossipd.client-subs.*", "gossipd.client-subs.c1"));
    assert!(!glob_match("gossipd.client-subs.*", "gossipd.client-msg.c1"));
    assert!(glob_match("a*b*c", "aXXbYYc"));
    assert!(!glob_match("a*b*c", "aXXbYY"));
    assert!(glob_match("h?llo", "hello"));
    assert!(!glob_match("h?llo", "hllo"));
    assert!(glob_match(r"a\*b", "a*b"));
    assert!(!glob_match(r"a\*b", "aXb"));
}

#[test]
fn test_literal_prefix() {
    assert_eq!(literal_prefix("gossipd.client-subs.*"), "gossipd.client-subs.");
    assert_eq!(literal_prefix("plain"), "plain");
    assert_eq!(literal_prefix("*"), "");
    assert_eq!(literal_prefix(r"a\*b"), "a");
}

#[test]
fn test_key_space_layout() {
    let keys = KeySpace::new("gossipd");
    assert_eq!(keys.flying("c1"), "gossipd.client-msg.c1");
    assert_eq!(keys.retained("a/b"), "gossipd.topic-retained.a/b");
    assert_eq!(keys.message(42), "gossipd.mqtt-msg.42");
    assert_eq!(keys.subscriptions("c1"), "gossipd.client-subs.c1");
    assert_eq!(keys.subscriptions_pattern(), "gossipd.client-subs.*");

    assert_eq!(keys.subscription_client("gossipd.client-subs.c1"), Some("c1"));
    assert_eq!(keys.subscription_client("gossipd.client-msg.c1"), None);
    assert_eq!(keys.retained_topic("gossipd.topic-retained.a/b"), Some("a/b"));
}

#[test]
fn test_key_space_escapes_prefix_in_patterns() {
    let keys = KeySpace::new("b*");
    assert_eq!(escape_glob("b*"), r"b\*");
    assert!(glob_match(&keys.subscriptions_pattern(), "b*.client-subs.c1"));
    assert!(!glob_match(&keys.subscriptions_pattern(), "bX.client-subs.c1"));
}
