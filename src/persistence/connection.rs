//! Store connection backed by `sled`
//!
//! `Connection` owns the single handle to the key-value store and exposes
//! the primitive commands the session stores are built from: `set`, `get`,
//! `delete`, `expire`, `keys` and `compare_and_swap`.
//!
//! Every primitive takes the connection guard for exactly one round-trip.
//! The guard linearizes primitives but gives no atomicity across several of
//! them; composite updates must go through `compare_and_swap`.
//!
//! TTLs follow Redis semantics. Deadlines live in a separate tree and expired
//! keys are reclaimed lazily when a primitive touches them.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use sled::{Db, Tree};
use tracing::{debug, info, warn};

use crate::config::StoreSettings;
use crate::persistence::keys::{glob_match, literal_prefix};
use crate::utils::{Result, StoreError};

const EXPIRY_TREE: &str = "__expiry";

/// Outcome of a `compare_and_swap` round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Swap {
    Done,
    /// The key no longer held the expected value; carries what it holds now.
    Conflict(Option<Vec<u8>>),
}

pub struct Connection {
    db: Db,
    expiry: Tree,
    guard: Mutex<()>,
}

impl Connection {
    /// Open or create the store described by `settings`.
    pub fn open(settings: &StoreSettings) -> Result<Self> {
        let connection_err = |source: sled::Error| StoreError::Connection {
            path: settings.path.clone(),
            source,
        };

        let db = sled::Config::new()
            .path(&settings.path)
            .flush_every_ms(Some(settings.flush_every_ms))
            .open()
            .map_err(connection_err)?;
        let expiry = db.open_tree(EXPIRY_TREE).map_err(connection_err)?;

        info!(path = %settings.path, "store connection opened");
        Ok(Self {
            db,
            expiry,
            guard: Mutex::new(()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // the guard protects no data, so a poisoned lock is still usable
        self.guard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let _guard = self.lock();
        debug!(key, len = value.len(), "SET");

        self.db
            .insert(key, value)
            .map_err(|e| StoreError::command("SET", key, e))?;
        // SET discards any previous TTL
        self.expiry
            .remove(key)
            .map_err(|e| StoreError::command("SET", key, e))?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let _guard = self.lock();
        debug!(key, "GET");

        if self.reap_if_expired(key)? {
            return Ok(None);
        }
        let value = self
            .db
            .get(key)
            .map_err(|e| StoreError::command("GET", key, e))?;
        Ok(value.map(|v| v.to_vec()))
    }

    /// Remove `key`. Returns whether it existed.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let _guard = self.lock();
        debug!(key, "DEL");

        if self.reap_if_expired(key)? {
            return Ok(false);
        }
        let removed = self
            .db
            .remove(key)
            .map_err(|e| StoreError::command("DEL", key, e))?;
        self.expiry
            .remove(key)
            .map_err(|e| StoreError::command("DEL", key, e))?;
        Ok(removed.is_some())
    }

    /// Give `key` a time-to-live. Returns false when the key does not exist.
    /// A TTL of zero deletes the key right away.
    pub fn expire(&self, key: &str, seconds: u64) -> Result<bool> {
        let _guard = self.lock();
        debug!(key, seconds, "EXPIRE");

        if self.reap_if_expired(key)? {
            return Ok(false);
        }
        let exists = self
            .db
            .contains_key(key)
            .map_err(|e| StoreError::command("EXPIRE", key, e))?;
        if !exists {
            return Ok(false);
        }

        if seconds == 0 {
            self.purge(key, "EXPIRE")?;
            return Ok(true);
        }

        let ttl_ms = i64::try_from(seconds.saturating_mul(1000)).unwrap_or(i64::MAX);
        let deadline = Utc::now().timestamp_millis().saturating_add(ttl_ms);
        self.expiry
            .insert(key, deadline.to_be_bytes().to_vec())
            .map_err(|e| StoreError::command("EXPIRE", key, e))?;
        Ok(true)
    }

    /// List live keys matching a glob `pattern` (`*`, `?`, `\` escapes).
    pub fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let _guard = self.lock();
        debug!(pattern, "KEYS");

        let mut matched = Vec::new();
        for entry in self.db.scan_prefix(literal_prefix(pattern)) {
            let (raw_key, _) = entry.map_err(|e| StoreError::command("KEYS", pattern, e))?;
            let Ok(key) = String::from_utf8(raw_key.to_vec()) else {
                continue;
            };
            if glob_match(pattern, &key) {
                matched.push(key);
            }
        }

        let mut live = Vec::with_capacity(matched.len());
        for key in matched {
            if !self.reap_if_expired(&key)? {
                live.push(key);
            }
        }
        Ok(live)
    }

    /// Atomically replace the value of `key` if it still equals `expected`.
    ///
    /// `None` stands for an absent key on either side, so this also covers
    /// create-if-absent and delete-if-unchanged. A successful swap discards
    /// any TTL on the key, like `set`.
    pub fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Option<Vec<u8>>,
    ) -> Result<Swap> {
        let _guard = self.lock();
        debug!(key, "CAS");

        self.reap_if_expired(key)?;
        let outcome = self
            .db
            .compare_and_swap(key, expected, new)
            .map_err(|e| StoreError::command("CAS", key, e))?;

        match outcome {
            Ok(()) => {
                self.expiry
                    .remove(key)
                    .map_err(|e| StoreError::command("CAS", key, e))?;
                Ok(Swap::Done)
            }
            Err(conflict) => Ok(Swap::Conflict(conflict.current.map(|v| v.to_vec()))),
        }
    }

    /// Block until all pending writes are on disk.
    pub fn flush(&self) -> Result<()> {
        let _guard = self.lock();
        self.db
            .flush()
            .map_err(|e| StoreError::command("FLUSH", "*", e))?;
        Ok(())
    }

    /// Drop `key` if its deadline has passed. Caller holds the guard.
    fn reap_if_expired(&self, key: &str) -> Result<bool> {
        let deadline = self
            .expiry
            .get(key)
            .map_err(|e| StoreError::command("TTL", key, e))?;
        let Some(raw) = deadline else {
            return Ok(false);
        };

        let expired = match <[u8; 8]>::try_from(&raw[..]) {
            Ok(bytes) => i64::from_be_bytes(bytes) <= Utc::now().timestamp_millis(),
            // unreadable deadline, treat as already passed
            Err(_) => true,
        };
        if expired {
            debug!(key, "reaping expired key");
            self.purge(key, "TTL")?;
        }
        Ok(expired)
    }

    fn purge(&self, key: &str, command: &'static str) -> Result<()> {
        self.db
            .remove(key)
            .map_err(|e| StoreError::command(command, key, e))?;
        self.expiry
            .remove(key)
            .map_err(|e| StoreError::command(command, key, e))?;
        Ok(())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("db", &"sled::Db")
            .finish()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Err(e) = self.db.flush() {
            warn!("failed to flush store on close: {e}");
        }
    }
}
