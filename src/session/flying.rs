//! Flying-message store
//!
//! Holds, per client, the map of messages that were sent but not yet
//! acknowledged. The per-client key is the only record of that state: no key
//! means nothing is in flight, so a map that becomes empty is deleted.
//!
//! Single-entry updates (`add_one`, `remove_one`) are read-modify-write
//! sequences. They run as an optimistic loop over `compare_and_swap`: when
//! another worker changed the map in between, the update is replayed on the
//! fresh value. Concurrent updates for the same client therefore never lose
//! each other's entries.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::persistence::{Connection, KeySpace, Swap, decode, encode};
use crate::session::message::{FlyingMessage, FlyingMessages};
use crate::utils::{Result, StoreError};

#[derive(Debug, Clone)]
pub struct FlyingStore {
    conn: Arc<Connection>,
    keys: KeySpace,
    max_retries: u32,
}

impl FlyingStore {
    pub fn new(conn: Arc<Connection>, keys: KeySpace, max_retries: u32) -> Self {
        Self {
            conn,
            keys,
            // at least one attempt is always made
            max_retries: max_retries.max(1),
        }
    }

    /// All flying messages of `client_id`; empty when none are stored.
    pub fn load_all(&self, client_id: &str) -> Result<FlyingMessages> {
        match self.conn.get(&self.keys.flying(client_id))? {
            Some(bytes) => decode(&bytes),
            None => Ok(FlyingMessages::new()),
        }
    }

    pub fn get_one(&self, client_id: &str, message_id: u16) -> Result<Option<FlyingMessage>> {
        let mut messages = self.load_all(client_id)?;
        Ok(messages.remove(&message_id))
    }

    /// Overwrite the whole map of `client_id`.
    pub fn replace_all(&self, client_id: &str, messages: &FlyingMessages) -> Result<()> {
        let key = self.keys.flying(client_id);
        if messages.is_empty() {
            self.conn.delete(&key)?;
        } else {
            self.conn.set(&key, &encode(messages)?)?;
        }
        Ok(())
    }

    /// Forget every flying message of `client_id`, e.g. on a clean session.
    pub fn clear_all(&self, client_id: &str) -> Result<()> {
        if self.conn.delete(&self.keys.flying(client_id))? {
            info!("Cleared flying messages for client {client_id}");
        }
        Ok(())
    }

    /// Insert `message` under its client message id, replacing any entry
    /// with the same id.
    pub fn add_one(&self, client_id: &str, message: FlyingMessage) -> Result<()> {
        let message_id = message.client_message_id;
        self.update(client_id, |messages| {
            messages.insert(message_id, message.clone());
            true
        })?;
        debug!(client_id, message_id, "added flying message");
        Ok(())
    }

    /// Drop one entry, typically once the client acknowledged it. Returns
    /// whether the entry existed.
    pub fn remove_one(&self, client_id: &str, message_id: u16) -> Result<bool> {
        let removed = self.update(client_id, |messages| {
            messages.remove(&message_id).is_some()
        })?;
        if removed {
            debug!(client_id, message_id, "removed flying message");
        }
        Ok(removed)
    }

    /// Apply `change` to the current map and write it back atomically.
    /// `change` returns false when it left the map untouched, in which case
    /// nothing is written.
    fn update<F>(&self, client_id: &str, mut change: F) -> Result<bool>
    where
        F: FnMut(&mut FlyingMessages) -> bool,
    {
        let key = self.keys.flying(client_id);
        let mut current = self.conn.get(&key)?;

        for attempt in 1..=self.max_retries {
            let mut messages = match &current {
                Some(bytes) => decode::<FlyingMessages>(bytes)?,
                None => FlyingMessages::new(),
            };
            if !change(&mut messages) {
                return Ok(false);
            }

            let next = if messages.is_empty() {
                None
            } else {
                Some(encode(&messages)?)
            };
            match self.conn.compare_and_swap(&key, current.as_deref(), next)? {
                Swap::Done => return Ok(true),
                Swap::Conflict(latest) => {
                    debug!(key = %key, attempt, "flying map changed underneath, retrying");
                    current = latest;
                }
            }
        }

        warn!(key = %key, attempts = self.max_retries, "giving up on contended flying map");
        Err(StoreError::Conflict {
            key,
            attempts: self.max_retries,
        })
    }
}
