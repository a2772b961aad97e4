//! Session store facade
//!
//! `SessionStore` wires the flying, retained and subscriber stores to one
//! shared `Connection`. It is cheap to clone; every broker worker keeps its
//! own clone and calls into it from its own thread.

use std::sync::Arc;

use crate::config::StoreSettings;
use crate::persistence::{Connection, KeySpace};
use crate::session::flying::FlyingStore;
use crate::session::retained::RetainedStore;
use crate::session::subscribers::SubscriberRegistry;
use crate::utils::Result;

#[derive(Debug, Clone)]
pub struct SessionStore {
    conn: Arc<Connection>,
    keys: KeySpace,
    flying: FlyingStore,
    retained: RetainedStore,
    subscribers: SubscriberRegistry,
}

impl SessionStore {
    /// Open the backing store. Failing here means the broker cannot run.
    pub fn open(settings: &StoreSettings) -> Result<Self> {
        let conn = Arc::new(Connection::open(settings)?);
        Ok(Self::with_connection(
            conn,
            KeySpace::new(settings.key_prefix.clone()),
            settings.cas_max_retries,
        ))
    }

    pub fn with_connection(conn: Arc<Connection>, keys: KeySpace, cas_max_retries: u32) -> Self {
        Self {
            flying: FlyingStore::new(conn.clone(), keys.clone(), cas_max_retries),
            retained: RetainedStore::new(conn.clone(), keys.clone()),
            subscribers: SubscriberRegistry::new(conn.clone(), keys.clone()),
            conn,
            keys,
        }
    }

    pub fn flying(&self) -> &FlyingStore {
        &self.flying
    }

    pub fn retained(&self) -> &RetainedStore {
        &self.retained
    }

    pub fn subscribers(&self) -> &SubscriberRegistry {
        &self.subscribers
    }

    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Set a time-to-live on `key`. Returns false when the key is absent.
    pub fn expire(&self, key: &str, ttl_seconds: u64) -> Result<bool> {
        self.conn.expire(key, ttl_seconds)
    }

    pub fn flush(&self) -> Result<()> {
        self.conn.flush()
    }
}
