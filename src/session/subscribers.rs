//! Subscriber registry
//!
//! One marker key per subscribed client. `list_subscription_keys` hands the
//! raw keys to the protocol layer, which owns their interpretation.

use std::sync::Arc;

use tracing::debug;

use crate::persistence::{Connection, KeySpace, decode, encode};
use crate::session::message::ClientSubscriptions;
use crate::utils::Result;

#[derive(Debug, Clone)]
pub struct SubscriberRegistry {
    conn: Arc<Connection>,
    keys: KeySpace,
}

impl SubscriberRegistry {
    pub fn new(conn: Arc<Connection>, keys: KeySpace) -> Self {
        Self { conn, keys }
    }

    /// Every key in the subscription namespace, unparsed.
    pub fn list_subscription_keys(&self) -> Result<Vec<String>> {
        self.conn.keys(&self.keys.subscriptions_pattern())
    }

    /// Client ids that have a subscription marker.
    pub fn subscribed_clients(&self) -> Result<Vec<String>> {
        let keys = self.list_subscription_keys()?;
        Ok(keys
            .iter()
            .filter_map(|key| self.keys.subscription_client(key))
            .map(str::to_string)
            .collect())
    }

    pub fn store_subscriptions(
        &self,
        client_id: &str,
        subscriptions: &ClientSubscriptions,
    ) -> Result<()> {
        self.conn
            .set(&self.keys.subscriptions(client_id), &encode(subscriptions)?)?;
        debug!(client_id, topics = subscriptions.topics.len(), "subscriptions stored");
        Ok(())
    }

    pub fn load_subscriptions(&self, client_id: &str) -> Result<Option<ClientSubscriptions>> {
        self.conn
            .get(&self.keys.subscriptions(client_id))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    pub fn remove_subscriptions(&self, client_id: &str) -> Result<bool> {
        self.conn.delete(&self.keys.subscriptions(client_id))
    }
}
