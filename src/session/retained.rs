//! Retained messages and message bodies
//!
//! A retained message is reached in two hops: the topic key holds a
//! `RetainedPointer` to an internal id, and the body lives under that id.
//! Replacing the retained message of a topic only rewrites the pointer; the
//! superseded body is left for expiry or an external sweeper.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::persistence::{Connection, KeySpace, decode, encode};
use crate::session::message::{MqttMessage, RetainedPointer};
use crate::utils::Result;

/// Message bodies addressed by internal id.
#[derive(Debug, Clone)]
pub struct MessageStore {
    conn: Arc<Connection>,
    keys: KeySpace,
}

impl MessageStore {
    pub fn new(conn: Arc<Connection>, keys: KeySpace) -> Self {
        Self { conn, keys }
    }

    pub fn store_message(&self, message: &MqttMessage) -> Result<()> {
        self.conn
            .set(&self.keys.message(message.internal_id), &encode(message)?)
    }

    pub fn load_message(&self, internal_id: u64) -> Result<Option<MqttMessage>> {
        self.conn
            .get(&self.keys.message(internal_id))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    pub fn delete_message(&self, internal_id: u64) -> Result<bool> {
        self.conn.delete(&self.keys.message(internal_id))
    }
}

#[derive(Debug, Clone)]
pub struct RetainedStore {
    conn: Arc<Connection>,
    keys: KeySpace,
    messages: MessageStore,
}

impl RetainedStore {
    pub fn new(conn: Arc<Connection>, keys: KeySpace) -> Self {
        let messages = MessageStore::new(conn.clone(), keys.clone());
        Self {
            conn,
            keys,
            messages,
        }
    }

    pub fn messages(&self) -> &MessageStore {
        &self.messages
    }

    /// Make `message` the retained message of `topic`.
    ///
    /// The body is written before the pointer, so a reader never follows a
    /// pointer to a body that was not written yet.
    pub fn set_retained(&self, topic: &str, message: &MqttMessage) -> Result<()> {
        self.messages.store_message(message)?;
        let pointer = RetainedPointer {
            internal_id: message.internal_id,
        };
        self.conn.set(&self.keys.retained(topic), &encode(&pointer)?)?;
        debug!(topic, internal_id = message.internal_id, "retained message set");
        Ok(())
    }

    /// The retained message of `topic`, or `None` when there is none.
    pub fn get_retained(&self, topic: &str) -> Result<Option<MqttMessage>> {
        let Some(bytes) = self.conn.get(&self.keys.retained(topic))? else {
            debug!(topic, "no retained message");
            return Ok(None);
        };
        let pointer: RetainedPointer = decode(&bytes)?;

        let message = self.messages.load_message(pointer.internal_id)?;
        if message.is_none() {
            warn!(
                topic,
                internal_id = pointer.internal_id,
                "retained pointer refers to a missing message body"
            );
        }
        Ok(message)
    }

    /// Remove the retained pointer of `topic`. Returns whether one existed.
    pub fn clear_retained(&self, topic: &str) -> Result<bool> {
        self.conn.delete(&self.keys.retained(topic))
    }

    /// Topics that currently have a retained pointer.
    pub fn retained_topics(&self) -> Result<Vec<String>> {
        let keys = self.conn.keys(&self.keys.retained_pattern())?;
        Ok(keys
            .iter()
            .filter_map(|key| self.keys.retained_topic(key))
            .map(str::to_string)
            .collect())
    }
}
