//! Records kept in the session store
//!
//! These are produced and consumed by the protocol layer; this crate stores
//! them as they are and never looks inside payloads.
//!
//! Notes on fields:
//! - `internal_id`: broker-assigned id of a message body, distinct from the
//!   16-bit id a client sees
//! - `client_message_id`: the packet id used with one particular client
//! - timestamps are milliseconds since UNIX epoch

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::persistence::Record;

/// Where a flying message is in its delivery handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlyingStatus {
    /// Not yet sent to the client.
    PendingPublish,
    /// Sent, waiting for the client to acknowledge.
    PendingAck,
}

/// A message handed to a client and not acknowledged yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlyingMessage {
    pub client_message_id: u16,
    pub internal_id: u64,
    pub qos: u8,
    pub status: FlyingStatus,
    pub retries: u8,
    pub last_updated: i64,
}

/// All flying messages of one client, keyed by client message id.
pub type FlyingMessages = BTreeMap<u16, FlyingMessage>;

/// A published message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MqttMessage {
    pub internal_id: u64,
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: u8,
    pub retain: bool,
    pub sender_client_id: String,
    pub published_at: i64,
}

/// Topic-to-body indirection for a retained message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetainedPointer {
    pub internal_id: u64,
}

/// Subscription marker of one client: topic filter to granted QoS.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSubscriptions {
    pub client_id: String,
    pub topics: BTreeMap<String, u8>,
}

impl Record for FlyingMessages {
    const KIND: &'static str = "flying-msgs";
}

impl Record for MqttMessage {
    const KIND: &'static str = "mqtt-msg";
}

impl Record for RetainedPointer {
    const KIND: &'static str = "retained-ptr";
}

impl Record for ClientSubscriptions {
    const KIND: &'static str = "client-subs";
}
