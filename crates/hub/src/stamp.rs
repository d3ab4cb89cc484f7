//! Envelope stamping
//!
//! The stamper merges a `_meta` block into every accepted publish body:
//! a time-ordered id, timestamps, the origin node, the channel and an
//! HMAC-SHA256 signature. The signature covers the serialized envelope
//! with `hmac` itself absent; serde_json's sorted object keys make that
//! serialization canonical on both the signing and verifying side.
//!
//! Payloads that already carry `_meta` are forwarded copies and are
//! never re-stamped (the caller checks before stamping).

use std::collections::HashMap;
use std::sync::Mutex;

use base64::prelude::*;
use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha256;
use uuid::timestamp::context::ContextV7;
use uuid::{Timestamp, Uuid};

use loghud_model::meta;

use crate::error::{HubError, Result};

type HmacSha256 = Hmac<Sha256>;

/// The key version stamped into new envelopes
const CURRENT_KEY_VERSION: u64 = 1;

/// Stamps publish bodies into signed envelopes
pub struct Stamper {
    node_id: String,
    /// Key table selected by `keyVersion`; only version 1 exists today
    keys: HashMap<u64, Vec<u8>>,
    /// Monotonic clock sequence so ids stay ordered under clock skew
    clock: Mutex<ContextV7>,
}

impl Stamper {
    /// Create a stamper for this node with the shared cluster key
    pub fn new(node_id: impl Into<String>, cluster_key: Vec<u8>) -> Self {
        let mut keys = HashMap::new();
        keys.insert(CURRENT_KEY_VERSION, cluster_key);
        Self {
            node_id: node_id.into(),
            keys,
            clock: Mutex::new(ContextV7::new()),
        }
    }

    /// The node identity written into `originNodeId`
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Stamp a payload object into a signed envelope
    ///
    /// The payload's own keys are carried unchanged; `_meta` is added
    /// last. The HMAC is computed over the envelope serialized without
    /// `hmac`, then the field is filled in and the envelope serialized
    /// again.
    pub fn stamp(&self, channel: &str, mut payload: Map<String, Value>) -> Result<Bytes> {
        let now = Utc::now();
        let id = Uuid::new_v7(Timestamp::from_unix(
            &*self.clock.lock().unwrap(),
            now.timestamp() as u64,
            now.timestamp_subsec_nanos(),
        ));

        let mut block = Map::new();
        block.insert(meta::ID.into(), Value::String(id.to_string()));
        block.insert(
            meta::TS.into(),
            Value::String(now.to_rfc3339_opts(SecondsFormat::Nanos, true)),
        );
        block.insert(
            meta::UNIX_NS.into(),
            Value::from(now.timestamp_nanos_opt().unwrap_or_default()),
        );
        block.insert(meta::ORIGIN_NODE_ID.into(), Value::String(self.node_id.clone()));
        block.insert(meta::CHANNEL.into(), Value::String(channel.to_string()));
        block.insert(meta::KEY_VERSION.into(), Value::from(CURRENT_KEY_VERSION));

        payload.insert(meta::META_KEY.into(), Value::Object(block.clone()));
        let unsigned = serde_json::to_vec(&payload)?;

        let signature = self.sign(CURRENT_KEY_VERSION, &unsigned)?;
        block.insert(meta::HMAC.into(), Value::String(signature));
        payload.insert(meta::META_KEY.into(), Value::Object(block));

        Ok(Bytes::from(serde_json::to_vec(&payload)?))
    }

    /// Verify an envelope's HMAC against the key its `keyVersion` names
    ///
    /// # Errors
    ///
    /// Fails when the envelope is not a JSON object, lacks a usable
    /// `_meta` block, or names an unknown key version.
    pub fn verify(&self, envelope: &[u8]) -> Result<bool> {
        let mut payload: Map<String, Value> = serde_json::from_slice(envelope)?;

        let block = payload
            .get_mut(meta::META_KEY)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| HubError::Envelope("missing _meta".into()))?;

        let claimed = match block.remove(meta::HMAC) {
            Some(Value::String(mac)) => mac,
            _ => return Err(HubError::Envelope("missing _meta.hmac".into())),
        };
        let version = block
            .get(meta::KEY_VERSION)
            .and_then(Value::as_u64)
            .ok_or_else(|| HubError::Envelope("missing _meta.keyVersion".into()))?;

        let unsigned = serde_json::to_vec(&payload)?;
        let expected = self.sign(version, &unsigned)?;
        Ok(expected == claimed)
    }

    /// HMAC-SHA256 the serialized envelope with the versioned key
    fn sign(&self, version: u64, unsigned: &[u8]) -> Result<String> {
        let key = self
            .keys
            .get(&version)
            .ok_or_else(|| HubError::Envelope(format!("unknown key version {version}")))?;

        let mut mac = HmacSha256::new_from_slice(key)
            .map_err(|e| HubError::Envelope(e.to_string()))?;
        mac.update(unsigned);
        Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
    }
}

#[cfg(test)]
#[path = "stamp_test.rs"]
mod tests;
