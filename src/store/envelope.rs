//! Value envelope carrying emulated TTL metadata.
//!
//! A value without expiry metadata is stored as the bare payload. A value
//! with expiry metadata is stored as a JSON record with the fields `v`
//! (payload bytes), `ts` (epoch seconds at write time) and `s` (TTL in
//! seconds at write time).

use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// A stored value, optionally wrapped with expiry metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// Plain payload with no TTL metadata.
    Bare(Vec<u8>),
    /// Payload written by `expire`.
    Wrapped {
        value: Vec<u8>,
        stored_at: i64,
        ttl_seconds: i64,
    },
}

#[derive(Serialize, Deserialize)]
struct WrappedRecord {
    v: Vec<u8>,
    ts: i64,
    s: i64,
}

impl Envelope {
    /// Build a wrapped envelope.
    pub fn wrap(value: Vec<u8>, stored_at: i64, ttl_seconds: i64) -> Self {
        Envelope::Wrapped {
            value,
            stored_at,
            ttl_seconds,
        }
    }

    /// Parse raw stored bytes.
    ///
    /// Never fails: anything that is not a complete `{v, ts, s}` record is
    /// returned as [`Envelope::Bare`] holding `raw` unchanged.
    pub fn decode(raw: Vec<u8>) -> Self {
        match serde_json::from_slice::<WrappedRecord>(&raw) {
            Ok(record) => Envelope::Wrapped {
                value: record.v,
                stored_at: record.ts,
                ttl_seconds: record.s,
            },
            Err(_) => Envelope::Bare(raw),
        }
    }

    /// Serialize to the bytes handed to the backend.
    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        match self {
            Envelope::Bare(value) => Ok(value.clone()),
            Envelope::Wrapped {
                value,
                stored_at,
                ttl_seconds,
            } => {
                let record = WrappedRecord {
                    v: value.clone(),
                    ts: *stored_at,
                    s: *ttl_seconds,
                };
                serde_json::to_vec(&record).map_err(|e| StoreError::Serialization(e.to_string()))
            }
        }
    }

    pub fn has_expiry(&self) -> bool {
        matches!(self, Envelope::Wrapped { .. })
    }

    pub fn into_value(self) -> Vec<u8> {
        match self {
            Envelope::Bare(value) | Envelope::Wrapped { value, .. } => value,
        }
    }

    /// Seconds left at `now`, or `None` for a bare value.
    ///
    /// The result is negative once the emulated TTL has elapsed but the
    /// backend has not evicted the key yet.
    pub fn remaining_ttl(&self, now: i64) -> Option<i64> {
        match self {
            Envelope::Bare(_) => None,
            Envelope::Wrapped {
                stored_at,
                ttl_seconds,
                ..
            } => Some(stored_at.saturating_add(*ttl_seconds).saturating_sub(now)),
        }
    }
}
