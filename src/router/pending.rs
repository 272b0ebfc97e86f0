//! Pending-call correlation registry
//!
//! Every CS-originated Call is recorded here until its CallResult/CallError
//! arrives or the entry expires. Entries are keyed by
//! `(chargeStationId, messageId)`, which must be unique while pending.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;
use tracing::warn;

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// An outbound Call awaiting its response.
#[derive(Debug, Clone)]
pub struct PendingCall {
    pub message_id: String,
    pub charge_station_id: String,
    pub action: String,
    /// The original typed request, kept as JSON for re-decoding on
    /// correlation.
    pub request: Value,
    /// Handler-selected state passed through to the result handler.
    pub state: Option<Value>,
    pub timeout_at: Instant,
}

pub struct PendingCallRegistry {
    entries: DashMap<(String, String), PendingCall>,
    default_timeout: Duration,
}

impl PendingCallRegistry {
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_timeout,
        }
    }

    /// Record a pending call with the default timeout.
    pub fn insert(
        &self,
        charge_station_id: &str,
        message_id: &str,
        action: &str,
        request: Value,
        state: Option<Value>,
    ) {
        let key = (charge_station_id.to_string(), message_id.to_string());
        let previous = self.entries.insert(
            key,
            PendingCall {
                message_id: message_id.to_string(),
                charge_station_id: charge_station_id.to_string(),
                action: action.to_string(),
                request,
                state,
                timeout_at: Instant::now() + self.default_timeout,
            },
        );
        if let Some(previous) = previous {
            // Message ids are random UUIDs; a collision means a caller bug.
            warn!(
                charge_station_id,
                message_id,
                action = previous.action.as_str(),
                "replaced pending call with duplicate message id"
            );
        }
    }

    /// Consume the pending entry matching a response.
    pub fn remove(&self, charge_station_id: &str, message_id: &str) -> Option<PendingCall> {
        self.entries
            .remove(&(charge_station_id.to_string(), message_id.to_string()))
            .map(|(_, v)| v)
    }

    /// Drop every pending call for a station (connection went away).
    pub fn remove_for_station(&self, charge_station_id: &str) -> Vec<PendingCall> {
        let keys: Vec<_> = self
            .entries
            .iter()
            .filter(|e| e.key().0 == charge_station_id)
            .map(|e| e.key().clone())
            .collect();
        keys.iter()
            .filter_map(|k| self.entries.remove(k).map(|(_, v)| v))
            .collect()
    }

    /// Evict and return every entry past its deadline.
    pub fn take_expired(&self) -> Vec<PendingCall> {
        let now = Instant::now();
        let keys: Vec<_> = self
            .entries
            .iter()
            .filter(|e| e.value().timeout_at <= now)
            .map(|e| e.key().clone())
            .collect();
        keys.iter()
            .filter_map(|k| self.entries.remove(k).map(|(_, v)| v))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PendingCallRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CALL_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_and_remove_roundtrip() {
        let registry = PendingCallRegistry::default();
        registry.insert("cs001", "msg-1", "Reset", json!({"type": "Soft"}), None);
        assert_eq!(registry.len(), 1);

        let entry = registry.remove("cs001", "msg-1").unwrap();
        assert_eq!(entry.action, "Reset");
        assert!(registry.is_empty());
        assert!(registry.remove("cs001", "msg-1").is_none());
    }

    #[test]
    fn entries_are_scoped_per_station() {
        let registry = PendingCallRegistry::default();
        registry.insert("cs001", "msg-1", "Reset", json!({}), None);
        assert!(registry.remove("cs002", "msg-1").is_none());
        assert!(registry.remove("cs001", "msg-1").is_some());
    }

    #[test]
    fn remove_for_station_drops_only_that_station() {
        let registry = PendingCallRegistry::default();
        registry.insert("cs001", "msg-1", "Reset", json!({}), None);
        registry.insert("cs001", "msg-2", "ClearCache", json!({}), None);
        registry.insert("cs002", "msg-3", "Reset", json!({}), None);

        let dropped = registry.remove_for_station("cs001");
        assert_eq!(dropped.len(), 2);
        assert_eq!(registry.len(), 1);
        assert!(registry.remove("cs002", "msg-3").is_some());
    }

    #[test]
    fn take_expired_evicts_past_deadline_only() {
        let registry = PendingCallRegistry::new(Duration::from_secs(0));
        registry.insert("cs001", "msg-1", "Reset", json!({}), None);

        let fresh = PendingCallRegistry::new(Duration::from_secs(3600));
        fresh.insert("cs001", "msg-2", "Reset", json!({}), None);

        let expired = registry.take_expired();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].message_id, "msg-1");
        assert!(registry.is_empty());

        assert!(fresh.take_expired().is_empty());
        assert_eq!(fresh.len(), 1);
    }
}
