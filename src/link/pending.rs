//! Correlation state for request/response transports.
//!
//! The WebSocket and MQTT links are message-oriented: a command goes
//! out with an `id`, and some later inbound message carries the same
//! `id`. [`PendingRequests`] owns that correlation map — register a
//! request before sending, complete it when the response arrives, fail
//! everything when the connection drops.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, oneshot};

/// In-flight request map keyed by correlation id.
///
/// Ids are the decimal rendering of a monotonically increasing counter,
/// which makes "oldest pending" well defined for firmware responses
/// that omit the id.
#[derive(Debug, Default)]
pub struct PendingRequests {
    next_id: AtomicU64,
    waiting: Mutex<HashMap<String, oneshot::Sender<String>>>,
}

impl PendingRequests {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh id and registers a waiter for it.
    pub async fn register(&self) -> (String, oneshot::Receiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let id = id.to_string();
        let (tx, rx) = oneshot::channel();
        self.waiting.lock().await.insert(id.clone(), tx);
        (id, rx)
    }

    /// Completes the request with the given id.
    ///
    /// Returns `false` when no such request is pending (late or
    /// duplicate response).
    pub async fn complete(&self, id: &str, payload: String) -> bool {
        let sender = self.waiting.lock().await.remove(id);
        match sender {
            Some(tx) => tx.send(payload).is_ok(),
            None => false,
        }
    }

    /// Completes the oldest pending request, for responses that carry
    /// no id. Returns the id that was completed, if any.
    pub async fn complete_oldest(&self, payload: String) -> Option<String> {
        let mut waiting = self.waiting.lock().await;
        let oldest = waiting
            .keys()
            .filter_map(|k| k.parse::<u64>().ok())
            .min()?
            .to_string();
        let tx = waiting.remove(&oldest)?;
        drop(waiting);
        let _ = tx.send(payload);
        Some(oldest)
    }

    /// Drops the waiter for the given id (request abandoned, e.g. on
    /// timeout).
    pub async fn remove(&self, id: &str) {
        self.waiting.lock().await.remove(id);
    }

    /// Drops every waiter. Their receivers resolve with an error.
    pub async fn fail_all(&self) {
        self.waiting.lock().await.clear();
    }

    /// Returns the number of requests still waiting.
    pub async fn len(&self) -> usize {
        self.waiting.lock().await.len()
    }

    /// Returns `true` when nothing is waiting.
    pub async fn is_empty(&self) -> bool {
        self.waiting.lock().await.is_empty()
    }
}

/// Extracts the correlation id from a parsed device response.
///
/// The firmware sometimes renders the id as a JSON number instead of a
/// string; both forms are accepted.
#[must_use]
pub fn correlation_id(value: &serde_json::Value) -> Option<String> {
    match value.get("id") {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ids_are_sequential() {
        let pending = PendingRequests::new();
        let (id1, _rx1) = pending.register().await;
        let (id2, _rx2) = pending.register().await;
        assert_eq!(id1, "1");
        assert_eq!(id2, "2");
    }

    #[tokio::test]
    async fn complete_routes_to_the_right_waiter() {
        let pending = PendingRequests::new();
        let (id1, rx1) = pending.register().await;
        let (_id2, _rx2) = pending.register().await;

        assert!(pending.complete(&id1, "payload-1".to_string()).await);
        assert_eq!(rx1.await.ok().as_deref(), Some("payload-1"));
        assert_eq!(pending.len().await, 1);
    }

    #[tokio::test]
    async fn complete_unknown_id_is_a_noop() {
        let pending = PendingRequests::new();
        assert!(!pending.complete("99", "late".to_string()).await);
    }

    #[tokio::test]
    async fn complete_oldest_picks_the_lowest_id() {
        let pending = PendingRequests::new();
        let (_id1, rx1) = pending.register().await;
        let (_id2, _rx2) = pending.register().await;

        let completed = pending.complete_oldest("anon".to_string()).await;
        assert_eq!(completed.as_deref(), Some("1"));
        assert_eq!(rx1.await.ok().as_deref(), Some("anon"));
    }

    #[tokio::test]
    async fn complete_oldest_on_empty_returns_none() {
        let pending = PendingRequests::new();
        assert!(pending.complete_oldest("anon".to_string()).await.is_none());
    }

    #[tokio::test]
    async fn fail_all_wakes_every_waiter_with_error() {
        let pending = PendingRequests::new();
        let (_id1, rx1) = pending.register().await;
        let (_id2, rx2) = pending.register().await;

        pending.fail_all().await;
        assert!(pending.is_empty().await);
        assert!(rx1.await.is_err());
        assert!(rx2.await.is_err());
    }

    #[tokio::test]
    async fn remove_abandons_a_request() {
        let pending = PendingRequests::new();
        let (id, rx) = pending.register().await;
        pending.remove(&id).await;
        assert!(rx.await.is_err());
        // A response for it afterwards finds nothing.
        assert!(!pending.complete(&id, "late".to_string()).await);
    }

    #[test]
    fn correlation_id_accepts_string_and_number() {
        let as_string = serde_json::json!({"id": "12", "status": "ok"});
        assert_eq!(correlation_id(&as_string).as_deref(), Some("12"));

        let as_number = serde_json::json!({"id": 12, "status": "ok"});
        assert_eq!(correlation_id(&as_number).as_deref(), Some("12"));

        let missing = serde_json::json!({"status": "ok"});
        assert!(correlation_id(&missing).is_none());
    }
}
