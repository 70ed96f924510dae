//! Registry of in-flight requests.
//!
//! Every request attempt and every stream registers a [`CancellationToken`]
//! under a fresh [`RequestId`] for as long as it runs. Callers can abort one
//! entry with [`RequestRegistry::cancel`] or everything with
//! [`RequestRegistry::cancel_all`] (for example on shutdown).
//!
//! Entries are removed exactly once: either by `cancel`/`cancel_all`, or by
//! the [`RegistryGuard`] held by the running request when it drops.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

/// Opaque identifier of one in-flight request or stream.
///
/// Random and only meant for correlation; not a security token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    fn generate() -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        Self(format!("req_{}", &uuid[..12]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Shared map of in-flight requests. Cloning shares the same map.
#[derive(Debug, Clone, Default)]
pub struct RequestRegistry {
    entries: Arc<DashMap<RequestId, CancellationToken>>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new entry and return its id and cancellation handle.
    ///
    /// The caller owns removal; prefer [`track`](Self::track) which removes
    /// the entry automatically.
    pub fn register(&self) -> (RequestId, CancellationToken) {
        self.insert(CancellationToken::new())
    }

    /// Register an entry whose handle is a child of `parent` (if given) and
    /// return a guard that deregisters it on drop.
    pub fn track(&self, parent: Option<&CancellationToken>) -> RegistryGuard {
        let token = parent
            .map(CancellationToken::child_token)
            .unwrap_or_default();
        let (id, token) = self.insert(token);
        RegistryGuard {
            registry: self.clone(),
            id,
            token,
        }
    }

    fn insert(&self, token: CancellationToken) -> (RequestId, CancellationToken) {
        let id = RequestId::generate();
        self.entries.insert(id.clone(), token.clone());
        (id, token)
    }

    /// Abort and remove one entry. Returns `false` if it was not registered.
    pub fn cancel(&self, id: &RequestId) -> bool {
        match self.entries.remove(id) {
            Some((_, token)) => {
                debug!(request_id = %id, "Cancelling request");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Abort and remove every entry. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        self.entries.retain(|_, token| {
            token.cancel();
            cancelled += 1;
            false
        });
        if cancelled > 0 {
            debug!(count = cancelled, "Cancelled all in-flight requests");
        }
        cancelled
    }

    /// Remove an entry without cancelling it. Returns `false` if absent.
    pub fn deregister(&self, id: &RequestId) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the ids currently in flight.
    pub fn ids(&self) -> Vec<RequestId> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }
}

/// Keeps a registry entry alive for the duration of one request or stream.
#[derive(Debug)]
pub struct RegistryGuard {
    registry: RequestRegistry,
    id: RequestId,
    token: CancellationToken,
}

impl RegistryGuard {
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for RegistryGuard {
    fn drop(&mut self) {
        // No-op when `cancel` already removed the entry.
        self.registry.deregister(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_cancel() {
        let registry = RequestRegistry::new();
        let (id, token) = registry.register();
        assert!(registry.contains(&id));
        assert_eq!(registry.len(), 1);

        assert!(registry.cancel(&id));
        assert!(token.is_cancelled());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_cancel_unknown_is_noop() {
        let registry = RequestRegistry::new();
        assert!(!registry.cancel(&RequestId::from("req_missing")));

        let (id, _) = registry.register();
        assert!(registry.cancel(&id));
        assert!(!registry.cancel(&id));
    }

    #[test]
    fn test_cancel_all_clears() {
        let registry = RequestRegistry::new();
        let tokens: Vec<_> = (0..5).map(|_| registry.register().1).collect();
        assert_eq!(registry.cancel_all(), 5);
        assert_eq!(registry.len(), 0);
        assert!(registry.ids().is_empty());
        assert!(tokens.iter().all(CancellationToken::is_cancelled));
        assert_eq!(registry.cancel_all(), 0);
    }

    #[test]
    fn test_guard_deregisters_on_drop() {
        let registry = RequestRegistry::new();
        let id = {
            let guard = registry.track(None);
            assert!(registry.contains(guard.id()));
            guard.id().clone()
        };
        assert!(!registry.contains(&id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_guard_drop_after_cancel() {
        let registry = RequestRegistry::new();
        let guard = registry.track(None);
        let id = guard.id().clone();
        assert!(registry.cancel(&id));
        assert!(guard.token().is_cancelled());
        drop(guard);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_guard_child_of_parent() {
        let registry = RequestRegistry::new();
        let parent = CancellationToken::new();
        let guard = registry.track(Some(&parent));
        parent.cancel();
        assert!(guard.token().is_cancelled());
    }

    #[test]
    fn test_cancelling_child_leaves_parent() {
        let registry = RequestRegistry::new();
        let parent = CancellationToken::new();
        let guard = registry.track(Some(&parent));
        registry.cancel(guard.id());
        assert!(guard.token().is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn test_ids_unique() {
        let registry = RequestRegistry::new();
        let guards: Vec<_> = (0..100).map(|_| registry.track(None)).collect();
        assert_eq!(registry.len(), guards.len());
        assert!(guards[0].id().as_str().starts_with("req_"));
    }
}
