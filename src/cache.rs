//! Client-held cache of registered resources.
//!
//! Entries are ordered most-recently-created first. A speculative entry is
//! inserted before its create request is issued and is later either replaced
//! in place by the confirmed resource or rolled back. Correlation between a
//! speculative write and its confirmation is carried by an explicit token,
//! never by value equality: two uploads of files with the same name must not
//! collide.

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{Dataset, Thing};

/// Identifies one in-flight speculative write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationToken(Uuid);

impl CorrelationToken {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Inserted ahead of server confirmation, assumed correct optimistically.
    Speculative,
    /// Backed by a server-issued identity.
    Confirmed,
}

/// Anything the cache can hold. The id is the semantic identity: assigned by
/// the remote service for confirmed resources, a local placeholder for
/// speculative ones.
pub trait ResourceRecord {
    fn id(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub resource: T,
    pub provenance: Provenance,
    token: Option<CorrelationToken>,
}

impl<T> CacheEntry<T> {
    pub fn is_speculative(&self) -> bool {
        self.provenance == Provenance::Speculative
    }

    pub fn correlation_token(&self) -> Option<CorrelationToken> {
        self.token
    }
}

/// Recency-ordered cache for one resource kind. Mutated only through the
/// registrar's reconciliation protocol; read freely by presentation code.
///
/// Every mutation takes the lock once and releases it before returning, so
/// each read-then-write reconciliation step is atomic: no task observes a
/// half-updated entry. The lock is never held across an await point.
#[derive(Debug)]
pub struct ResourceCache<T> {
    entries: Mutex<Vec<CacheEntry<T>>>,
}

impl<T> Default for ResourceCache<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<T: ResourceRecord + Clone> ResourceCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a speculative entry at the head and returns the token that
    /// correlates it with its eventual confirmation or rollback.
    pub async fn insert_speculative(&self, resource: T) -> CorrelationToken {
        let token = CorrelationToken::new();
        let mut entries = self.entries.lock().await;
        entries.insert(
            0,
            CacheEntry {
                resource,
                provenance: Provenance::Speculative,
                token: Some(token),
            },
        );
        token
    }

    /// Reconciles a confirmed resource against the speculative write
    /// identified by `token`.
    ///
    /// - If an entry with the confirmed id already exists, it is updated in
    ///   place and the speculative entry (if still present) is discarded, so
    ///   the cache never holds two entries with one confirmed id. This also
    ///   makes duplicate confirmations idempotent.
    /// - Otherwise the speculative entry is replaced in place, preserving
    ///   its position in the sequence.
    /// - If the speculative entry is gone (cache cleared), a fresh confirmed
    ///   entry is inserted at the head.
    pub async fn confirm(&self, token: CorrelationToken, confirmed: T) {
        let mut entries = self.entries.lock().await;

        if let Some(pos) = entries
            .iter()
            .position(|e| e.provenance == Provenance::Confirmed && e.resource.id() == confirmed.id())
        {
            entries[pos].resource = confirmed;
            entries.retain(|e| e.token != Some(token));
            return;
        }

        let entry = CacheEntry {
            resource: confirmed,
            provenance: Provenance::Confirmed,
            token: None,
        };
        match entries.iter().position(|e| e.token == Some(token)) {
            Some(pos) => entries[pos] = entry,
            None => entries.insert(0, entry),
        }
    }

    /// Removes the speculative entry identified by `token`. Returns whether
    /// an entry was removed. Confirmed entries are never rolled back.
    pub async fn rollback(&self, token: CorrelationToken) -> bool {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|e| !(e.is_speculative() && e.token == Some(token)));
        entries.len() < before
    }

    pub async fn snapshot(&self) -> Vec<CacheEntry<T>> {
        self.entries.lock().await.clone()
    }

    pub async fn head(&self) -> Option<CacheEntry<T>> {
        self.entries.lock().await.first().cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

/// Process-wide cache, one sequence per resource kind. Initialized empty at
/// coordinator start; lives for the process lifetime.
#[derive(Debug, Default)]
pub struct PortalCache {
    pub datasets: ResourceCache<Dataset>,
    pub things: ResourceCache<Thing>,
}

impl PortalCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Rec {
        id: String,
        name: String,
    }

    impl ResourceRecord for Rec {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn rec(id: &str, name: &str) -> Rec {
        Rec {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn confirm_replaces_speculative_in_place() {
        let cache = ResourceCache::new();
        let _older = cache.insert_speculative(rec("tmp-1", "older")).await;
        let token = cache.insert_speculative(rec("tmp-2", "newer")).await;

        cache.confirm(token, rec("srv-1", "newer")).await;

        let entries = cache.snapshot().await;
        assert_eq!(entries.len(), 2);
        // Position preserved: the confirmed entry stays at the head.
        assert_eq!(entries[0].resource.id, "srv-1");
        assert_eq!(entries[0].provenance, Provenance::Confirmed);
        assert_eq!(entries[1].provenance, Provenance::Speculative);
    }

    #[tokio::test]
    async fn confirm_without_speculative_inserts_at_head() {
        let cache = ResourceCache::new();
        let token = cache.insert_speculative(rec("tmp-1", "a")).await;
        cache.rollback(token).await;

        cache.confirm(token, rec("srv-1", "a")).await;

        let entries = cache.snapshot().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].resource.id, "srv-1");
        assert_eq!(entries[0].provenance, Provenance::Confirmed);
    }

    #[tokio::test]
    async fn duplicate_confirmation_is_idempotent() {
        let cache = ResourceCache::new();
        let token = cache.insert_speculative(rec("tmp-1", "a")).await;

        cache.confirm(token, rec("srv-1", "a")).await;
        cache.confirm(token, rec("srv-1", "a")).await;

        let entries = cache.snapshot().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].resource.id, "srv-1");
    }

    #[tokio::test]
    async fn confirmation_never_duplicates_an_existing_id() {
        let cache = ResourceCache::new();
        let first = cache.insert_speculative(rec("tmp-1", "a")).await;
        cache.confirm(first, rec("srv-1", "a")).await;

        // A second in-flight write resolves to the same server id; the
        // existing entry is updated in place and the speculative one dropped.
        let second = cache.insert_speculative(rec("tmp-2", "a-renamed")).await;
        cache.confirm(second, rec("srv-1", "a-renamed")).await;

        let entries = cache.snapshot().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].resource.id, "srv-1");
        assert_eq!(entries[0].resource.name, "a-renamed");
    }

    #[tokio::test]
    async fn rollback_removes_only_the_matching_entry() {
        let cache = ResourceCache::new();
        let keep = cache.insert_speculative(rec("tmp-1", "keep")).await;
        let discard = cache.insert_speculative(rec("tmp-2", "drop")).await;

        assert!(cache.rollback(discard).await);
        assert!(!cache.rollback(discard).await);

        let entries = cache.snapshot().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].resource.name, "keep");
        assert_eq!(entries[0].correlation_token(), Some(keep));
    }

    #[tokio::test]
    async fn identical_names_stay_distinct_across_attempts() {
        let cache = ResourceCache::new();
        let first = cache.insert_speculative(rec("tmp-1", "data.csv")).await;
        let second = cache.insert_speculative(rec("tmp-2", "data.csv")).await;

        cache.confirm(second, rec("srv-2", "data.csv")).await;
        cache.confirm(first, rec("srv-1", "data.csv")).await;

        let entries = cache.snapshot().await;
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.provenance == Provenance::Confirmed));
        assert_ne!(entries[0].resource.id, entries[1].resource.id);
    }

    #[tokio::test]
    async fn rollback_never_touches_confirmed_entries() {
        let cache = ResourceCache::new();
        let token = cache.insert_speculative(rec("tmp-1", "a")).await;
        cache.confirm(token, rec("srv-1", "a")).await;

        assert!(!cache.rollback(token).await);
        assert_eq!(cache.len().await, 1);
    }
}
