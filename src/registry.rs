//! Set registry: a cached mapping from rendered quick-reply-set nodes to
//! their logical names.
//!
//! The host API offers no change notification for its set lists, so a cheap
//! content fingerprint (sorted names plus list lengths) stands in for a
//! dirty flag, backed by a liveness check on every cached node. The cache is
//! a node → name association only; it never outlives a node's presence in
//! the document (a name → node lookup would).

use crate::classify::SetMap;
use crate::dom::Document;
use crate::host::{HostApi, SetLink};

/// Node → set-name cache with fingerprint-based invalidation.
///
/// Owned state, not a global: construct one per engine instance and
/// [`reset`](SetRegistry::reset) it between tests.
#[derive(Debug, Default)]
pub struct SetRegistry {
    fingerprint: Option<String>,
    cache: SetMap,
}

impl SetRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current node → name map, rebuilt only when the host's set lists
    /// changed or a cached node left the document.
    pub fn sets(&mut self, doc: &Document, host: &dyn HostApi) -> &SetMap {
        let persistent = host.set_links();
        let per_chat = host.chat_set_links();
        let fingerprint = fingerprint(&persistent, &per_chat);

        let hit = self.fingerprint.as_deref() == Some(fingerprint.as_str())
            && !self.cache.is_empty()
            && self.cache.keys().all(|&node| doc.is_attached(node));
        if hit {
            return &self.cache;
        }

        tracing::debug!("set registry rebuild ({} + {} links)", persistent.len(), per_chat.len());
        self.cache.clear();
        for link in persistent.iter().chain(per_chat.iter()) {
            if link.name.is_empty() {
                continue;
            }
            if let Some(node) = link.node {
                if doc.is_attached(node) {
                    self.cache.insert(node, link.name.clone());
                }
            }
        }
        self.fingerprint = Some(fingerprint);
        &self.cache
    }

    /// Drop the fingerprint so the next [`sets`](SetRegistry::sets) call
    /// rebuilds. Called after any DOM-modifying healing pass, since node
    /// identities may have changed underneath the cache.
    pub fn invalidate(&mut self) {
        self.fingerprint = None;
    }

    /// Clear all state (test isolation).
    pub fn reset(&mut self) {
        self.fingerprint = None;
        self.cache.clear();
    }
}

fn fingerprint(persistent: &[SetLink], per_chat: &[SetLink]) -> String {
    fn names(links: &[SetLink]) -> String {
        let mut names: Vec<&str> = links
            .iter()
            .map(|l| l.name.as_str())
            .filter(|n| !n.is_empty())
            .collect();
        names.sort_unstable();
        names.join(",")
    }
    format!(
        "{}:{}|{}:{}",
        persistent.len(),
        names(persistent),
        per_chat.len(),
        names(per_chat)
    )
}
