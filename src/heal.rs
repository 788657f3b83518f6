//! Healing: detects loss of whitelisted script-injected containers and
//! restores them at their last known position.
//!
//! The host re-renders the bar's subtree at arbitrary times (chat switches
//! especially) and can destroy a script container without recreating it.
//! For a whitelisted script id that is still logically valid, that
//! disappearance is a transient fault, not a deletion. Each tracked id moves
//! through three states on every debounced pass:
//!
//! - **Unknown** (no snapshot): a live, valid container is snapshotted
//!   together with its next sibling.
//! - **Cached**: present and valid refreshes the snapshot; logically
//!   removed drops it (a legitimate deletion); absent but still valid moves
//!   to restoring.
//! - **Restoring**: a deep clone of the snapshot is inserted back before
//!   the cached sibling when that sibling is still under the target parent,
//!   appended at the end otherwise (best-effort order preservation). The
//!   snapshot then points at the new clone.
//!
//! Restoration marks the pass as DOM-modifying, which both invalidates the
//! set registry and makes the driver schedule a one-frame re-check to
//! re-capture sibling pointers after layout.

use crate::classify::is_wrapper;
use crate::dom::{Document, NodeId};
use crate::host::{self, HostApi};
use crate::registry::SetRegistry;
use crate::whitelist::Whitelist;
use rustc_hash::{FxHashMap, FxHashSet};
use smartstring::alias::String as SmartString;

/// Last known position of a whitelisted script container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// The container node (or the clone that replaced it).
    pub node: NodeId,
    /// Its next element sibling at snapshot time, used only to restore
    /// position after unexpected removal.
    pub next_sibling: Option<NodeId>,
}

/// Result of a healing pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealReport {
    /// Whether the pass inserted anything into the document.
    pub dom_modified: bool,
}

/// Per-script-id snapshot cache and the state machine over it.
#[derive(Debug, Default)]
pub struct Healer {
    cached: FxHashMap<SmartString, Snapshot>,
}

impl Healer {
    /// Empty healer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot for a script id, if one is cached.
    pub fn snapshot(&self, script_id: &str) -> Option<&Snapshot> {
        self.cached.get(script_id)
    }

    /// Run one healing pass over every whitelisted script id.
    ///
    /// Disabled mode drops all snapshots: nothing is tracked while the
    /// plugin is off. A missing bar leaves snapshots untouched (nothing to
    /// heal into yet).
    pub fn heal_pass(
        &mut self,
        doc: &mut Document,
        host: &dyn HostApi,
        registry: &mut SetRegistry,
        whitelist: &Whitelist,
        enabled: bool,
    ) -> HealReport {
        // Host DOM churn got us here; the set cache cannot be trusted.
        registry.invalidate();

        if !enabled {
            self.cached.clear();
            return HealReport::default();
        }
        let Some(bar) = doc.get_element_by_id(host::BAR_ID) else {
            return HealReport::default();
        };

        let valid: FxHashSet<SmartString> = host
            .quick_replies()
            .valid_script_ids()
            .map(SmartString::from)
            .collect();

        // Restorations land in the wrapper when one exists, else the bar.
        let sets = registry.sets(doc, host).clone();
        let combined = host.combined_layout();
        let target_parent = doc
            .children(bar)
            .iter()
            .copied()
            .find(|&child| is_wrapper(doc, child, bar, &sets, combined))
            .unwrap_or(bar);

        let mut report = HealReport::default();
        let script_ids: Vec<SmartString> =
            whitelist.script_ids().map(SmartString::from).collect();
        for script_id in script_ids {
            let container_id = format!("{}{}", host::SCRIPT_CONTAINER_PREFIX, script_id);
            let live = doc.get_element_by_id(&container_id);
            let is_valid = valid.contains(&script_id);

            match live {
                Some(node) if is_valid => {
                    // Present and expected: take or refresh the snapshot.
                    let snapshot = Snapshot {
                        node,
                        next_sibling: doc.next_sibling(node),
                    };
                    if self.cached.get(&script_id) != Some(&snapshot) {
                        self.cached.insert(script_id, snapshot);
                    }
                }
                Some(_) => {
                    // Present but no longer a valid quick reply.
                    self.cached.remove(&script_id);
                }
                None if is_valid => {
                    if self.restore(doc, target_parent, &script_id, &container_id) {
                        report.dom_modified = true;
                    }
                }
                None => {
                    // Absent and logically gone: a legitimate deletion.
                    self.cached.remove(&script_id);
                }
            }
        }

        if report.dom_modified {
            registry.invalidate();
        }
        report
    }

    /// Restore one missing container from its snapshot. Returns whether the
    /// document was modified.
    fn restore(
        &mut self,
        doc: &mut Document,
        target_parent: NodeId,
        script_id: &str,
        container_id: &str,
    ) -> bool {
        let Some(cached) = self.cached.get(script_id).copied() else {
            // Nothing ever snapshotted; the container cannot be rebuilt.
            return false;
        };
        tracing::warn!("whitelisted container #{container_id} missing, restoring");

        let clone = doc.deep_clone(cached.node);
        let mut inserted = false;
        if let Some(sibling) = cached.next_sibling {
            if doc.is_attached(sibling) && doc.contains(target_parent, sibling) {
                match doc.insert_before(target_parent, clone, Some(sibling)) {
                    Ok(()) => inserted = true,
                    Err(err) => {
                        tracing::warn!("insert before cached sibling failed for {script_id}: {err}");
                    }
                }
            }
        }
        if !inserted {
            if let Err(err) = doc.append_child(target_parent, clone) {
                // The one condition worth error severity: the user's button
                // stays missing.
                tracing::error!("could not reinsert container #{container_id}: {err}");
                return false;
            }
            tracing::warn!("appended {script_id} at the end; order may differ");
        }

        self.cached.insert(
            SmartString::from(script_id),
            Snapshot {
                node: clone,
                next_sibling: doc.next_sibling(clone),
            },
        );
        true
    }

    /// Re-capture next-sibling pointers for every snapshot whose node is
    /// attached. Run one frame after a DOM-modifying pass, once layout has
    /// settled.
    pub fn refresh_siblings(&mut self, doc: &Document) {
        for snapshot in self.cached.values_mut() {
            if doc.parent(snapshot.node).is_some() {
                snapshot.next_sibling = doc.next_sibling(snapshot.node);
            }
        }
    }

    /// Clear all snapshots (test isolation, plugin disable).
    pub fn reset(&mut self) {
        self.cached.clear();
    }
}
