//! The composition root: owns the registry, healer, and scheduler, and
//! exposes the engine's public entry points.
//!
//! Everything here is single-threaded and event-driven. The embedder owns
//! the [`Document`] and a monotonic clock; it calls
//! [`Engine::pump`] from its loop (per frame or per event batch), and the
//! engine turns observed document revisions into debounced heal-and-apply
//! passes. Entry points are never reentrant and never fail: a missing bar
//! means "nothing to do yet".
//!
//! # Example
//!
//! ```
//! use quickbar::engine::Engine;
//! use quickbar::dom::Document;
//! use quickbar::host::HostSnapshot;
//! use std::time::Duration;
//!
//! let mut doc = Document::new();
//! let host = HostSnapshot::default();
//! let mut engine = Engine::new();
//!
//! engine.apply_whitelist_dom_changes(&mut doc, &host); // bar absent: no-op
//! engine.observe_bar_mutations(&doc);
//! engine.pump(&mut doc, &host, Duration::ZERO);
//! ```

use crate::dom::Document;
use crate::heal::Healer;
use crate::host::HostApi;
use crate::registry::SetRegistry;
use crate::schedule::{Scheduler, Task, CHAT_SWITCH_DELAY};
use crate::visibility;
use crate::whitelist::{EntryId, Whitelist};
use std::time::Duration;

/// The slice of the embedder's settings object this engine reads and writes.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Whether consolidation is active at all.
    pub enabled: bool,
    /// Entries exempted from consolidation.
    pub whitelist: Whitelist,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            whitelist: Whitelist::new(),
        }
    }
}

/// The reconciliation engine.
#[derive(Debug, Default)]
pub struct Engine {
    config: EngineConfig,
    registry: SetRegistry,
    healer: Healer,
    scheduler: Scheduler,
    /// Document revision last seen by the active observer, `None` while not
    /// observing.
    observed_revision: Option<u64>,
}

impl Engine {
    /// Engine with default config (enabled, empty whitelist).
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with the given config.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The healer (read-only; exposed for diagnostics and tests).
    pub fn healer(&self) -> &Healer {
        &self.healer
    }

    /// Run the full reconciliation pass (visibility + menu filter) now.
    ///
    /// Idempotent; safe to call at any time, including before the bar
    /// exists.
    pub fn apply_whitelist_dom_changes(&mut self, doc: &mut Document, host: &dyn HostApi) {
        visibility::apply_visibility(
            doc,
            host,
            &mut self.registry,
            &self.config.whitelist,
            self.config.enabled,
        );
    }

    /// (Re)start observing the bar subtree. Safe to call repeatedly; a new
    /// observer replaces the previous one, so at most one is ever alive.
    pub fn observe_bar_mutations(&mut self, doc: &Document) {
        self.observed_revision = Some(doc.revision());
        tracing::info!("observing bar mutations from revision {}", doc.revision());
    }

    /// The host switched chats: its full re-render takes a moment, so a
    /// reconciliation is scheduled rather than run immediately.
    pub fn handle_chat_changed(&mut self, now: Duration) {
        tracing::debug!("chat changed, scheduling delayed reconciliation");
        self.scheduler.schedule_reapply(now, CHAT_SWITCH_DELAY);
    }

    /// Toggle the enabled flag and reconcile immediately.
    pub fn set_enabled(&mut self, doc: &mut Document, host: &dyn HostApi, enabled: bool) {
        self.config.enabled = enabled;
        self.apply_whitelist_dom_changes(doc, host);
    }

    /// Add a whitelist entry. Reconciles immediately when the set changed;
    /// returns whether it did (the caller decides whether to persist).
    pub fn whitelist_add(
        &mut self,
        doc: &mut Document,
        host: &dyn HostApi,
        entry: EntryId,
    ) -> bool {
        let changed = self.config.whitelist.add(entry);
        if changed {
            self.apply_whitelist_dom_changes(doc, host);
        }
        changed
    }

    /// Remove a whitelist entry. Reconciles immediately when the set
    /// changed; returns whether it did.
    pub fn whitelist_remove(
        &mut self,
        doc: &mut Document,
        host: &dyn HostApi,
        entry: &EntryId,
    ) -> bool {
        let changed = self.config.whitelist.remove(entry);
        if changed {
            self.apply_whitelist_dom_changes(doc, host);
        }
        changed
    }

    /// Drive the engine: deliver pending mutations to the debouncer and run
    /// every task already due at `now`.
    ///
    /// Tasks created while executing (the post-heal frame request, or new
    /// mutations from healing insertions) become due on a later call, which
    /// is what gives "debounce, then one frame later" its ordering.
    pub fn pump(&mut self, doc: &mut Document, host: &dyn HostApi, now: Duration) {
        if let Some(baseline) = self.observed_revision {
            if doc.revision() != baseline {
                self.observed_revision = Some(doc.revision());
                self.scheduler.note_mutation(now);
            }
        }

        let mut due = Vec::new();
        while let Some(task) = self.scheduler.next_due(now) {
            due.push(task);
        }
        for task in due {
            match task {
                Task::HealAndApply => {
                    let report = self.healer.heal_pass(
                        doc,
                        host,
                        &mut self.registry,
                        &self.config.whitelist,
                        self.config.enabled,
                    );
                    self.apply_whitelist_dom_changes(doc, host);
                    if report.dom_modified {
                        // Sibling pointers must be re-read once the freshly
                        // inserted clone has settled.
                        self.scheduler.request_frame();
                    }
                }
                Task::Reapply => {
                    self.apply_whitelist_dom_changes(doc, host);
                }
                Task::PostHealRefresh => {
                    self.healer.refresh_siblings(doc);
                    self.apply_whitelist_dom_changes(doc, host);
                }
            }
        }
    }

    /// Clear all engine state: caches, snapshots, pending tasks, observer.
    pub fn reset(&mut self) {
        self.registry.reset();
        self.healer.reset();
        self.scheduler.reset();
        self.observed_revision = None;
    }
}
