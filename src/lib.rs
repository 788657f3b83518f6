//! quickbar: a DOM reconciliation engine for quick-reply consolidation.
//!
//! A host chat application renders quick-reply sets and script-injected
//! button groups into a bar; this crate consolidates them into a single
//! menu while letting the user whitelist specific groups to stay inline.
//! The engine classifies nodes under the bar, applies visibility policy
//! from the whitelist, filters duplicate menu items, and heals whitelisted
//! script containers the host destroys during re-renders — without ever
//! duplicating or losing a tracked node.
//!
//! # Architecture
//!
//! - [`dom`]: the arena-backed document model the embedder owns.
//! - [`host`]: contracts for the host application's quick-reply API.
//! - [`whitelist`]: logical ids (`QRV2::<name>` / `JSR::<scriptId>`).
//! - [`classify`]: pure role classification of nodes under the bar.
//! - [`registry`]: fingerprint-cached node → set-name mapping.
//! - [`visibility`]: the idempotent show/hide reconciliation pass.
//! - [`menu`]: duplicate filtering inside the consolidated menu.
//! - [`heal`]: snapshot-based restoration of lost whitelisted containers.
//! - [`schedule`]: debounce and frame deferral over a virtual clock.
//! - [`engine`]: the composition root tying it all together.
//!
//! # Example
//!
//! ```
//! use quickbar::prelude::*;
//! use std::time::Duration;
//!
//! let mut doc = Document::new();
//! let bar = doc.element("div").id(quickbar::host::BAR_ID).build();
//! let root = doc.root();
//! doc.append_child(root, bar).unwrap();
//! let group = doc
//!     .element("div")
//!     .id("script_container_abc")
//!     .class(quickbar::host::BUTTON_GROUP_CLASS)
//!     .build();
//! doc.append_child(bar, group).unwrap();
//!
//! let host = HostSnapshot::default();
//! let mut engine = Engine::with_config(EngineConfig {
//!     enabled: true,
//!     whitelist: Whitelist::from_persisted(["JSR::abc"]),
//! });
//!
//! engine.apply_whitelist_dom_changes(&mut doc, &host);
//! assert!(doc.marks(group).contains(Marks::WHITELISTED_ORIGINAL));
//!
//! engine.observe_bar_mutations(&doc);
//! engine.pump(&mut doc, &host, Duration::ZERO);
//! ```

pub mod classify;
pub mod dom;
pub mod engine;
pub mod heal;
pub mod host;
pub mod menu;
pub mod registry;
pub mod schedule;
pub mod visibility;
pub mod whitelist;

/// Commonly used types, for glob import.
pub mod prelude {
    pub use crate::classify::Role;
    pub use crate::dom::{Display, Document, Marks, NodeId};
    pub use crate::engine::{Engine, EngineConfig};
    pub use crate::heal::Healer;
    pub use crate::host::{HostApi, HostSnapshot, QuickReplies, Reply, SetLink};
    pub use crate::registry::SetRegistry;
    pub use crate::schedule::{Scheduler, Task, CHAT_SWITCH_DELAY, DEBOUNCE_QUIET};
    pub use crate::whitelist::{EntryId, Whitelist};
}
