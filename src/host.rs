//! External collaborators: the host chat application's quick-reply API and
//! the well-known ids/classes of the DOM it renders.
//!
//! The host owns creation and destruction of everything under the bar; this
//! crate only observes it. [`HostApi`] is the seam: production embedders
//! adapt the real host object behind it, tests substitute a
//! [`HostSnapshot`]. A host that is only partially up (mid-startup) is
//! modeled by empty lists, never by panics.

use crate::dom::NodeId;
use smartstring::alias::String as SmartString;

/// Id of the bar element holding inline quick-reply buttons.
pub const BAR_ID: &str = "qr--bar";
/// Class carried by every button-group container.
pub const BUTTON_GROUP_CLASS: &str = "qr--buttons";
/// Class carried by every individual reply button.
pub const BUTTON_CLASS: &str = "qr--button";
/// Id prefix of script-injected containers: `script_container_<scriptId>`.
pub const SCRIPT_CONTAINER_PREFIX: &str = "script_container_";
/// Fixed id of the input-helper toolbar (protected).
pub const INPUT_HELPER_TOOLBAR_ID: &str = "input_helper_toolbar";
/// Fixed id of the custom-buttons container (protected).
pub const CUSTOM_BUTTONS_CONTAINER_ID: &str = "custom_buttons_container";
/// Id prefix of individual input-helper buttons (protected).
pub const INPUT_BUTTON_PREFIX: &str = "input_";
/// Id of the host's popout trigger button under the bar.
pub const POPOUT_TRIGGER_ID: &str = "qr--popoutTrigger";

/// Id of the consolidated menu's per-chat item container.
pub const MENU_CHAT_ITEMS_ID: &str = "qrm-chat-items";
/// Id of the consolidated menu's global item container.
pub const MENU_GLOBAL_ITEMS_ID: &str = "qrm-global-items";
/// Class carried by every rendered menu item.
pub const MENU_ITEM_CLASS: &str = "qrm-item";
/// Data attribute: "true" when the item mirrors a standard set button.
pub const DATA_IS_STANDARD: &str = "isStandard";
/// Data attribute: set name for standard items.
pub const DATA_SET_NAME: &str = "setName";
/// Data attribute: script id for script-injected items.
pub const DATA_SCRIPT_ID: &str = "scriptId";

/// A host "set link": a quick-reply set's logical name plus its DOM node,
/// when the host has rendered one for it.
#[derive(Debug, Clone)]
pub struct SetLink {
    /// The set's logical name.
    pub name: SmartString,
    /// The set's rendered container, if present.
    pub node: Option<NodeId>,
}

impl SetLink {
    /// Convenience constructor.
    pub fn new(name: &str, node: Option<NodeId>) -> Self {
        Self {
            name: SmartString::from(name),
            node,
        }
    }
}

/// Where a reply descriptor originates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplySource {
    /// A button from a standard, named quick-reply set.
    StandardSet {
        /// Name of the owning set.
        set_name: SmartString,
    },
    /// A button injected by the host's third-party scripting feature.
    ScriptInjected {
        /// Stable id of the injecting script.
        script_id: SmartString,
    },
}

/// One reply descriptor from the host's `fetchQuickReplies` equivalent.
#[derive(Debug, Clone)]
pub struct Reply {
    /// Origin of the reply (standard set or script-injected).
    pub source: ReplySource,
    /// Display label.
    pub label: SmartString,
}

impl Reply {
    /// A reply belonging to a standard set.
    pub fn standard(set_name: &str, label: &str) -> Self {
        Self {
            source: ReplySource::StandardSet {
                set_name: SmartString::from(set_name),
            },
            label: SmartString::from(label),
        }
    }

    /// A script-injected reply.
    pub fn script(script_id: &str, label: &str) -> Self {
        Self {
            source: ReplySource::ScriptInjected {
                script_id: SmartString::from(script_id),
            },
            label: SmartString::from(label),
        }
    }
}

/// The `fetchQuickReplies()` result: per-chat and global reply descriptors.
#[derive(Debug, Clone, Default)]
pub struct QuickReplies {
    /// Replies scoped to the current chat.
    pub chat: Vec<Reply>,
    /// Replies available in every chat.
    pub global: Vec<Reply>,
}

impl QuickReplies {
    /// Script ids of the chat-scoped script-injected replies — the set of
    /// scripts that are still logically valid and whose containers are
    /// therefore expected to exist in the DOM.
    pub fn valid_script_ids(&self) -> impl Iterator<Item = &str> {
        self.chat.iter().filter_map(|r| match &r.source {
            ReplySource::ScriptInjected { script_id } => Some(script_id.as_str()),
            ReplySource::StandardSet { .. } => None,
        })
    }
}

/// The slice of the host application's API this engine consumes.
pub trait HostApi {
    /// The persistent set-link list.
    fn set_links(&self) -> Vec<SetLink>;

    /// The per-chat set-link list.
    fn chat_set_links(&self) -> Vec<SetLink>;

    /// Whether the host's layout combines button groups into one wrapper.
    fn combined_layout(&self) -> bool;

    /// Current reply descriptors, chat-scoped and global.
    fn quick_replies(&self) -> QuickReplies;
}

/// Plain-data [`HostApi`] implementation for tests and simple embedders.
#[derive(Debug, Clone, Default)]
pub struct HostSnapshot {
    /// Persistent set links.
    pub set_links: Vec<SetLink>,
    /// Per-chat set links.
    pub chat_set_links: Vec<SetLink>,
    /// Combined-layout flag.
    pub combined_layout: bool,
    /// Reply descriptors.
    pub quick_replies: QuickReplies,
}

impl HostApi for HostSnapshot {
    fn set_links(&self) -> Vec<SetLink> {
        self.set_links.clone()
    }

    fn chat_set_links(&self) -> Vec<SetLink> {
        self.chat_set_links.clone()
    }

    fn combined_layout(&self) -> bool {
        self.combined_layout
    }

    fn quick_replies(&self) -> QuickReplies {
        self.quick_replies.clone()
    }
}
