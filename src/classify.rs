//! Role classification for nodes under the bar.
//!
//! Pure functions of current document state; nothing here mutates. The
//! structural heuristics mirror what the host actually renders: protected
//! input-helper controls, registered quick-reply sets, script-injected
//! containers (`script_container_<scriptId>`), and the unlabeled wrapper the
//! host's combined layout puts around everything.
//!
//! One deliberate tie-break: a node that is both wrapper-shaped and a
//! registered set is classified as the set — identity beats structure.

use crate::dom::{Document, Marks, NodeId};
use crate::host;
use rustc_hash::FxHashMap;
use smartstring::alias::String as SmartString;

/// Known node names by logical identity, as maintained by the set registry.
pub type SetMap = FxHashMap<NodeId, SmartString>;

/// What a node under the bar is, for visibility policy purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Input-assist control that must never be hidden.
    ProtectedHelper,
    /// A registered quick-reply set with this logical name.
    QuickReplySet(SmartString),
    /// A script-injected container with this script id.
    ScriptContainer(SmartString),
    /// The host's consolidation wrapper around button groups.
    Wrapper,
    /// A button group matching no known role. Policy: hide (fail closed).
    Unrecognized,
    /// No bearing on policy (plain buttons, text, the bar itself).
    Inert,
}

/// Extract the script id from a `script_container_<scriptId>` element id.
pub fn script_id_of(doc: &Document, node: NodeId) -> Option<&str> {
    doc.id_of(node)
        .and_then(|id| id.strip_prefix(host::SCRIPT_CONTAINER_PREFIX))
        .filter(|id| !id.is_empty())
}

/// Whether the node is a protected input-helper container or button.
///
/// Two shapes exist in the host DOM: the fixed-id helper containers, and a
/// single `input_`-prefixed helper button sitting directly inside an
/// unlabeled button group (or inside a wrapper the engine already marked
/// visible). Both belong to an unrelated input-assist feature and must never
/// be consolidated.
pub fn is_protected_helper(doc: &Document, node: NodeId) -> bool {
    match doc.id_of(node) {
        Some(host::INPUT_HELPER_TOOLBAR_ID) | Some(host::CUSTOM_BUTTONS_CONTAINER_ID) => {
            return true;
        }
        _ => {}
    }
    let is_input_button = doc.has_class(node, host::BUTTON_CLASS)
        && doc
            .id_of(node)
            .is_some_and(|id| id.starts_with(host::INPUT_BUTTON_PREFIX));
    if !is_input_button {
        return false;
    }
    let Some(parent) = doc.parent(node) else {
        return false;
    };
    let in_unlabeled_group =
        doc.has_class(parent, host::BUTTON_GROUP_CLASS) && doc.id_of(parent).is_none();
    let in_visible_wrapper = doc.marks(parent).contains(Marks::WRAPPER_VISIBLE);
    in_unlabeled_group || in_visible_wrapper
}

/// Whether `node` is the consolidation wrapper: a direct child of the bar,
/// carrying the button-group class, that is neither protected, a script
/// container, nor a registered set, and whose content passes the layout
/// heuristic for the host's current mode.
pub fn is_wrapper(
    doc: &Document,
    node: NodeId,
    bar: NodeId,
    sets: &SetMap,
    combined: bool,
) -> bool {
    if doc.parent(node) != Some(bar) {
        return false;
    }
    if !doc.has_class(node, host::BUTTON_GROUP_CLASS) {
        return false;
    }
    if matches!(
        doc.id_of(node),
        Some(host::INPUT_HELPER_TOOLBAR_ID) | Some(host::CUSTOM_BUTTONS_CONTAINER_ID)
    ) {
        return false;
    }
    if script_id_of(doc, node).is_some() {
        return false;
    }
    // Identity beats structure: a registered set is never the wrapper.
    if sets.contains_key(&node) {
        return false;
    }

    let has_inner_buttons = doc.descendants(node).iter().any(|&d| {
        doc.has_class(d, host::BUTTON_CLASS) || doc.has_class(d, host::BUTTON_GROUP_CLASS)
    });

    if combined && has_inner_buttons {
        let has_non_helper_content = doc.children(node).iter().any(|&child| {
            let helper_container = matches!(
                doc.id_of(child),
                Some(host::INPUT_HELPER_TOOLBAR_ID) | Some(host::CUSTOM_BUTTONS_CONTAINER_ID)
            );
            let non_helper_group = doc.has_class(child, host::BUTTON_GROUP_CLASS)
                && !helper_container;
            let script = script_id_of(doc, child).is_some();
            let non_helper_button = doc.has_class(child, host::BUTTON_CLASS)
                && !doc
                    .id_of(child)
                    .is_some_and(|id| id.starts_with(host::INPUT_BUTTON_PREFIX));
            non_helper_group || script || non_helper_button
        });
        let only_contains_helpers = doc.children(node).iter().all(|&child| {
            matches!(
                doc.id_of(child),
                Some(host::INPUT_HELPER_TOOLBAR_ID) | Some(host::CUSTOM_BUTTONS_CONTAINER_ID)
            ) || (doc.has_class(child, host::BUTTON_CLASS)
                && doc
                    .id_of(child)
                    .is_some_and(|id| id.starts_with(host::INPUT_BUTTON_PREFIX)))
        });
        if has_non_helper_content || !only_contains_helpers {
            return true;
        }
    }

    // Fallback heuristic for the simpler (non-combined) layout: an unlabeled
    // button group with any button content.
    doc.id_of(node).is_none() && has_inner_buttons
}

/// Classify a node under the bar.
pub fn classify(
    doc: &Document,
    node: NodeId,
    bar: NodeId,
    sets: &SetMap,
    combined: bool,
) -> Role {
    if is_protected_helper(doc, node) {
        return Role::ProtectedHelper;
    }
    if let Some(script_id) = script_id_of(doc, node) {
        return Role::ScriptContainer(SmartString::from(script_id));
    }
    if doc.has_class(node, host::BUTTON_GROUP_CLASS) {
        if let Some(name) = sets.get(&node) {
            return Role::QuickReplySet(name.clone());
        }
        if is_wrapper(doc, node, bar, sets, combined) {
            return Role::Wrapper;
        }
        return Role::Unrecognized;
    }
    Role::Inert
}
