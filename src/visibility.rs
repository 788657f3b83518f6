//! Visibility reconciliation: applies show/hide policy to everything under
//! the bar from the whitelist and the enabled flag.
//!
//! The pass is idempotent by construction: it first resets every
//! engine-applied mark under the bar, then reapplies policy from scratch.
//! Side effects are confined to marks under the bar, the body-level
//! enabled/disabled pair, and menu-item display (via [`crate::menu`]).

use crate::classify::{classify, is_wrapper, Role, SetMap};
use crate::dom::{Document, Marks, NodeId};
use crate::host::{self, HostApi};
use crate::menu;
use crate::registry::SetRegistry;
use crate::whitelist::{EntryId, Whitelist};

/// Run one full reconciliation pass (visibility + menu filter).
///
/// A missing bar is "nothing to do yet": only the menu filter runs. Never
/// fails; never touches nodes outside the bar and the menu containers.
pub fn apply_visibility(
    doc: &mut Document,
    host: &dyn HostApi,
    registry: &mut SetRegistry,
    whitelist: &Whitelist,
    enabled: bool,
) {
    let Some(bar) = doc.get_element_by_id(host::BAR_ID) else {
        return;
    };

    // Step 1: reset to unmarked. Only ever touches nodes under the bar.
    let engine_marks =
        Marks::HIDDEN_BY_PLUGIN | Marks::WHITELISTED_ORIGINAL | Marks::WRAPPER_VISIBLE;
    for node in doc.descendants(bar) {
        doc.remove_marks(node, engine_marks);
    }

    let body = doc.root();
    if !enabled {
        // Disabled: nothing is consolidated; the menu becomes informational.
        doc.remove_marks(body, Marks::ENGINE_ENABLED);
        doc.insert_marks(body, Marks::ENGINE_DISABLED);
        menu::filter_menu_items(doc, whitelist, enabled);
        return;
    }
    doc.remove_marks(body, Marks::ENGINE_DISABLED);
    doc.insert_marks(body, Marks::ENGINE_ENABLED);

    let sets = registry.sets(doc, host).clone();
    let combined = host.combined_layout();

    // At most one wrapper among the bar's direct children.
    let wrapper = doc
        .children(bar)
        .iter()
        .copied()
        .find(|&child| is_wrapper(doc, child, bar, &sets, combined));

    let mut wrapper_has_content = false;
    for child in doc.children(bar).to_vec() {
        if Some(child) == wrapper {
            // Recurse into the wrapper instead of processing it directly.
            for inner in doc.children(child).to_vec() {
                if process_element(doc, inner, bar, &sets, combined, whitelist) {
                    wrapper_has_content = true;
                }
            }
        } else {
            // Direct children outside the wrapper never affect its visibility.
            process_element(doc, child, bar, &sets, combined, whitelist);
        }
    }

    // An empty consolidation box would still occupy layout space.
    if let Some(wrapper) = wrapper {
        if wrapper_has_content {
            doc.remove_marks(wrapper, Marks::HIDDEN_BY_PLUGIN);
            doc.insert_marks(wrapper, Marks::WRAPPER_VISIBLE);
        } else {
            doc.insert_marks(wrapper, Marks::HIDDEN_BY_PLUGIN);
            doc.remove_marks(wrapper, Marks::WRAPPER_VISIBLE);
        }
    }

    menu::filter_menu_items(doc, whitelist, enabled);
}

/// Apply policy to one element. Returns whether it counts as "content
/// present" for its parent wrapper (only protected or whitelisted nodes do).
fn process_element(
    doc: &mut Document,
    node: NodeId,
    bar: NodeId,
    sets: &SetMap,
    combined: bool,
    whitelist: &Whitelist,
) -> bool {
    // The host's own popout trigger duplicates what the consolidated menu
    // offers; keep it hidden while the plugin is active.
    if doc.id_of(node) == Some(host::POPOUT_TRIGGER_ID)
        && doc
            .parent(node)
            .is_some_and(|p| doc.id_of(p) == Some(host::BAR_ID))
    {
        doc.insert_marks(node, Marks::HIDDEN_BY_PLUGIN);
        return false;
    }

    let entry = match classify(doc, node, bar, sets, combined) {
        Role::ProtectedHelper => {
            doc.remove_marks(node, Marks::HIDDEN_BY_PLUGIN | Marks::WHITELISTED_ORIGINAL);
            return true;
        }
        Role::QuickReplySet(name) => EntryId::Set(name),
        Role::ScriptContainer(id) => EntryId::Script(id),
        Role::Unrecognized => {
            // Fail closed: an unknown injected control needs consolidation.
            doc.insert_marks(node, Marks::HIDDEN_BY_PLUGIN);
            return false;
        }
        Role::Wrapper | Role::Inert => return false,
    };

    if whitelist.contains(&entry) {
        doc.insert_marks(node, Marks::WHITELISTED_ORIGINAL);
        doc.remove_marks(node, Marks::HIDDEN_BY_PLUGIN);
        true
    } else {
        doc.insert_marks(node, Marks::HIDDEN_BY_PLUGIN);
        doc.remove_marks(node, Marks::WHITELISTED_ORIGINAL);
        false
    }
}
