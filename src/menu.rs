//! Menu item filtering for the consolidated menu.
//!
//! A whitelisted entry's real inline button is already visible, so the
//! mirrored menu item is hidden to avoid offering the same action twice.
//! When the plugin is disabled nothing is consolidated and every item is
//! shown (the menu is informational only).

use crate::dom::{Display, Document, NodeId};
use crate::host;
use crate::whitelist::{EntryId, Whitelist};

/// Show or hide every rendered item in the per-chat and global menu
/// sections according to the whitelist and enabled flag.
///
/// No-op when either menu container is absent (menu not built yet).
pub fn filter_menu_items(doc: &mut Document, whitelist: &Whitelist, enabled: bool) {
    let Some(chat) = doc.get_element_by_id(host::MENU_CHAT_ITEMS_ID) else {
        return;
    };
    let Some(global) = doc.get_element_by_id(host::MENU_GLOBAL_ITEMS_ID) else {
        return;
    };

    let mut items: Vec<NodeId> = Vec::new();
    for container in [chat, global] {
        items.extend(
            doc.descendants(container)
                .into_iter()
                .filter(|&n| doc.has_class(n, host::MENU_ITEM_CLASS)),
        );
    }

    for item in items {
        if !enabled {
            doc.set_display(item, Display::Block);
            continue;
        }
        let hidden = item_entry_id(doc, item).is_some_and(|entry| whitelist.contains(&entry));
        doc.set_display(item, if hidden { Display::None } else { Display::Block });
    }
}

/// Logical id of a menu item, computed the same way the visibility pass
/// computes it for inline nodes.
fn item_entry_id(doc: &Document, item: NodeId) -> Option<EntryId> {
    let is_standard = doc.data(item, host::DATA_IS_STANDARD) == Some("true");
    if is_standard {
        if let Some(set_name) = doc.data(item, host::DATA_SET_NAME) {
            return Some(EntryId::set(set_name));
        }
    }
    doc.data(item, host::DATA_SCRIPT_ID).map(EntryId::script)
}
