#![allow(clippy::unwrap_used)]
//! Full-pipeline tests: a synthetic host document and snapshot driven
//! through the engine's public entry points with a virtual clock.

use quickbar::dom::{Display, Document, Marks, NodeId};
use quickbar::engine::{Engine, EngineConfig};
use quickbar::host::{self, HostSnapshot, QuickReplies, Reply, SetLink};
use quickbar::schedule::DEBOUNCE_QUIET;
use quickbar::whitelist::Whitelist;
use std::time::Duration;

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// A bar in combined layout: a wrapper holding two registered sets, a
/// script container, and the input-helper toolbar, plus the plugin menu
/// mirroring the set and the script.
struct Scenario {
    doc: Document,
    host: HostSnapshot,
    bar: NodeId,
    wrapper: NodeId,
    set_alpha: NodeId,
    set_beta: NodeId,
    script: NodeId,
    helper: NodeId,
    menu_item_alpha: NodeId,
    menu_item_script: NodeId,
}

impl Scenario {
    fn new() -> Self {
        let mut doc = Document::new();
        let root = doc.root();
        let bar = doc.element("div").id(host::BAR_ID).build();
        doc.append_child(root, bar).unwrap();

        let wrapper = doc.element("div").class(host::BUTTON_GROUP_CLASS).build();
        doc.append_child(bar, wrapper).unwrap();

        let mut add_set = |doc: &mut Document, name: &str| {
            let set = doc.element("div").class(host::BUTTON_GROUP_CLASS).build();
            doc.append_child(wrapper, set).unwrap();
            let button = doc.element("div").class(host::BUTTON_CLASS).build();
            doc.append_child(set, button).unwrap();
            (set, SetLink::new(name, Some(set)))
        };
        let (set_alpha, link_alpha) = add_set(&mut doc, "Alpha");
        let (set_beta, link_beta) = add_set(&mut doc, "Beta");

        let script = doc
            .element("div")
            .id("script_container_abc")
            .class(host::BUTTON_GROUP_CLASS)
            .build();
        doc.append_child(wrapper, script).unwrap();

        let helper = doc
            .element("div")
            .id(host::INPUT_HELPER_TOOLBAR_ID)
            .class(host::BUTTON_GROUP_CLASS)
            .build();
        doc.append_child(wrapper, helper).unwrap();

        let chat_items = doc.element("div").id(host::MENU_CHAT_ITEMS_ID).build();
        let global_items = doc.element("div").id(host::MENU_GLOBAL_ITEMS_ID).build();
        doc.append_child(root, chat_items).unwrap();
        doc.append_child(root, global_items).unwrap();
        let menu_item_alpha = doc
            .element("div")
            .class(host::MENU_ITEM_CLASS)
            .data(host::DATA_IS_STANDARD, "true")
            .data(host::DATA_SET_NAME, "Alpha")
            .build();
        doc.append_child(global_items, menu_item_alpha).unwrap();
        let menu_item_script = doc
            .element("div")
            .class(host::MENU_ITEM_CLASS)
            .data(host::DATA_IS_STANDARD, "false")
            .data(host::DATA_SCRIPT_ID, "abc")
            .build();
        doc.append_child(chat_items, menu_item_script).unwrap();

        let host = HostSnapshot {
            set_links: vec![link_alpha],
            chat_set_links: vec![link_beta],
            combined_layout: true,
            quick_replies: QuickReplies {
                chat: vec![Reply::script("abc", "run")],
                global: vec![Reply::standard("Alpha", "hello")],
            },
        };

        Self {
            doc,
            host,
            bar,
            wrapper,
            set_alpha,
            set_beta,
            script,
            helper,
            menu_item_alpha,
            menu_item_script,
        }
    }
}

fn engine_with(whitelist: &[&str]) -> Engine {
    Engine::with_config(EngineConfig {
        enabled: true,
        whitelist: Whitelist::from_persisted(whitelist.iter().copied()),
    })
}

#[test]
fn test_whitelist_coverage_inline_and_menu() {
    let mut sc = Scenario::new();
    let mut engine = engine_with(&["QRV2::Alpha", "JSR::abc"]);

    engine.apply_whitelist_dom_changes(&mut sc.doc, &sc.host);

    // Whitelisted nodes stay visible and marked; their menu mirrors hide.
    for node in [sc.set_alpha, sc.script] {
        assert!(sc.doc.marks(node).contains(Marks::WHITELISTED_ORIGINAL));
        assert!(!sc.doc.marks(node).contains(Marks::HIDDEN_BY_PLUGIN));
    }
    assert_eq!(sc.doc.display(sc.menu_item_alpha), Some(Display::None));
    assert_eq!(sc.doc.display(sc.menu_item_script), Some(Display::None));

    // Everything else under the bar consolidates.
    assert!(sc.doc.marks(sc.set_beta).contains(Marks::HIDDEN_BY_PLUGIN));
    assert!(!sc.doc.marks(sc.helper).contains(Marks::HIDDEN_BY_PLUGIN));
    assert!(sc.doc.marks(sc.wrapper).contains(Marks::WRAPPER_VISIBLE));
}

#[test]
fn test_empty_whitelist_hides_wrapper_once_helper_gone() {
    let mut sc = Scenario::new();
    let mut engine = engine_with(&[]);

    engine.apply_whitelist_dom_changes(&mut sc.doc, &sc.host);
    // The protected helper keeps the wrapper visible even with nothing
    // whitelisted.
    assert!(sc.doc.marks(sc.wrapper).contains(Marks::WRAPPER_VISIBLE));

    sc.doc.detach(sc.helper);
    engine.apply_whitelist_dom_changes(&mut sc.doc, &sc.host);
    assert!(sc.doc.marks(sc.wrapper).contains(Marks::HIDDEN_BY_PLUGIN));
    assert!(!sc.doc.marks(sc.wrapper).contains(Marks::WRAPPER_VISIBLE));
}

#[test]
fn test_disabled_mode_shows_everything() {
    let mut sc = Scenario::new();
    let mut engine = Engine::with_config(EngineConfig {
        enabled: false,
        whitelist: Whitelist::from_persisted(["QRV2::Alpha"]),
    });

    engine.apply_whitelist_dom_changes(&mut sc.doc, &sc.host);

    for node in sc.doc.descendants(sc.bar) {
        assert!(
            !sc.doc.marks(node).contains(Marks::HIDDEN_BY_PLUGIN),
            "node {node} hidden while disabled"
        );
    }
    assert_eq!(sc.doc.display(sc.menu_item_alpha), Some(Display::Block));
    assert_eq!(sc.doc.display(sc.menu_item_script), Some(Display::Block));
    assert!(sc.doc.marks(sc.doc.root()).contains(Marks::ENGINE_DISABLED));
}

#[test]
fn test_idempotence_through_public_entry_point() {
    let mut sc = Scenario::new();
    let mut engine = engine_with(&["JSR::abc"]);

    let marks_of = |doc: &Document| -> Vec<(NodeId, Marks)> {
        doc.descendants(doc.root())
            .into_iter()
            .map(|n| (n, doc.marks(n)))
            .collect()
    };

    engine.apply_whitelist_dom_changes(&mut sc.doc, &sc.host);
    let first = marks_of(&sc.doc);
    engine.apply_whitelist_dom_changes(&mut sc.doc, &sc.host);
    assert_eq!(first, marks_of(&sc.doc));
}

#[test]
fn test_healing_round_trip_within_budget() {
    let mut sc = Scenario::new();
    let mut engine = engine_with(&["JSR::abc"]);
    engine.observe_bar_mutations(&sc.doc);

    // Any mutation starts the quiet window; its expiry snapshots the
    // healthy container (next sibling: the helper toolbar).
    let marker = sc.doc.create_element("span");
    let root = sc.doc.root();
    sc.doc.append_child(root, marker).unwrap();
    engine.pump(&mut sc.doc, &sc.host, ms(0));
    engine.pump(&mut sc.doc, &sc.host, DEBOUNCE_QUIET);
    let snapshot = *engine.healer().snapshot("abc").unwrap();
    assert_eq!(snapshot.node, sc.script);
    assert_eq!(snapshot.next_sibling, Some(sc.helper));

    // Host re-render destroys the container without recreating it.
    sc.doc.detach(sc.script);
    let t0 = ms(1000);
    engine.pump(&mut sc.doc, &sc.host, t0);
    assert!(sc.doc.get_element_by_id("script_container_abc").is_none());

    // Within one quiet window the node is back: same parent, same id,
    // immediately before the same sibling, still exempt.
    engine.pump(&mut sc.doc, &sc.host, t0 + DEBOUNCE_QUIET);
    let restored = sc.doc.get_element_by_id("script_container_abc").unwrap();
    assert_eq!(sc.doc.parent(restored), Some(sc.wrapper));
    assert_eq!(sc.doc.next_sibling(restored), Some(sc.helper));
    assert!(sc.doc.marks(restored).contains(Marks::WHITELISTED_ORIGINAL));

    // One frame later the snapshot tracks the clone with fresh siblings.
    engine.pump(&mut sc.doc, &sc.host, t0 + DEBOUNCE_QUIET + ms(16));
    let snapshot = *engine.healer().snapshot("abc").unwrap();
    assert_eq!(snapshot.node, restored);
    assert_eq!(snapshot.next_sibling, Some(sc.helper));
}

#[test]
fn test_healing_appends_when_sibling_lost_too() {
    let mut sc = Scenario::new();
    let mut engine = engine_with(&["JSR::abc"]);
    engine.observe_bar_mutations(&sc.doc);

    let marker = sc.doc.create_element("span");
    let root = sc.doc.root();
    sc.doc.append_child(root, marker).unwrap();
    engine.pump(&mut sc.doc, &sc.host, ms(0));
    engine.pump(&mut sc.doc, &sc.host, DEBOUNCE_QUIET);
    assert!(engine.healer().snapshot("abc").is_some());

    // Both the container and its cached next sibling disappear.
    sc.doc.detach(sc.script);
    sc.doc.detach(sc.helper);
    let t0 = ms(2000);
    engine.pump(&mut sc.doc, &sc.host, t0);
    engine.pump(&mut sc.doc, &sc.host, t0 + DEBOUNCE_QUIET);

    let restored = sc.doc.get_element_by_id("script_container_abc").unwrap();
    assert_eq!(sc.doc.parent(restored), Some(sc.wrapper));
    assert_eq!(sc.doc.children(sc.wrapper).last().copied(), Some(restored));
}

#[test]
fn test_set_rename_reflected_after_rebuild() {
    let mut sc = Scenario::new();
    let mut engine = engine_with(&["QRV2::Renamed"]);

    engine.apply_whitelist_dom_changes(&mut sc.doc, &sc.host);
    assert!(sc.doc.marks(sc.set_alpha).contains(Marks::HIDDEN_BY_PLUGIN));

    sc.host.set_links[0].name = "Renamed".into();
    engine.apply_whitelist_dom_changes(&mut sc.doc, &sc.host);
    assert!(sc
        .doc
        .marks(sc.set_alpha)
        .contains(Marks::WHITELISTED_ORIGINAL));
}

#[test]
fn test_chat_switch_reapplies_after_delay() {
    let mut sc = Scenario::new();
    let mut engine = engine_with(&[]);

    engine.handle_chat_changed(ms(0));
    engine.pump(&mut sc.doc, &sc.host, ms(100));
    assert!(!sc.doc.marks(sc.set_alpha).contains(Marks::HIDDEN_BY_PLUGIN));

    engine.pump(&mut sc.doc, &sc.host, ms(500));
    assert!(sc.doc.marks(sc.set_alpha).contains(Marks::HIDDEN_BY_PLUGIN));
}

#[test]
fn test_entry_points_safe_without_bar() {
    let mut doc = Document::new();
    let host = HostSnapshot::default();
    let mut engine = Engine::new();
    engine.apply_whitelist_dom_changes(&mut doc, &host);
    engine.observe_bar_mutations(&doc);
    engine.pump(&mut doc, &host, ms(10_000));
    assert_eq!(doc.marks(doc.root()), Marks::empty());
}
