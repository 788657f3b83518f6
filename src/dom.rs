//! Host document model.
//!
//! The engine does not own a live browser DOM; the embedder owns a
//! [`Document`] — an arena-backed element tree — and passes it into every
//! entry point. The model covers exactly the surface the reconciliation
//! engine needs from a real document: id lookup, class membership,
//! attachment checks, ordered insertion, deep cloning, and a structural
//! mutation revision that stands in for `MutationObserver` delivery.
//!
//! Detached subtrees stay alive in the arena, mirroring how removed DOM
//! nodes survive in a browser while something still references them. That
//! liveness is what makes snapshot-based healing possible: a cached node can
//! be cloned back into the tree after the host destroyed the original.
//!
//! # Example
//!
//! ```
//! use quickbar::dom::Document;
//!
//! let mut doc = Document::new();
//! let bar = doc.element("div").id("qr--bar").build();
//! doc.append_child(doc.root(), bar).unwrap();
//!
//! let set = doc.element("div").class("qr--buttons").build();
//! doc.append_child(bar, set).unwrap();
//!
//! assert!(doc.is_attached(set));
//! assert_eq!(doc.get_element_by_id("qr--bar"), Some(bar));
//! ```

use bitflags::bitflags;
use smallvec::SmallVec;
use smartstring::alias::String as SmartString;
use std::fmt;

/// Type alias for child-node collections.
/// The first 8 ids are stored inline, spilling to heap only for wide nodes.
pub type ChildVec = SmallVec<[NodeId; 8]>;

/// Handle to a node in a [`Document`] arena.
///
/// Handles are only meaningful for the document that created them; nodes are
/// never freed, so a handle stays valid (attached or detached) for the
/// document's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Engine-applied visibility marks, the modeled equivalent of the CSS
    /// classes a real embedder would toggle.
    ///
    /// Mark changes do not bump the document revision: mutation observation
    /// covers child-list structure only, so the engine's own toggling never
    /// re-triggers the debounce.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Marks: u8 {
        /// Node is consolidated away (hidden inline).
        const HIDDEN_BY_PLUGIN = 1 << 0;
        /// Node is whitelisted and deliberately left visible inline.
        const WHITELISTED_ORIGINAL = 1 << 1;
        /// The consolidation wrapper has visible content and is shown.
        const WRAPPER_VISIBLE = 1 << 2;
        /// Body-level: the plugin is active.
        const ENGINE_ENABLED = 1 << 3;
        /// Body-level: the plugin is switched off.
        const ENGINE_DISABLED = 1 << 4;
    }
}

/// Inline display override, the modeled equivalent of `style.display`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    /// Visible.
    Block,
    /// Hidden.
    None,
}

/// Error type for structural document operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The reference sibling is not a child of the target parent.
    #[error("reference node is not a child of the target parent")]
    NotAChild,
    /// Inserting the node would make it its own ancestor.
    #[error("insertion would create a cycle")]
    WouldCreateCycle,
}

#[derive(Debug, Clone)]
struct ElementData {
    tag: SmartString,
    id: Option<SmartString>,
    classes: SmallVec<[SmartString; 4]>,
    data: SmallVec<[(SmartString, SmartString); 2]>,
    marks: Marks,
    display: Option<Display>,
    parent: Option<NodeId>,
    children: ChildVec,
}

impl ElementData {
    fn new(tag: &str) -> Self {
        Self {
            tag: SmartString::from(tag),
            id: None,
            classes: SmallVec::new(),
            data: SmallVec::new(),
            marks: Marks::empty(),
            display: None,
            parent: None,
            children: SmallVec::new(),
        }
    }
}

/// An arena-backed element tree standing in for the host document.
///
/// The root node models `document.body`. Structural mutations (append,
/// insert, detach) bump [`Document::revision`]; attribute-level changes
/// (classes, marks, data, display) do not.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<ElementData>,
    root: NodeId,
    revision: u64,
}

impl Document {
    /// Create a document containing only the root (`body`) node.
    pub fn new() -> Self {
        Self {
            nodes: vec![ElementData::new("body")],
            root: NodeId(0),
            revision: 0,
        }
    }

    /// The root node (the `body` equivalent).
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Monotonic counter bumped on every structural mutation.
    ///
    /// A change in revision is the modeled equivalent of a
    /// `MutationObserver` callback firing for the observed subtree.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // === Construction ===

    /// Create a detached element with the given tag.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(ElementData::new(tag));
        id
    }

    /// Start building a detached element.
    ///
    /// ```
    /// use quickbar::dom::Document;
    ///
    /// let mut doc = Document::new();
    /// let node = doc
    ///     .element("div")
    ///     .id("script_container_abc")
    ///     .class("qr--buttons")
    ///     .build();
    /// assert_eq!(doc.id_of(node), Some("script_container_abc"));
    /// ```
    pub fn element(&mut self, tag: &str) -> ElementBuilder<'_> {
        let node = self.create_element(tag);
        ElementBuilder { doc: self, node }
    }

    // === Structure ===

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `node` as a child of `parent`, immediately before `reference`.
    ///
    /// `reference = None` appends at the end (the `insertBefore(node, null)`
    /// contract). Fails if `reference` is not a current child of `parent`,
    /// or if `node` is `parent` itself or one of its ancestors.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        if node == parent || self.is_ancestor_of(node, parent) {
            return Err(DomError::WouldCreateCycle);
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild);
            }
        }
        // Detach first so moving within the same parent lands at the right slot.
        self.detach(node);
        let index = match reference {
            Some(reference) => self.nodes[parent.0 as usize]
                .children
                .iter()
                .position(|&c| c == reference)
                .ok_or(DomError::NotAChild)?,
            None => self.nodes[parent.0 as usize].children.len(),
        };
        self.nodes[parent.0 as usize].children.insert(index, node);
        self.nodes[node.0 as usize].parent = Some(parent);
        self.revision += 1;
        Ok(())
    }

    /// Remove `node` from its parent. The subtree stays alive in the arena
    /// (detached), exactly as a removed DOM node survives while referenced.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0 as usize].parent.take() {
            self.nodes[parent.0 as usize]
                .children
                .retain(|c| *c != node);
            self.revision += 1;
        }
    }

    /// Deep-clone the subtree rooted at `node`, returning the detached copy.
    ///
    /// Clones tag, id, classes, data attributes, marks, and display — the
    /// `cloneNode(true)` contract.
    pub fn deep_clone(&mut self, node: NodeId) -> NodeId {
        let mut data = self.nodes[node.0 as usize].clone();
        data.parent = None;
        let children = std::mem::take(&mut data.children);
        let clone = NodeId(self.nodes.len() as u32);
        self.nodes.push(data);
        for child in children {
            let child_clone = self.deep_clone(child);
            self.nodes[clone.0 as usize].children.push(child_clone);
            self.nodes[child_clone.0 as usize].parent = Some(clone);
        }
        clone
    }

    // === Queries ===

    /// Whether `ancestor` contains `node` (inclusive: a node contains itself).
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.nodes[n.0 as usize].parent;
        }
        false
    }

    /// Whether `node` is attached to the document (reachable from the root).
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.contains(self.root, node)
    }

    fn is_ancestor_of(&self, candidate: NodeId, node: NodeId) -> bool {
        candidate != node && self.contains(candidate, node)
    }

    /// Parent of `node`, if attached to one.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0 as usize].parent
    }

    /// Direct children of `node`, in document order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0 as usize].children
    }

    /// The next element sibling of `node`, if any.
    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes[node.0 as usize].parent?;
        let siblings = &self.nodes[parent.0 as usize].children;
        let index = siblings.iter().position(|&c| c == node)?;
        siblings.get(index + 1).copied()
    }

    /// Find the attached element with the given id (depth-first, like
    /// `getElementById` — detached subtrees are not searched).
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_in_subtree(self.root, &|doc, n| doc.id_of(n) == Some(id))
    }

    /// Depth-first search of the subtree under `scope` (inclusive).
    pub fn find_in_subtree(
        &self,
        scope: NodeId,
        predicate: &dyn Fn(&Document, NodeId) -> bool,
    ) -> Option<NodeId> {
        if predicate(self, scope) {
            return Some(scope);
        }
        for &child in self.children(scope) {
            if let Some(found) = self.find_in_subtree(child, predicate) {
                return Some(found);
            }
        }
        None
    }

    /// Collect every descendant of `scope` (exclusive), depth-first.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    // === Attributes ===

    /// The element's tag name.
    pub fn tag(&self, node: NodeId) -> &str {
        &self.nodes[node.0 as usize].tag
    }

    /// The element's id attribute, if set.
    pub fn id_of(&self, node: NodeId) -> Option<&str> {
        self.nodes[node.0 as usize].id.as_deref()
    }

    /// Set the element's id attribute.
    pub fn set_id(&mut self, node: NodeId, id: &str) {
        self.nodes[node.0 as usize].id = Some(SmartString::from(id));
    }

    /// Whether the element carries the given class.
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes[node.0 as usize]
            .classes
            .iter()
            .any(|c| c == class)
    }

    /// Add a class to the element (no-op if already present).
    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if !self.has_class(node, class) {
            self.nodes[node.0 as usize]
                .classes
                .push(SmartString::from(class));
        }
    }

    /// Read a data attribute.
    pub fn data(&self, node: NodeId, key: &str) -> Option<&str> {
        self.nodes[node.0 as usize]
            .data
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Write a data attribute, replacing any existing value.
    pub fn set_data(&mut self, node: NodeId, key: &str, value: &str) {
        let data = &mut self.nodes[node.0 as usize].data;
        if let Some(entry) = data.iter_mut().find(|(k, _)| k == key) {
            entry.1 = SmartString::from(value);
        } else {
            data.push((SmartString::from(key), SmartString::from(value)));
        }
    }

    // === Marks & display ===

    /// The engine marks currently applied to `node`.
    pub fn marks(&self, node: NodeId) -> Marks {
        self.nodes[node.0 as usize].marks
    }

    /// Add marks to `node`.
    pub fn insert_marks(&mut self, node: NodeId, marks: Marks) {
        self.nodes[node.0 as usize].marks.insert(marks);
    }

    /// Remove marks from `node`.
    pub fn remove_marks(&mut self, node: NodeId, marks: Marks) {
        self.nodes[node.0 as usize].marks.remove(marks);
    }

    /// The inline display override, if any.
    pub fn display(&self, node: NodeId) -> Option<Display> {
        self.nodes[node.0 as usize].display
    }

    /// Set the inline display override.
    pub fn set_display(&mut self, node: NodeId, display: Display) {
        self.nodes[node.0 as usize].display = Some(display);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for detached elements, for embedders and tests.
pub struct ElementBuilder<'a> {
    doc: &'a mut Document,
    node: NodeId,
}

impl ElementBuilder<'_> {
    /// Set the id attribute.
    pub fn id(self, id: &str) -> Self {
        self.doc.set_id(self.node, id);
        self
    }

    /// Add a class.
    pub fn class(self, class: &str) -> Self {
        self.doc.add_class(self.node, class);
        self
    }

    /// Set a data attribute.
    pub fn data(self, key: &str, value: &str) -> Self {
        self.doc.set_data(self.node, key, value);
        self
    }

    /// Finish, returning the (still detached) node.
    pub fn build(self) -> NodeId {
        self.node
    }
}
