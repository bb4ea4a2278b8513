//! Ordered document tree backed by an arena.
//!
//! Every node lives in [`Document::nodes`] and is addressed by a [`NodeId`].
//! Elements own the ordered list of their children; the parent link is a
//! plain index used for context queries (ancestor kinds, depth) and never
//! for ownership. Text, CDATA and comment content is kept exactly as it
//! appeared in the source (still escaped), so serializing an untouched tree
//! reproduces the original formatting.

use std::borrow::Cow;

use quick_xml::escape::{escape, unescape};

pub const CLASS_ATTR: &str = "Class";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Patch operation kind selected by the `Class` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    FindMod,
    Sequence,
    Add,
    Test,
    /// Any other `PatchOperation*` (or custom) class; passed through untouched.
    Other,
}

impl OperationKind {
    pub fn from_class(class: &str) -> Self {
        match class.trim() {
            "PatchOperationFindMod" => OperationKind::FindMod,
            "PatchOperationSequence" => OperationKind::Sequence,
            "PatchOperationAdd" => OperationKind::Add,
            "PatchOperationTest" => OperationKind::Test,
            _ => OperationKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    raw_value: String,
}

impl Attribute {
    /// Build from an unescaped value.
    pub fn new(name: impl Into<String>, value: &str) -> Self {
        Self {
            name: name.into(),
            raw_value: escape(value).into_owned(),
        }
    }

    pub(crate) fn from_raw(name: String, raw_value: String) -> Self {
        Self { name, raw_value }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value as written in the source, entities not expanded.
    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    pub fn value(&self) -> Cow<'_, str> {
        unescape(&self.raw_value).unwrap_or(Cow::Borrowed(self.raw_value.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    attributes: Vec<Attribute>,
    kind: Option<OperationKind>,
    children: Vec<NodeId>,
    self_closing: bool,
}

impl Element {
    pub fn new(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        let kind = attributes
            .iter()
            .find(|a| a.name == CLASS_ATTR)
            .map(|a| OperationKind::from_class(&a.value()));
        Self {
            name: name.into(),
            attributes,
            kind,
            children: Vec::new(),
            self_closing: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<Cow<'_, str>> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(Attribute::value)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    /// `None` when the element has no `Class` attribute.
    pub fn operation_kind(&self) -> Option<OperationKind> {
        self.kind
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_self_closing(&self) -> bool {
        self.self_closing && self.children.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    /// Document-level nodes in order: comments, whitespace and the root element.
    top: Vec<NodeId>,
    root: Option<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            top: Vec::new(),
            root: None,
        }
    }

    /// Create a detached node. Attach it with [`Document::append_child`] or a replace.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData { kind, parent: None });
        id
    }

    /// Append `child` to `parent`, or to the document level when `parent` is `None`.
    /// The first element appended at document level becomes the root element.
    pub fn append_child(&mut self, parent: Option<NodeId>, child: NodeId) {
        self.detach(child);
        match parent {
            Some(p) => {
                if let NodeKind::Element(el) = &mut self.nodes[p.0].kind {
                    el.children.push(child);
                    self.nodes[child.0].parent = Some(p);
                }
            }
            None => {
                if self.root.is_none() && matches!(self.nodes[child.0].kind, NodeKind::Element(_)) {
                    self.root = Some(child);
                }
                self.top.push(child);
            }
        }
    }

    pub(crate) fn mark_self_closing(&mut self, id: NodeId) {
        if let NodeKind::Element(el) = &mut self.nodes[id.0].kind {
            el.self_closing = true;
        }
    }

    pub fn root_element(&self) -> Option<NodeId> {
        self.root
    }

    pub fn top_level(&self) -> &[NodeId] {
        &self.top
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(Element::name)
    }

    pub fn operation_kind(&self, id: NodeId) -> Option<OperationKind> {
        self.element(id).and_then(Element::operation_kind)
    }

    pub fn is_operation(&self, id: NodeId, kind: OperationKind) -> bool {
        self.operation_kind(id) == Some(kind)
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<Cow<'_, str>> {
        self.element(id).and_then(|el| el.attribute(name))
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_attribute(name))
    }

    /// Rename an element in place; attributes and children stay as they are.
    pub fn set_tag_name(&mut self, id: NodeId, name: &str) {
        if let NodeKind::Element(el) = &mut self.nodes[id.0].kind {
            if el.name != name {
                el.name = name.to_string();
            }
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Number of parent hops from `node` up to `ancestor`, `None` if `ancestor`
    /// is not on the way up.
    pub fn depth_below(&self, ancestor: NodeId, node: NodeId) -> Option<usize> {
        if ancestor == node {
            return Some(0);
        }
        self.ancestors(node)
            .position(|a| a == ancestor)
            .map(|hops| hops + 1)
    }

    /// All children, including text and comments.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id.0].kind {
            NodeKind::Element(el) => &el.children,
            _ => &[],
        }
    }

    /// Snapshot of the element children.
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
            .collect()
    }

    /// First direct child element named `name`.
    pub fn child_element(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.tag_name(*c) == Some(name))
    }

    pub fn child_elements_named(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.tag_name(*c) == Some(name))
            .collect()
    }

    /// `id` followed by every node below it, in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    /// Unescaped text of all text and CDATA nodes below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for n in self.descendants(id) {
            match &self.nodes[n.0].kind {
                NodeKind::Text(raw) => match unescape(raw) {
                    Ok(s) => out.push_str(&s),
                    Err(_) => out.push_str(raw),
                },
                NodeKind::CData(raw) => out.push_str(raw),
                _ => {}
            }
        }
        out
    }

    /// Mutable access to the raw content of a text or comment node.
    pub fn text_mut(&mut self, id: NodeId) -> Option<&mut String> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Text(s) | NodeKind::Comment(s) => Some(s),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(s) => Some(s),
            _ => None,
        }
    }

    fn siblings_mut(&mut self, parent: Option<NodeId>) -> Option<&mut Vec<NodeId>> {
        match parent {
            Some(p) => match &mut self.nodes[p.0].kind {
                NodeKind::Element(el) => Some(&mut el.children),
                _ => None,
            },
            None => Some(&mut self.top),
        }
    }

    /// Remove `id` from its parent's child list. The node and its subtree stay
    /// in the arena but are no longer reachable from the document.
    pub fn detach(&mut self, id: NodeId) {
        let parent = self.nodes[id.0].parent.take();
        if let Some(list) = self.siblings_mut(parent) {
            list.retain(|c| *c != id);
        }
        if parent.is_none() && self.root == Some(id) {
            self.root = None;
        }
    }

    /// Put `replacements` at the exact position `target` occupies among its
    /// siblings and detach `target`. Sibling order is otherwise unchanged.
    pub fn replace_with(&mut self, target: NodeId, replacements: &[NodeId]) {
        for r in replacements {
            if *r != target {
                self.detach(*r);
            }
        }
        let parent = self.nodes[target.0].parent;
        let was_root = self.root == Some(target);
        let Some(list) = self.siblings_mut(parent) else {
            return;
        };
        let Some(pos) = list.iter().position(|c| *c == target) else {
            return;
        };
        list.splice(pos..=pos, replacements.iter().copied());
        for r in replacements {
            self.nodes[r.0].parent = parent;
        }
        if !replacements.contains(&target) {
            self.nodes[target.0].parent = None;
        }
        if was_root {
            self.root = replacements
                .iter()
                .copied()
                .find(|r| self.is_element(*r));
        }
    }

    /// Drop empty text nodes directly under `id`.
    pub fn prune_empty_text(&mut self, id: NodeId) {
        let empties: Vec<NodeId> = self
            .children(id)
            .iter()
            .copied()
            .filter(|c| self.text(*c).is_some_and(str::is_empty))
            .collect();
        for e in empties {
            self.detach(e);
        }
    }
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.next?;
        self.next = self.doc.parent(cur);
        Some(cur)
    }
}
