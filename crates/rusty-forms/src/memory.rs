// File: src/memory.rs
// Purpose: In-memory document used for tests and headless validation

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::dom::Dom;

/// Handle to a node in a [`MemoryDom`].
///
/// Slots of removed nodes are reused; a handle to a removed node never
/// resolves to the node that later takes its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    value: String,
    text: String,
    markup: Option<String>,
    offset_top: f64,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
            classes: Vec::new(),
            value: String::new(),
            text: String::new(),
            markup: None,
            offset_top: 0.0,
            parent: None,
            children: Vec::new(),
        }
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        if name == "class" {
            self.classes = value.split_whitespace().map(str::to_string).collect();
        } else {
            self.attrs.insert(name.to_string(), value.to_string());
        }
    }
}

/// One simple selector. Lists are comma separated; compound selectors
/// (`input.big`) and combinators are not supported.
#[derive(Debug, Clone, PartialEq)]
enum Simple {
    Ref(String),
    Class(String),
    Id(String),
    Attr(String, Option<String>),
    Tag(String),
}

fn parse_selector(selector: &str) -> Vec<Simple> {
    selector
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            if let Some(name) = part.strip_prefix("ref:") {
                Simple::Ref(name.to_string())
            } else if let Some(class) = part.strip_prefix('.') {
                Simple::Class(class.to_string())
            } else if let Some(id) = part.strip_prefix('#') {
                Simple::Id(id.to_string())
            } else if let Some(inner) = part.strip_prefix('[').and_then(|p| p.strip_suffix(']')) {
                match inner.split_once('=') {
                    Some((name, value)) => Simple::Attr(
                        name.trim().to_string(),
                        Some(value.trim().trim_matches('"').to_string()),
                    ),
                    None => Simple::Attr(inner.trim().to_string(), None),
                }
            } else {
                Simple::Tag(part.to_ascii_lowercase())
            }
        })
        .collect()
}

static OPEN_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*<([a-zA-Z][a-zA-Z0-9-]*)([^>]*)>").unwrap());
static ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*"([^"]*)""#).unwrap());
static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena-backed element tree implementing [`Dom`].
///
/// Inserted markup becomes a single element whose tag, attributes and text
/// are read from the markup's outer tag. Removing a node frees its subtree,
/// so repeated passes over the same page keep the arena at a steady size.
/// Scroll requests are recorded rather than performed.
#[derive(Debug, Clone)]
pub struct MemoryDom {
    slots: Vec<Slot>,
    free: Vec<usize>,
    scrolls: Vec<f64>,
}

const ROOT: NodeId = NodeId {
    index: 0,
    generation: 0,
};

impl MemoryDom {
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(Node::new("body")),
            }],
            free: Vec::new(),
            scrolls: Vec::new(),
        }
    }

    /// The `body` element every other node hangs off
    pub fn root(&self) -> NodeId {
        ROOT
    }

    /// Append an element under `parent`. A removed parent leaves the new
    /// element detached.
    pub fn append_element(&mut self, parent: &NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut node = Node::new(&tag.to_ascii_lowercase());
        for (name, value) in attrs {
            node.set_attr(name, value);
        }

        if self.get(*parent).is_none() {
            return self.alloc(node);
        }
        self.attach_last(*parent, node)
    }

    pub fn set_value(&mut self, node: &NodeId, value: &str) {
        if let Some(data) = self.get_mut(*node) {
            data.value = value.to_string();
        }
    }

    pub fn set_attr(&mut self, node: &NodeId, name: &str, value: &str) {
        if let Some(data) = self.get_mut(*node) {
            data.set_attr(name, value);
        }
    }

    pub fn remove_attr(&mut self, node: &NodeId, name: &str) {
        if let Some(data) = self.get_mut(*node) {
            data.attrs.remove(name);
        }
    }

    pub fn set_text(&mut self, node: &NodeId, text: &str) {
        if let Some(data) = self.get_mut(*node) {
            data.text = text.to_string();
        }
    }

    pub fn set_offset_top(&mut self, node: &NodeId, top: f64) {
        if let Some(data) = self.get_mut(*node) {
            data.offset_top = top;
        }
    }

    pub fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.get(*node)
            .map_or(false, |data| data.classes.iter().any(|c| c == class))
    }

    pub fn tag(&self, node: &NodeId) -> &str {
        self.get(*node).map_or("", |data| data.tag.as_str())
    }

    pub fn text(&self, node: &NodeId) -> &str {
        self.get(*node).map_or("", |data| data.text.as_str())
    }

    /// Markup a node was created from, if it came from `insert_after`/`append`
    pub fn markup(&self, node: &NodeId) -> Option<&str> {
        self.get(*node)?.markup.as_deref()
    }

    pub fn children(&self, node: &NodeId) -> &[NodeId] {
        self.get(*node)
            .map(|data| data.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_attached(&self, node: &NodeId) -> bool {
        let mut current = *node;
        loop {
            if current == ROOT {
                return true;
            }
            match self.get(current).and_then(|data| data.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Live nodes, the root included
    pub fn node_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Scroll offsets requested so far, oldest first
    pub fn scroll_requests(&self) -> &[f64] {
        &self.scrolls
    }

    fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.generation = slot.generation.wrapping_add(1);
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    /// Free a detached node and everything below it
    fn release(&mut self, id: NodeId) {
        let mut pending = vec![id];

        while let Some(current) = pending.pop() {
            let Some(slot) = self
                .slots
                .get_mut(current.index)
                .filter(|slot| slot.generation == current.generation)
            else {
                continue;
            };
            if let Some(node) = slot.node.take() {
                pending.extend(node.children);
                self.free.push(current.index);
            }
        }
    }

    fn attach_last(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        node.parent = Some(parent);
        let id = self.alloc(node);
        if let Some(data) = self.get_mut(parent) {
            data.children.push(id);
        }
        id
    }

    fn node_from_markup(markup: &str) -> Node {
        let mut node = match OPEN_TAG.captures(markup) {
            Some(caps) => {
                let mut node = Node::new(&caps[1].to_ascii_lowercase());
                for attr in ATTRIBUTE.captures_iter(&caps[2]) {
                    node.set_attr(&attr[1], &attr[2]);
                }
                node
            }
            None => Node::new("#text"),
        };
        node.text = ANY_TAG.replace_all(markup, "").trim().to_string();
        node.markup = Some(markup.to_string());
        node
    }

    fn detach(&mut self, node: NodeId) {
        let parent = self.get_mut(node).and_then(|data| data.parent.take());
        if let Some(parent) = parent.and_then(|parent| self.get_mut(parent)) {
            parent.children.retain(|child| *child != node);
        }
    }

    fn matches_simple(&self, node: NodeId, simple: &Simple) -> bool {
        let Some(data) = self.get(node) else {
            return false;
        };
        match simple {
            Simple::Ref(name) => data.attrs.get("data-ref").map_or(false, |v| v == name),
            Simple::Class(class) => data.classes.iter().any(|c| c == class),
            Simple::Id(id) => data.attrs.get("id").map_or(false, |v| v == id),
            Simple::Attr(name, None) => data.attrs.contains_key(name),
            Simple::Attr(name, Some(value)) => data.attrs.get(name).map_or(false, |v| v == value),
            Simple::Tag(tag) => data.tag == *tag,
        }
    }

    fn matches_id(&self, node: NodeId, selector: &str) -> bool {
        parse_selector(selector)
            .iter()
            .any(|simple| self.matches_simple(node, simple))
    }

    fn within_chain(&self, node: NodeId, chain: &[&str]) -> bool {
        let mut remaining = chain.len();
        let mut current = self.parent(&node);

        while remaining > 0 {
            let Some(ancestor) = current else {
                return false;
            };
            if self.matches_id(ancestor, chain[remaining - 1]) {
                remaining -= 1;
            }
            current = self.parent(&ancestor);
        }

        true
    }

    fn walk(&self, node: NodeId, out: &mut Vec<NodeId>) {
        for child in self.children(&node) {
            out.push(*child);
            self.walk(*child, out);
        }
    }
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom for MemoryDom {
    type Handle = NodeId;

    fn query(&self, selector: &str, within: &[&str]) -> Vec<NodeId> {
        let mut all = Vec::new();
        self.walk(ROOT, &mut all);

        all.into_iter()
            .filter(|node| self.matches_id(*node, selector) && self.within_chain(*node, within))
            .collect()
    }

    fn matches(&self, node: &NodeId, selector: &str) -> bool {
        self.matches_id(*node, selector)
    }

    fn attr(&self, node: &NodeId, name: &str) -> Option<String> {
        let data = self.get(*node)?;
        if name == "class" {
            return (!data.classes.is_empty()).then(|| data.classes.join(" "));
        }
        data.attrs.get(name).cloned()
    }

    fn value(&self, node: &NodeId) -> String {
        self.get(*node).map(|data| data.value.clone()).unwrap_or_default()
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.get(*node)?.parent
    }

    fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
        let siblings = self.children(&self.parent(node)?);
        let index = siblings.iter().position(|child| child == node)?;
        siblings.get(index + 1).copied()
    }

    fn siblings(&self, node: &NodeId, selector: &str) -> Vec<NodeId> {
        let Some(parent) = self.parent(node) else {
            return Vec::new();
        };

        self.children(&parent)
            .iter()
            .filter(|child| *child != node && self.matches_id(**child, selector))
            .copied()
            .collect()
    }

    fn closest(&self, node: &NodeId, selector: &str) -> Option<NodeId> {
        let mut current = self.get(*node).map(|_| *node);
        while let Some(id) = current {
            if self.matches_id(id, selector) {
                return Some(id);
            }
            current = self.parent(&id);
        }
        None
    }

    fn add_class(&mut self, node: &NodeId, class: &str) {
        if let Some(data) = self.get_mut(*node) {
            if !data.classes.iter().any(|c| c == class) {
                data.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&mut self, node: &NodeId, class: &str) {
        if let Some(data) = self.get_mut(*node) {
            data.classes.retain(|c| c != class);
        }
    }

    fn insert_after(&mut self, node: &NodeId, markup: &str) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let index = self.children(&parent).iter().position(|child| child == node)?;

        let mut inserted = Self::node_from_markup(markup);
        inserted.parent = Some(parent);
        let id = self.alloc(inserted);
        self.get_mut(parent)?.children.insert(index + 1, id);
        Some(id)
    }

    fn append(&mut self, parent: &NodeId, markup: &str) -> Option<NodeId> {
        self.get(*parent)?;
        let node = Self::node_from_markup(markup);
        Some(self.attach_last(*parent, node))
    }

    fn remove(&mut self, node: &NodeId) {
        if *node != ROOT {
            self.detach(*node);
            self.release(*node);
        }
    }

    fn empty(&mut self, node: &NodeId) {
        let Some(data) = self.get_mut(*node) else {
            return;
        };
        let children = std::mem::take(&mut data.children);
        data.text.clear();

        for child in children {
            self.release(child);
        }
    }

    fn offset_top(&self, node: &NodeId) -> f64 {
        self.get(*node).map_or(0.0, |data| data.offset_top)
    }

    fn scroll_to(&mut self, top: f64) {
        self.scrolls.push(top);
    }
}
