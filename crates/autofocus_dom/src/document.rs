//! Element tree management
//!
//! A small document model: elements keyed by [`NodeId`], attribute maps,
//! form-control values, plus the document-wide focus and selection state.
//! Operations on stale or foreign node IDs are ignored.

use indexmap::IndexMap;
use slotmap::{new_key_type, Key, SlotMap};

use crate::selector::{SelectorError, SelectorList};

new_key_type! {
    /// Unique identifier for an element in a [`Document`]
    pub struct NodeId;
}

impl NodeId {
    /// Convert to a raw u64 representation
    pub fn to_raw(self) -> u64 {
        self.data().as_ffi()
    }

    /// Create from a raw u64 representation
    pub fn from_raw(raw: u64) -> Self {
        Self::from(slotmap::KeyData::from_ffi(raw))
    }
}

/// Recognized `<input type=..>` keywords; anything else behaves as `text`
const INPUT_TYPES: &[&str] = &[
    "text",
    "search",
    "url",
    "tel",
    "password",
    "email",
    "number",
    "hidden",
    "checkbox",
    "radio",
    "button",
    "submit",
    "reset",
    "image",
    "file",
    "range",
    "color",
    "date",
    "month",
    "week",
    "time",
    "datetime-local",
];

/// Input types whose whole value can be selected with `select()`
const SELECT_INPUT_TYPES: &[&str] = &["text", "search", "url", "tel", "password", "email", "number"];

/// Input types that accept `setSelectionRange()`
const SELECTION_RANGE_INPUT_TYPES: &[&str] = &["text", "search", "url", "tel", "password"];

/// A text selection range in character offsets, `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionRange {
    pub start: usize,
    pub end: usize,
}

impl SelectionRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A collapsed range (caret) at `offset`
    pub fn caret(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// One successful focus call, in the order it happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusRecord {
    pub node: NodeId,
    pub prevent_scroll: bool,
}

/// Element data stored in the tree
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attributes: IndexMap<String, String>,
    value: String,
    content_editable: bool,
    selection: Option<SelectionRange>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: IndexMap::new(),
            value: String::new(),
            content_editable: false,
            selection: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Lowercase tag name
    pub fn tag_name(&self) -> &str {
        &self.tag
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Attributes in insertion order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|list| list.split_ascii_whitespace().any(|c| c == class))
    }

    /// Current value of a form control (empty for other elements)
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_content_editable(&self) -> bool {
        self.content_editable
    }

    pub fn selection(&self) -> Option<SelectionRange> {
        self.selection
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The effective type of an `<input>`, lowercase
    ///
    /// A missing or unrecognized `type` attribute means `text`. Returns
    /// `None` for other elements.
    pub fn input_type(&self) -> Option<&'static str> {
        if self.tag != "input" {
            return None;
        }
        let declared = self.attribute("type").unwrap_or("text");
        let kind = INPUT_TYPES
            .iter()
            .copied()
            .find(|kind| kind.eq_ignore_ascii_case(declared))
            .unwrap_or("text");
        Some(kind)
    }

    /// `<textarea>` or an `<input>` whose value `select()` can highlight
    pub fn supports_select(&self) -> bool {
        self.tag == "textarea"
            || self
                .input_type()
                .is_some_and(|kind| SELECT_INPUT_TYPES.contains(&kind))
    }

    /// `<textarea>` or an `<input>` that accepts an explicit selection range
    pub fn supports_selection_range(&self) -> bool {
        self.tag == "textarea"
            || self
                .input_type()
                .is_some_and(|kind| SELECTION_RANGE_INPUT_TYPES.contains(&kind))
    }

    fn is_natively_focusable(&self) -> bool {
        match self.tag.as_str() {
            "input" if self.input_type() == Some("hidden") => false,
            "input" | "textarea" | "select" | "button" => self.attribute("disabled").is_none(),
            "a" => self.attribute("href").is_some(),
            _ => false,
        }
    }

    fn value_len(&self) -> usize {
        self.value.chars().count()
    }
}

/// A document: a tree of elements rooted at an `<html>` element
#[derive(Debug)]
pub struct Document {
    nodes: SlotMap<NodeId, Element>,
    root: NodeId,
    focused: Option<NodeId>,
    focus_log: Vec<FocusRecord>,
    scroll_target: Option<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only the root element
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Element::new("html"));
        Self {
            nodes,
            root,
            focused: None,
            focus_log: Vec::new(),
            scroll_target: None,
        }
    }

    /// The document root; elements are connected when it is their ancestor
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.insert(Element::new(tag))
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        self.nodes.get(node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node)?.parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes.get(node).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere
    ///
    /// Ignored when it would make an element its own ancestor.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains(parent) || !self.contains(child) || child == self.root {
            return;
        }
        if parent == child || self.ancestors(parent).any(|a| a == child) {
            tracing::debug!("append_child ignored: {:?} is an ancestor of {:?}", child, parent);
            return;
        }
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    /// Remove `node` (and its subtree) from its parent
    ///
    /// The subtree stays alive and can be re-inserted. Focus held inside it is cleared.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.root {
            return;
        }
        self.detach(node);
        if let Some(focused) = self.focused {
            if !self.is_connected(focused) {
                self.focused = None;
            }
        }
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get_mut(node).and_then(|e| e.parent.take()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.retain(|&c| c != node);
        }
    }

    /// Ancestors from the immediate parent up to the root
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node), move |&n| self.parent(n))
    }

    /// Descendants of `node` in document order, excluding `node`
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        result
    }

    /// Whether `node` is attached beneath the document root
    pub fn is_connected(&self, node: NodeId) -> bool {
        node == self.root || (self.contains(node) && self.ancestors(node).any(|a| a == self.root))
    }

    // =========================================================================
    // Attributes & values
    // =========================================================================

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(element) = self.nodes.get_mut(node) {
            element
                .attributes
                .insert(name.to_ascii_lowercase(), value.to_string());
        }
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(element) = self.nodes.get_mut(node) {
            element.attributes.shift_remove(&name.to_ascii_lowercase());
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes.get(node)?.attribute(name)
    }

    pub fn set_id(&mut self, node: NodeId, id: &str) {
        self.set_attribute(node, "id", id);
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        let Some(element) = self.nodes.get_mut(node) else {
            return;
        };
        if element.has_class(class) {
            return;
        }
        let list = element.attributes.entry("class".to_string()).or_default();
        if !list.is_empty() {
            list.push(' ');
        }
        list.push_str(class);
    }

    /// Set a form control's value; any selection in it is reset
    pub fn set_value(&mut self, node: NodeId, value: &str) {
        if let Some(element) = self.nodes.get_mut(node) {
            element.value = value.to_string();
            element.selection = None;
        }
    }

    pub fn value(&self, node: NodeId) -> &str {
        self.nodes.get(node).map(Element::value).unwrap_or("")
    }

    pub fn set_content_editable(&mut self, node: NodeId, editable: bool) {
        if let Some(element) = self.nodes.get_mut(node) {
            element.content_editable = editable;
        }
    }

    // =========================================================================
    // Focus
    // =========================================================================

    /// Whether `node` can currently take focus
    pub fn is_focusable(&self, node: NodeId) -> bool {
        let Some(element) = self.nodes.get(node) else {
            return false;
        };
        self.is_connected(node)
            && (element.is_natively_focusable()
                || element.content_editable
                || element.attribute("tabindex").is_some())
    }

    /// Focus `node`, scrolling it into view unless `prevent_scroll` is set
    ///
    /// Returns false (and changes nothing) when the element cannot take focus.
    pub fn focus(&mut self, node: NodeId, prevent_scroll: bool) -> bool {
        if !self.is_focusable(node) {
            tracing::trace!("focus ignored for non-focusable {:?}", node);
            return false;
        }
        self.focused = Some(node);
        self.focus_log.push(FocusRecord {
            node,
            prevent_scroll,
        });
        if !prevent_scroll {
            self.scroll_target = Some(node);
        }
        true
    }

    pub fn blur(&mut self) {
        self.focused = None;
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Every successful focus call so far
    pub fn focus_log(&self) -> &[FocusRecord] {
        &self.focus_log
    }

    /// The element most recently scrolled into view by a focus call
    pub fn scroll_target(&self) -> Option<NodeId> {
        self.scroll_target
    }

    // =========================================================================
    // Text selection
    // =========================================================================

    /// Select the whole value of a text field
    pub fn select(&mut self, node: NodeId) {
        if let Some(element) = self.nodes.get_mut(node) {
            if element.supports_select() {
                element.selection = Some(SelectionRange::new(0, element.value_len()));
            }
        }
    }

    /// Set the selection of a text field, clamped to its value
    ///
    /// Ignored for input types without range support, such as `email`.
    pub fn set_selection_range(&mut self, node: NodeId, start: usize, end: usize) {
        if let Some(element) = self.nodes.get_mut(node) {
            if element.supports_selection_range() {
                let len = element.value_len();
                let end = end.min(len);
                let start = start.min(end);
                element.selection = Some(SelectionRange::new(start, end));
            }
        }
    }

    pub fn selection(&self, node: NodeId) -> Option<SelectionRange> {
        self.nodes.get(node)?.selection
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether `node` matches `selector`
    pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool, SelectorError> {
        let list = SelectorList::parse(selector)?;
        Ok(list.matches(self, node))
    }

    /// First descendant of `root` matching `selector`, in document order
    pub fn query_selector(
        &self,
        root: NodeId,
        selector: &str,
    ) -> Result<Option<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .descendants(root)
            .into_iter()
            .find(|&node| list.matches(self, node)))
    }

    /// All descendants of `root` matching `selector`, in document order
    pub fn query_selector_all(
        &self,
        root: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .descendants(root)
            .into_iter()
            .filter(|&node| list.matches(self, node))
            .collect())
    }
}
