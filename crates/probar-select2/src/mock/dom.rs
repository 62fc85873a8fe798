//! In-memory element tree backing [`super::MockPage`].

/// Index of a node in a [`MockDom`]
pub type NodeId = usize;

/// Element description used to build a [`MockDom`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockElement {
    /// Tag name (lowercase)
    pub tag: String,
    /// `id` attribute
    pub id: Option<String>,
    /// `class` list
    pub classes: Vec<String>,
    /// Other attributes
    pub attributes: Vec<(String, String)>,
    /// Own text, rendered before the children's text
    pub text: String,
    /// Whether the element is hidden (display: none)
    pub hidden: bool,
}

impl MockElement {
    /// Create an element with a tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// Set the `id`
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add one or more space-separated classes
    #[must_use]
    pub fn class(mut self, classes: &str) -> Self {
        self.classes
            .extend(classes.split_whitespace().map(ToString::to_string));
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Set the own text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Start hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Attribute lookup, including `id` and `class`
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "id" => self.id.clone(),
            "class" if !self.classes.is_empty() => Some(self.classes.join(" ")),
            _ => self
                .attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone()),
        }
    }

    /// Whether the element carries `class`
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[derive(Debug, Clone)]
struct Node {
    element: MockElement,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attached: bool,
}

/// A tree of [`MockElement`]s rooted at `<html>` with a single `<body>`
#[derive(Debug, Clone)]
pub struct MockDom {
    nodes: Vec<Node>,
}

impl Default for MockDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDom {
    /// Root `<html>` node
    pub const ROOT: NodeId = 0;

    /// The `<body>` node
    pub const BODY: NodeId = 1;

    /// Create an empty document
    #[must_use]
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: vec![Node {
                element: MockElement::new("html"),
                parent: None,
                children: Vec::new(),
                attached: true,
            }],
        };
        dom.append(Self::ROOT, MockElement::new("body"));
        dom
    }

    /// The `<body>` node
    #[must_use]
    pub const fn body(&self) -> NodeId {
        Self::BODY
    }

    /// Append a child, returning its id
    pub fn append(&mut self, parent: NodeId, element: MockElement) -> NodeId {
        let id = self.nodes.len();
        let attached = self.is_attached(parent);
        self.nodes.push(Node {
            element,
            parent: Some(parent),
            children: Vec::new(),
            attached,
        });
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(id);
        }
        id
    }

    /// Detach a node (and its subtree) from the document
    pub fn remove(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            if let Some(node) = self.nodes.get_mut(parent) {
                node.children.retain(|child| *child != id);
            }
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current) {
                node.attached = false;
                stack.extend(node.children.iter().copied());
            }
        }
    }

    /// Remove every child of a node
    pub fn clear_children(&mut self, id: NodeId) {
        for child in self.children(id) {
            self.remove(child);
        }
    }

    /// Make a node visible
    pub fn show(&mut self, id: NodeId) {
        if let Some(element) = self.element_mut(id) {
            element.hidden = false;
        }
    }

    /// Hide a node
    pub fn hide(&mut self, id: NodeId) {
        if let Some(element) = self.element_mut(id) {
            element.hidden = true;
        }
    }

    /// Add a class to a node
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(element) = self.element_mut(id) {
            if !element.has_class(class) {
                element.classes.push(class.to_string());
            }
        }
    }

    /// Remove a class from a node
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(element) = self.element_mut(id) {
            element.classes.retain(|c| c != class);
        }
    }

    /// Replace a node's own text
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        if let Some(element) = self.element_mut(id) {
            element.text = text.into();
        }
    }

    /// Set or replace an attribute
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(element) = self.element_mut(id) {
            let value = value.into();
            match element.attributes.iter_mut().find(|(key, _)| key == name) {
                Some(slot) => slot.1 = value,
                None => element.attributes.push((name.to_string(), value)),
            }
        }
    }

    /// Element description of a node
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&MockElement> {
        self.nodes.get(id).map(|node| &node.element)
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut MockElement> {
        self.nodes.get_mut(id).map(|node| &mut node.element)
    }

    /// Parent of a node
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    /// Children of a node in document order
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(id)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    /// Whether the node is still part of the document
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|node| node.attached)
    }

    /// Attached, and neither it nor any ancestor is hidden
    #[must_use]
    pub fn is_displayed(&self, id: NodeId) -> bool {
        if !self.is_attached(id) {
            return false;
        }
        let mut current = Some(id);
        while let Some(node) = current {
            if self.element(node).map_or(true, |element| element.hidden) {
                return false;
            }
            current = self.parent(node);
        }
        true
    }

    /// Strict descendants in document order
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).into_iter().rev());
        }
        out
    }

    /// Rendered text: own text followed by displayed children's text
    #[must_use]
    pub fn text_of(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        if let Some(element) = self.element(id) {
            if !element.text.is_empty() {
                parts.push(element.text.clone());
            }
        }
        for child in self.children(id) {
            if self.element(child).is_some_and(|element| !element.hidden) {
                let text = self.text_of(child);
                if !text.is_empty() {
                    parts.push(text);
                }
            }
        }
        parts.join(" ")
    }
}
