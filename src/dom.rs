//! The retained tag tree.
//!
//! Nodes live in an arena owned by the [`Document`] and refer to each
//! other by index.  A parent owns its children list; the `parent` index is
//! only used for upward queries such as selector matching.

use crate::css::SelectorNode;
use crate::gopher::GopherLink;
use crate::render::settings::{RendererKind, Settings};
use crate::Placement;

pub(crate) type NodeId = usize;

/// A renderer bound to a node once the tree is complete.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Assignment {
    pub kind: RendererKind,
    pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Element {
    pub name: String,
    /// In source order; only the first of any repeated name is kept.
    pub attrs: Vec<(String, String)>,
    pub classes: Vec<String>,
    pub id: Option<String>,
}

impl Element {
    pub fn new(name: &str, attrs: Vec<(String, String)>) -> Element {
        let mut unique: Vec<(String, String)> = Vec::with_capacity(attrs.len());
        for (key, value) in attrs {
            let key = key.to_ascii_lowercase();
            if !unique.iter().any(|(k, _)| *k == key) {
                unique.push((key, value));
            }
        }
        let mut element = Element {
            name: name.to_ascii_lowercase(),
            attrs: unique,
            classes: Vec::new(),
            id: None,
        };
        element.classes = element
            .attr("class")
            .map(|c| c.split_whitespace().map(String::from).collect())
            .unwrap_or_default();
        element.id = element.attr("id").map(String::from);
        element
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// The link part of an `a` or `img` element.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Link {
    pub href: String,
    pub title: Option<String>,
    /// Footnote number, for links which aren't placed inline.
    pub reference: Option<usize>,
    pub placement: Placement,
    pub gopher: GopherLink,
    pub is_image: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NodeData {
    Element(Element),
    Link { element: Element, link: Link },
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub data: NodeData,
    pub closed: bool,
    pub renderer: Option<Assignment>,
    /// The renderer for the extracted form of a link.
    pub extracted: Option<Assignment>,
}

impl Node {
    pub fn element(&self) -> Option<&Element> {
        match &self.data {
            NodeData::Element(element) | NodeData::Link { element, .. } => Some(element),
            NodeData::Text(_) => None,
        }
    }

    pub fn link(&self) -> Option<&Link> {
        match &self.data {
            NodeData::Link { link, .. } => Some(link),
            _ => None,
        }
    }

    pub fn tag_name(&self) -> Option<&str> {
        self.element().map(|e| e.name.as_str())
    }
}

#[derive(Debug, Default)]
pub(crate) struct Document {
    pub nodes: Vec<Node>,
    pub roots: Vec<NodeId>,
    /// Links waiting to be rendered at the end of the document.
    pub footer_links: Vec<NodeId>,
}

impl Document {
    pub fn new() -> Document {
        Default::default()
    }

    /// Add a node as the last child of `parent` (or as a new root).
    pub fn append(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        let id = self.nodes.len();
        let closed = matches!(data, NodeData::Text(_));
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            data,
            closed,
            renderer: None,
            extracted: None,
        });
        match parent {
            Some(p) => self.nodes[p].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    /// The children of `parent`, or the roots.
    pub fn siblings_of(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            Some(p) => &self.nodes[p].children,
            None => &self.roots,
        }
    }

    pub fn get(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { doc: self, id }
    }

    /// Every node in document order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id].children.iter().rev());
        }
        out
    }
}

/// A borrowed view of an element, used for selector matching.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NodeRef<'a> {
    pub doc: &'a Document,
    pub id: NodeId,
}

impl<'a> NodeRef<'a> {
    fn element(&self) -> Option<&'a Element> {
        self.doc.nodes[self.id].element()
    }

    fn element_siblings(&self) -> impl Iterator<Item = NodeId> + 'a {
        let doc = self.doc;
        doc.siblings_of(doc.nodes[self.id].parent)
            .iter()
            .copied()
            .filter(move |&id| doc.nodes[id].element().is_some())
    }
}

impl<'a> SelectorNode for NodeRef<'a> {
    fn tag_name(&self) -> &str {
        self.element().map(|e| e.name.as_str()).unwrap_or("")
    }

    fn id(&self) -> Option<&str> {
        self.element().and_then(|e| e.id.as_deref())
    }

    fn has_class(&self, class: &str) -> bool {
        self.element()
            .map(|e| e.classes.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.element().and_then(|e| e.attr(name))
    }

    fn parent(&self) -> Option<Self> {
        self.doc.nodes[self.id].parent.map(|id| NodeRef { doc: self.doc, id })
    }

    fn prev_sibling(&self) -> Option<Self> {
        let mut prev = None;
        for id in self.element_siblings() {
            if id == self.id {
                return prev.map(|id| NodeRef { doc: self.doc, id });
            }
            prev = Some(id);
        }
        None
    }

    fn sibling_position(&self) -> (usize, usize) {
        let mut index = 0;
        let mut count = 0;
        for id in self.element_siblings() {
            if id == self.id {
                index = count;
            }
            count += 1;
        }
        (index, count)
    }
}
