//! Arena representation of parsed page content.
//!
//! Nodes live in one flat vector and refer to each other by index, so
//! locator resolution is a pure lookup over indices with no node
//! references held across cycles. The arena is rebuilt from scratch on
//! every poll; only the structural path survives between cycles.

use scraper::{Html, Node};

/// Index of a node within a [`DomTree`] arena.
pub type NodeId = usize;

/// Payload of an arena node. Comments, doctypes, and whitespace-only
/// text are dropped at build time.
#[derive(Debug, Clone)]
pub enum DomData {
    Element { tag: String },
    Text { text: String },
}

#[derive(Debug, Clone)]
pub struct DomNode {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub data: DomData,
}

/// A parsed page as a flat arena rooted at the `html` element.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<DomNode>,
}

impl DomTree {
    /// Parses HTML into an arena. The parser always produces an `html`
    /// root element, even for empty or malformed input.
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let mut tree = DomTree { nodes: Vec::new() };
        let root_id = tree.push(None, DomData::Element {
            tag: root.value().name().to_ascii_lowercase(),
        });
        tree.build(*root, root_id);
        tree
    }

    fn build(&mut self, node: scraper::ego_tree::NodeRef<'_, Node>, parent: NodeId) {
        for child in node.children() {
            match child.value() {
                Node::Element(element) => {
                    let id = self.push(Some(parent), DomData::Element {
                        tag: element.name().to_ascii_lowercase(),
                    });
                    self.build(child, id);
                }
                Node::Text(text) => {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        self.push(Some(parent), DomData::Text { text: trimmed.to_string() });
                    }
                }
                _ => {}
            }
        }
    }

    fn push(&mut self, parent: Option<NodeId>, data: DomData) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(DomNode { parent, children: Vec::new(), data });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }
        id
    }

    /// The `html` root element.
    pub fn root(&self) -> NodeId {
        0
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// Tag name for element nodes, `None` for text nodes.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].data {
            DomData::Element { tag } => Some(tag),
            DomData::Text { .. } => None,
        }
    }

    /// Trimmed text for text nodes, `None` for elements.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].data {
            DomData::Text { text } => Some(text),
            DomData::Element { .. } => None,
        }
    }

    /// All text nodes in document order. Arena ids are assigned in
    /// depth-first preorder, so a plain scan preserves document order.
    pub fn text_nodes(&self) -> impl Iterator<Item = (NodeId, &str)> {
        self.nodes.iter().enumerate().filter_map(|(id, node)| match &node.data {
            DomData::Text { text } => Some((id, text.as_str())),
            DomData::Element { .. } => None,
        })
    }

    /// Element children of a node, in document order.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id].children.iter().copied().filter(|&child| self.tag(child).is_some())
    }

    /// Number of preceding siblings sharing this element's tag name.
    pub fn preceding_same_tag(&self, id: NodeId) -> usize {
        let Some(tag) = self.tag(id) else { return 0 };
        let Some(parent) = self.parent(id) else { return 0 };
        self.nodes[parent]
            .children
            .iter()
            .take_while(|&&sibling| sibling != id)
            .filter(|&&sibling| self.tag(sibling) == Some(tag))
            .count()
    }

    /// Concatenated trimmed text of all text descendants, in document
    /// order, joined with single spaces.
    pub fn descendant_text(&self, id: NodeId) -> String {
        let mut parts: Vec<&str> = Vec::new();
        self.collect_text(id, &mut parts);
        parts.join(" ")
    }

    fn collect_text<'a>(&'a self, id: NodeId, parts: &mut Vec<&'a str>) {
        match &self.nodes[id].data {
            DomData::Text { text } => parts.push(text),
            DomData::Element { .. } => {
                for &child in &self.nodes[id].children {
                    self.collect_text(child, parts);
                }
            }
        }
    }
}
