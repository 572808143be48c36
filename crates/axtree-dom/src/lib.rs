//! # axtree DOM
//!
//! Read-only DOM snapshot consumed by the accessibility tree builder.
//! Uses html5ever for HTML parsing and constructs a traversable tree of
//! reference-counted nodes.
//!
//! ## Design Goals
//!
//! 1. **Standards-compliant parsing**: html5ever implements the HTML5 parsing algorithm
//! 2. **Stable identity**: every node carries a [`NodeId`] usable in visited sets
//! 3. **Query support**: element lookup by ID (first in tree order), title, body
//! 4. **Computed style**: `display` and `visibility` from UA, author and inline rules

pub mod forms;
pub mod style;

pub use forms::InputType;
pub use style::{ComputedStyle, Visibility};

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use style::StyleRule;
use thiserror::Error;
use tracing::{debug, warn};

/// Namespace of HTML elements.
pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Errors that can occur in DOM operations.
#[derive(Error, Debug)]
pub enum DomError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Unique identifier for a DOM node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Create a new NodeId.
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> usize {
        self.0
    }
}

/// An element attribute, kept in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Type of DOM node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    Document,
    DocumentType {
        name: String,
        public_id: String,
        system_id: String,
    },
    Element {
        tag_name: String,
        namespace: String,
        attributes: Vec<Attribute>,
    },
    Text(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        data: String,
    },
}

/// A DOM node.
#[derive(Debug)]
pub struct Node {
    /// Unique ID for this node.
    pub id: NodeId,
    /// Node type and associated data.
    pub node_type: NodeType,
    /// Parent node (weak reference to avoid cycles).
    parent: RefCell<Option<Weak<Node>>>,
    /// Child nodes.
    children: RefCell<Vec<Rc<Node>>>,
}

impl Node {
    /// Create a new node.
    pub fn new(id: NodeId, node_type: NodeType) -> Rc<Self> {
        Rc::new(Self {
            id,
            node_type,
            parent: RefCell::new(None),
            children: RefCell::new(Vec::new()),
        })
    }

    /// Get the tag name for element nodes.
    pub fn tag_name(&self) -> Option<&str> {
        match &self.node_type {
            NodeType::Element { tag_name, .. } => Some(tag_name),
            _ => None,
        }
    }

    /// Get the lower-cased tag name, or "" for non-elements.
    pub fn local_name(&self) -> String {
        self.tag_name().unwrap_or_default().to_ascii_lowercase()
    }

    /// Check the tag name case-insensitively.
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name().is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Namespace URL of an element.
    pub fn namespace(&self) -> Option<&str> {
        match &self.node_type {
            NodeType::Element { namespace, .. } => Some(namespace),
            _ => None,
        }
    }

    /// Check for an HTML-namespace element with the given tag.
    pub fn is_html_tag(&self, tag: &str) -> bool {
        self.namespace() == Some(HTML_NAMESPACE) && self.is_tag(tag)
    }

    /// Get an attribute value.
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes()
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    /// Get an attribute value, or "" when absent.
    pub fn attribute_or_empty(&self, name: &str) -> &str {
        self.get_attribute(name).unwrap_or_default()
    }

    /// Check whether an attribute is present.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// All attributes in source order (empty for non-elements).
    pub fn attributes(&self) -> &[Attribute] {
        match &self.node_type {
            NodeType::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// The `id` attribute, when present and non-empty.
    pub fn element_id(&self) -> Option<&str> {
        self.get_attribute("id").filter(|id| !id.is_empty())
    }

    /// Class tokens from the `class` attribute, in order, without duplicates.
    pub fn class_list(&self) -> Vec<&str> {
        let mut classes: Vec<&str> = Vec::new();
        for class in self.attribute_or_empty("class").split_ascii_whitespace() {
            if !classes.contains(&class) {
                classes.push(class);
            }
        }
        classes
    }

    /// Whether the `hidden` attribute is set.
    pub fn is_hidden(&self) -> bool {
        self.is_element() && self.has_attribute("hidden")
    }

    /// Text of a text node.
    pub fn text(&self) -> Option<&str> {
        match &self.node_type {
            NodeType::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Get the text content.
    pub fn text_content(&self) -> String {
        let mut result = String::new();
        self.collect_text(&mut result);
        result
    }

    fn collect_text(&self, result: &mut String) {
        match &self.node_type {
            NodeType::Text(text) => result.push_str(text),
            NodeType::Comment(_) | NodeType::ProcessingInstruction { .. } => {}
            _ => {
                for child in self.children.borrow().iter() {
                    child.collect_text(result);
                }
            }
        }
    }

    /// Get parent node.
    pub fn parent(&self) -> Option<Rc<Node>> {
        self.parent.borrow().as_ref().and_then(|w| w.upgrade())
    }

    /// Get the parent when it is an element.
    pub fn parent_element(&self) -> Option<Rc<Node>> {
        self.parent().filter(|p| p.is_element())
    }

    /// Get child nodes.
    pub fn children(&self) -> Vec<Rc<Node>> {
        self.children.borrow().clone()
    }

    /// Get element children.
    pub fn element_children(&self) -> Vec<Rc<Node>> {
        self.children
            .borrow()
            .iter()
            .filter(|n| n.is_element())
            .cloned()
            .collect()
    }

    /// Check if this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self.node_type, NodeType::Element { .. })
    }

    /// Check if this is a text node.
    pub fn is_text(&self) -> bool {
        matches!(self.node_type, NodeType::Text(_))
    }

    /// Append a child node.
    pub fn append_child(self: &Rc<Self>, child: Rc<Node>) {
        *child.parent.borrow_mut() = Some(Rc::downgrade(self));
        self.children.borrow_mut().push(child);
    }
}

/// A complete DOM document.
pub struct Document {
    /// Root node of the document.
    root: Rc<Node>,
    /// All nodes indexed by ID.
    nodes: HashMap<NodeId, Rc<Node>>,
    /// Elements indexed by ID attribute (first in tree order wins).
    elements_by_id: HashMap<String, Rc<Node>>,
    /// Author rules from `<style>` elements, in document order.
    author_rules: Vec<StyleRule>,
    /// Computed styles, filled on demand. The snapshot never changes.
    style_cache: RefCell<HashMap<NodeId, ComputedStyle>>,
    /// Next node ID.
    next_id: Cell<usize>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        let root = Node::new(NodeId::new(0), NodeType::Document);
        let mut nodes = HashMap::new();
        nodes.insert(NodeId::new(0), root.clone());

        Self {
            root,
            nodes,
            elements_by_id: HashMap::new(),
            author_rules: Vec::new(),
            style_cache: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
        }
    }

    /// Parse HTML and create a document.
    pub fn parse_html(html: &str) -> Result<Self, DomError> {
        debug!(len = html.len(), "Parsing HTML");

        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .map_err(|e| DomError::ParseError(e.to_string()))?;

        let mut doc = Document::new();
        doc.convert_rcdom(&dom.document, &doc.root.clone());
        doc.index_elements();
        doc.collect_author_rules();

        debug!(
            node_count = doc.nodes.len(),
            ids = doc.elements_by_id.len(),
            author_rules = doc.author_rules.len(),
            "HTML parsed"
        );
        Ok(doc)
    }

    fn convert_rcdom(&mut self, handle: &Handle, parent: &Rc<Node>) {
        for child_handle in handle.children.borrow().iter() {
            let node_type = match &child_handle.data {
                NodeData::Document => continue,
                NodeData::Doctype {
                    name,
                    public_id,
                    system_id,
                } => NodeType::DocumentType {
                    name: name.to_string(),
                    public_id: public_id.to_string(),
                    system_id: system_id.to_string(),
                },
                NodeData::Element { name, attrs, .. } => NodeType::Element {
                    tag_name: name.local.to_string(),
                    namespace: name.ns.to_string(),
                    attributes: attrs
                        .borrow()
                        .iter()
                        .map(|attr| Attribute {
                            name: attr.name.local.to_string(),
                            value: attr.value.to_string(),
                        })
                        .collect(),
                },
                NodeData::Text { contents } => NodeType::Text(contents.borrow().to_string()),
                NodeData::Comment { contents } => NodeType::Comment(contents.to_string()),
                NodeData::ProcessingInstruction { target, contents } => {
                    NodeType::ProcessingInstruction {
                        target: target.to_string(),
                        data: contents.to_string(),
                    }
                }
            };

            let id = NodeId::new(self.next_id.get());
            self.next_id.set(self.next_id.get() + 1);

            let node = Node::new(id, node_type);
            self.nodes.insert(id, node.clone());
            parent.append_child(node.clone());

            self.convert_rcdom(child_handle, &node);
        }
    }

    fn index_elements(&mut self) {
        let mut index = HashMap::new();
        self.traverse(|node| {
            if let Some(id) = node.element_id() {
                index.entry(id.to_string()).or_insert_with(|| node.clone());
            }
        });
        self.elements_by_id = index;
    }

    fn collect_author_rules(&mut self) {
        let mut sheets = Vec::new();
        self.traverse(|node| {
            if node.is_tag("style") {
                sheets.push(node.text_content());
            }
        });

        let mut order = 0;
        for css in sheets {
            match axtree_cssparser::parse_stylesheet(&css) {
                Ok(ast) => {
                    let rules = StyleRule::from_ast(&ast, order);
                    order += rules.len();
                    self.author_rules.extend(rules);
                }
                Err(e) => warn!(error = %e, "Skipping unparseable stylesheet"),
            }
        }
    }

    /// Get the document root.
    pub fn root(&self) -> &Rc<Node> {
        &self.root
    }

    /// Get the document element (<html>).
    pub fn document_element(&self) -> Option<Rc<Node>> {
        self.root.children().into_iter().find(|n| n.is_element())
    }

    /// Get the <body> element.
    pub fn body(&self) -> Option<Rc<Node>> {
        self.document_element()?
            .children()
            .into_iter()
            .find(|n| n.is_tag("body"))
    }

    /// Get element by ID.
    pub fn get_element_by_id(&self, id: &str) -> Option<Rc<Node>> {
        self.elements_by_id.get(id).cloned()
    }

    /// Number of nodes, including the document node.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document holds only its root node.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// The document title: text of the first HTML `<title>` element with
    /// ASCII whitespace stripped and collapsed; "" when there is none.
    /// SVG `<title>` elements do not count.
    pub fn title(&self) -> String {
        let mut title = None;
        self.traverse(|node| {
            if title.is_none() && node.is_html_tag("title") {
                title = Some(node.text_content());
            }
        });

        title
            .unwrap_or_default()
            .split_ascii_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Compute the style of an element.
    ///
    /// Results are cached per node, so ancestors are resolved once.
    /// Fails for nodes that are not elements.
    pub fn computed_style(&self, node: &Node) -> Result<ComputedStyle, DomError> {
        if !node.is_element() {
            return Err(DomError::InvalidOperation(format!(
                "computed style requested for non-element node {}",
                node.id.raw()
            )));
        }
        Ok(self.cached_style(node))
    }

    fn cached_style(&self, element: &Node) -> ComputedStyle {
        let cached = self.style_cache.borrow().get(&element.id).cloned();
        if let Some(style) = cached {
            return style;
        }

        let parent = element.parent_element().map(|p| self.cached_style(&p));
        let style = style::compute(element, &self.author_rules, parent.as_ref());
        self.style_cache
            .borrow_mut()
            .insert(element.id, style.clone());
        style
    }

    /// Traverse all nodes depth-first.
    pub fn traverse<F>(&self, mut callback: F)
    where
        F: FnMut(&Rc<Node>),
    {
        Self::traverse_node(&self.root, &mut callback);
    }

    fn traverse_node<F>(node: &Rc<Node>, callback: &mut F)
    where
        F: FnMut(&Rc<Node>),
    {
        callback(node);
        for child in node.children() {
            Self::traverse_node(&child, callback);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
