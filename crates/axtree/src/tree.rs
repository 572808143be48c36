//! Accessibility tree construction and queries.

use std::collections::BTreeMap;
use std::rc::Rc;

use axtree_common::{OptionExt, Result};
use axtree_dom::{Document, Node, NodeId};
use hashbrown::HashSet;
use tracing::{debug, trace};

use crate::config::{AriaProperties, TreeConfig};
use crate::name::NameComputer;
use crate::node::{AccessibleNode, PropertyValue};
use crate::role::{element_role, is_leaf_role, is_presentational_role, Role, ROOT_WEB_AREA};

/// What a tree is built over.
#[derive(Clone)]
pub enum TreeRoot<'a> {
    /// A whole document: conversion starts at `<body>`.
    Document(&'a Document),
    /// One element of a document: conversion starts at its children.
    Element {
        document: &'a Document,
        element: Rc<Node>,
    },
}

impl<'a> TreeRoot<'a> {
    /// The document ids are resolved against.
    pub fn document(&self) -> &'a Document {
        match self {
            TreeRoot::Document(document) => document,
            TreeRoot::Element { document, .. } => document,
        }
    }
}

impl<'a> From<&'a Document> for TreeRoot<'a> {
    fn from(document: &'a Document) -> Self {
        TreeRoot::Document(document)
    }
}

/// Accessibility tree over a DOM snapshot.
///
/// Empty until [`build`](Self::build) is called; building again replaces
/// the previous result.
pub struct AccessibilityTree<'a> {
    root: TreeRoot<'a>,
    config: TreeConfig,
    tree: Option<AccessibleNode>,
}

impl<'a> AccessibilityTree<'a> {
    /// Create an unbuilt tree with default options.
    pub fn new(root: impl Into<TreeRoot<'a>>) -> Self {
        Self::with_config(root, TreeConfig::default())
    }

    /// Create an unbuilt tree with the given options.
    pub fn with_config(root: impl Into<TreeRoot<'a>>, config: TreeConfig) -> Self {
        Self {
            root: root.into(),
            config,
            tree: None,
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Convert the DOM into accessible nodes under a `RootWebArea` node.
    ///
    /// Fails with `NotFound` when a document root has no document element.
    pub fn build(&mut self) -> Result<&mut Self> {
        let builder = TreeBuilder::new(self.root.document(), &self.config);

        let (start, source, name) = match &self.root {
            TreeRoot::Document(document) => {
                let html = document
                    .document_element()
                    .ok_or_not_found("document element")?;
                let start = document.body().unwrap_or_else(|| html.clone());
                (start, html, document.title())
            }
            TreeRoot::Element { element, .. } => {
                let name = element.attribute_or_empty("title").to_string();
                (element.clone(), element.clone(), name)
            }
        };

        let mut children = Vec::new();
        for child in start.element_children() {
            let mut owning = OwningChain::new();
            children.extend(builder.convert(&child, &mut owning));
        }

        let root = AccessibleNode::new(
            children,
            name,
            ROOT_WEB_AREA,
            BTreeMap::new(),
            source,
            BTreeMap::new(),
            None,
            None,
        );

        self.tree = Some(root);
        debug!(
            nodes = self.len(),
            start = %start.local_name(),
            "Built accessibility tree"
        );
        Ok(self)
    }

    /// Whether `build` has run.
    pub fn is_built(&self) -> bool {
        self.tree.is_some()
    }

    /// The root node, once built.
    pub fn to_object(&self) -> Option<&AccessibleNode> {
        self.tree.as_ref()
    }

    /// JSON of the root node; `"{}"` before `build`.
    pub fn to_json_string(&self, collapse_empty_properties: bool) -> String {
        match &self.tree {
            Some(root) => root.to_json_string(collapse_empty_properties),
            None => "{}".to_string(),
        }
    }

    /// Pre-order walk. The root is visited at depth 0 with no parent.
    pub fn traverse<'s, F>(&'s self, mut visit: F)
    where
        F: FnMut(&'s AccessibleNode, usize, Option<&'s AccessibleNode>),
    {
        if let Some(root) = &self.tree {
            Self::walk(root, 0, None, &mut visit);
        }
    }

    fn walk<'s, F>(
        node: &'s AccessibleNode,
        depth: usize,
        parent: Option<&'s AccessibleNode>,
        visit: &mut F,
    ) where
        F: FnMut(&'s AccessibleNode, usize, Option<&'s AccessibleNode>),
    {
        visit(node, depth, parent);
        for child in node.children() {
            Self::walk(child, depth + 1, Some(node), visit);
        }
    }

    /// Nodes whose role equals `role`, in traversal order.
    pub fn find_by_role(&self, role: &str) -> Vec<&AccessibleNode> {
        let mut found = Vec::new();
        self.traverse(|node, _, _| {
            if node.role() == role {
                found.push(node);
            }
        });
        found
    }

    /// Nodes with a non-empty name containing `text`, ignoring case.
    pub fn find_by_name(&self, text: &str) -> Vec<&AccessibleNode> {
        let needle = text.to_lowercase();
        let mut found = Vec::new();
        self.traverse(|node, _, _| {
            let name = node.name();
            if !name.is_empty() && name.to_lowercase().contains(&needle) {
                found.push(node);
            }
        });
        found
    }

    /// Number of nodes including the root; 0 before `build`.
    pub fn len(&self) -> usize {
        let mut count = 0;
        self.traverse(|_, _, _| count += 1);
        count
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_none()
    }
}

// ==================== Builder ====================

/// `aria-owns` targets on the path from the top-level element being
/// converted down to the current one.
type OwningChain = HashSet<NodeId>;

struct TreeBuilder<'a> {
    document: &'a Document,
    config: &'a TreeConfig,
    names: NameComputer<'a>,
}

impl<'a> TreeBuilder<'a> {
    fn new(document: &'a Document, config: &'a TreeConfig) -> Self {
        Self {
            document,
            config,
            names: NameComputer::new(document),
        }
    }

    /// Convert one element. `None` for hidden elements and for
    /// presentational elements with nothing visible inside.
    fn convert(&self, element: &Rc<Node>, owning: &mut OwningChain) -> Option<AccessibleNode> {
        if self.names.is_hidden(element) {
            return None;
        }

        let role = element_role(element);
        if is_presentational_role(&role) {
            return self.collapse_presentational(element, owning);
        }

        let name = self.names.accessible_name(element);
        let description = self.names.accessible_description(element);
        let states = self.states(element, &role);
        let properties = self.properties(element, &role);
        let value = value(element, &role);

        let mut children = Vec::new();
        if !is_leaf_role(&role) {
            for child in element.element_children() {
                children.extend(self.convert(&child, owning));
            }
        }
        self.append_owned(element, owning, &mut children);

        Some(AccessibleNode::new(
            children,
            name,
            role,
            properties,
            element.clone(),
            states,
            Some(description),
            value,
        ))
    }

    /// A `none`/`presentation` element contributes its visible children:
    /// a lone child takes its place, several are wrapped in a `group`.
    fn collapse_presentational(
        &self,
        element: &Rc<Node>,
        owning: &mut OwningChain,
    ) -> Option<AccessibleNode> {
        let mut children: Vec<AccessibleNode> = element
            .element_children()
            .iter()
            .filter_map(|child| self.convert(child, owning))
            .collect();

        match children.len() {
            0 => None,
            1 => children.pop(),
            _ => Some(AccessibleNode::new(
                children,
                "",
                Role::Group.as_str(),
                BTreeMap::new(),
                element.clone(),
                BTreeMap::new(),
                None,
                None,
            )),
        }
    }

    /// Append the targets of `aria-owns`. A target already on the owning
    /// chain is skipped, which breaks ownership cycles.
    fn append_owned(
        &self,
        element: &Node,
        owning: &mut OwningChain,
        children: &mut Vec<AccessibleNode>,
    ) {
        let Some(ids) = element.get_attribute("aria-owns") else {
            return;
        };

        for id in ids.split_whitespace() {
            let Some(owned) = self.document.get_element_by_id(id) else {
                trace!(id, "aria-owns target not found");
                continue;
            };
            if !owning.insert(owned.id) {
                trace!(id, "aria-owns cycle, skipping target");
                continue;
            }
            let node = self.convert(&owned, owning);
            owning.remove(&owned.id);
            children.extend(node);
        }
    }

    fn states(&self, element: &Node, role: &str) -> BTreeMap<String, bool> {
        let mut states = BTreeMap::new();

        for state in ["disabled", "expanded"] {
            let on = aria_true(element, state);
            if on || self.config.include_false_states {
                states.insert(state.to_string(), on);
            }
        }

        if role == Role::Checkbox.as_str() {
            let checked = aria_true(element, "checked") || element.checked();
            states.insert("checked".to_string(), checked);
        }

        states
    }

    fn properties(&self, element: &Node, role: &str) -> BTreeMap<String, PropertyValue> {
        let mut properties = BTreeMap::new();

        if role == Role::Heading.as_str() {
            if let Some(level) = heading_level(element) {
                properties.insert("level".to_string(), PropertyValue::Number(level));
            }
        }

        if self.config.aria_properties == AriaProperties::PassThrough {
            for attr in element.attributes() {
                if attr.name.len() > "aria-".len() && attr.name.starts_with("aria-") {
                    properties.insert(attr.name.clone(), PropertyValue::Text(attr.value.clone()));
                }
            }
        }

        properties
    }
}

/// `aria-<state>` is exactly `"true"` after trimming.
fn aria_true(element: &Node, state: &str) -> bool {
    element
        .get_attribute(&format!("aria-{state}"))
        .is_some_and(|v| v.trim() == "true")
}

/// Level of an `h1`..`h6` element.
fn heading_level(element: &Node) -> Option<i64> {
    match element.tag_name()? {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// `aria-valuenow` when set, else a text box's non-empty form value.
fn value(element: &Node, role: &str) -> Option<String> {
    if let Some(now) = element.get_attribute("aria-valuenow").filter(|v| !v.is_empty()) {
        return Some(now.to_string());
    }
    if role == Role::TextBox.as_str() {
        return element.form_value().filter(|v| !v.is_empty());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> Document {
        Document::parse_html(html).unwrap()
    }

    #[test]
    fn test_unbuilt_tree() {
        let doc = parse("<p>x</p>");
        let tree = AccessibilityTree::new(&doc);
        assert!(!tree.is_built());
        assert!(tree.to_object().is_none());
        assert_eq!(tree.to_json_string(false), "{}");
        assert_eq!(tree.to_json_string(true), "{}");
        assert_eq!(tree.len(), 0);

        let mut visits = 0;
        tree.traverse(|_, _, _| visits += 1);
        assert_eq!(visits, 0);
    }

    #[test]
    fn test_root_web_area() {
        let doc = parse("<title> My   Page </title><p>x</p>");
        let mut tree = AccessibilityTree::new(&doc);
        tree.build().unwrap();

        let root = tree.to_object().unwrap();
        assert_eq!(root.role(), "RootWebArea");
        assert_eq!(root.name(), "My Page");
        assert!(root.description().is_none());
        assert!(Rc::ptr_eq(root.source(), &doc.document_element().unwrap()));
        assert_eq!(root.children().len(), 1);
        assert_eq!(root.children()[0].role(), "generic");
    }

    #[test]
    fn test_element_root() {
        let doc = parse(r#"<main id="m"><h2>Hi</h2><p>x</p></main><p>outside</p>"#);
        let main = doc.get_element_by_id("m").unwrap();
        let mut tree = AccessibilityTree::new(TreeRoot::Element {
            document: &doc,
            element: main.clone(),
        });
        tree.build().unwrap();

        let root = tree.to_object().unwrap();
        assert_eq!(root.name(), "");
        assert!(Rc::ptr_eq(root.source(), &main));
        let roles: Vec<_> = root.children().iter().map(|c| c.role()).collect();
        assert_eq!(roles, ["heading", "generic"]);
    }

    #[test]
    fn test_element_root_named_by_title_attribute() {
        let doc = parse(r#"<title>Page</title><nav id="n" title="Menu"><a href="/">Home</a></nav>"#);
        let nav = doc.get_element_by_id("n").unwrap();
        let mut tree = AccessibilityTree::new(TreeRoot::Element {
            document: &doc,
            element: nav,
        });
        tree.build().unwrap();

        let root = tree.to_object().unwrap();
        assert_eq!(root.role(), "RootWebArea");
        assert_eq!(root.name(), "Menu");
        assert_eq!(root.children()[0].name(), "Home");
    }

    #[test]
    fn test_rebuild_overwrites() {
        let doc = parse("<p>x</p>");
        let mut tree = AccessibilityTree::new(&doc);
        let first = tree.build().unwrap().len();
        let second = tree.build().unwrap().len();
        assert_eq!(first, second);
        assert_eq!(first, 2);
    }

    #[test]
    fn test_traverse_depth_and_parent() {
        let doc = parse("<ul><li>a</li><li>b</li></ul>");
        let mut tree = AccessibilityTree::new(&doc);
        tree.build().unwrap();

        let mut seen = Vec::new();
        tree.traverse(|node, depth, parent| {
            seen.push((node.role().to_string(), depth, parent.map(|p| p.role().to_string())));
        });
        assert_eq!(
            seen,
            vec![
                ("RootWebArea".to_string(), 0, None),
                ("list".to_string(), 1, Some("RootWebArea".to_string())),
                ("listitem".to_string(), 2, Some("list".to_string())),
                ("listitem".to_string(), 2, Some("list".to_string())),
            ]
        );
    }

    #[test]
    fn test_leaf_roles_have_no_children() {
        let doc = parse("<button><span>Go</span></button>");
        let mut tree = AccessibilityTree::new(&doc);
        tree.build().unwrap();
        let button = tree.find_by_role("button")[0];
        assert!(button.children().is_empty());
        assert_eq!(button.name(), "Go");
    }

    #[test]
    fn test_heading_level() {
        let doc = parse(r#"<h4>a</h4><div role="heading">b</div>"#);
        let mut tree = AccessibilityTree::new(&doc);
        tree.build().unwrap();
        let headings = tree.find_by_role("heading");
        assert_eq!(headings[0].property("level"), Some(&PropertyValue::Number(4)));
        assert!(headings[1].property("level").is_none());
    }

    #[test]
    fn test_values() {
        let doc = parse(
            r#"<div role="slider" aria-valuenow="7"></div><input value="typed"><input value=""><textarea>notes</textarea>"#,
        );
        let mut tree = AccessibilityTree::with_config(&doc, TreeConfig::default());
        tree.build().unwrap();
        let root = tree.to_object().unwrap();
        let values: Vec<_> = root.children().iter().map(|c| c.value()).collect();
        assert_eq!(values, [Some("7"), Some("typed"), None, None]);
    }

    #[test]
    fn test_textarea_role_is_generic() {
        let doc = parse(r#"<textarea role="textbox">notes</textarea>"#);
        let mut tree = AccessibilityTree::new(&doc);
        tree.build().unwrap();
        assert_eq!(tree.find_by_role("textbox")[0].value(), Some("notes"));
    }

    #[test]
    fn test_missing_owns_target_ignored() {
        let doc = parse(r#"<div aria-owns="nope">x</div>"#);
        let mut tree = AccessibilityTree::new(&doc);
        tree.build().unwrap();
        assert_eq!(tree.len(), 2);
    }
}
