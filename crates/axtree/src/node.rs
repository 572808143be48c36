//! Accessible nodes and their JSON forms.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use axtree_dom::Node;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tracing::error;

/// Value of a node property: heading levels are numbers, ARIA attributes
/// are passed through as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(i64),
    Text(String),
}

impl PropertyValue {
    /// The string form, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            PropertyValue::Number(_) => None,
        }
    }

    /// The numeric form, if this is a number.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            PropertyValue::Text(_) => None,
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

/// A node in the accessibility tree.
///
/// Immutable once built. `source` points back at the DOM element the node
/// was derived from; it is shared, not copied, and takes no part in
/// equality.
#[derive(Clone, Serialize)]
pub struct AccessibleNode {
    children: Vec<AccessibleNode>,
    name: String,
    role: String,
    properties: BTreeMap<String, PropertyValue>,
    #[serde(serialize_with = "serialize_opaque")]
    source: Rc<Node>,
    states: BTreeMap<String, bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

impl AccessibleNode {
    /// Create a node.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        children: Vec<AccessibleNode>,
        name: impl Into<String>,
        role: impl Into<String>,
        properties: BTreeMap<String, PropertyValue>,
        source: Rc<Node>,
        states: BTreeMap<String, bool>,
        description: Option<String>,
        value: Option<String>,
    ) -> Self {
        Self {
            children,
            name: name.into(),
            role: role.into(),
            properties,
            source,
            states,
            description,
            value,
        }
    }

    pub fn children(&self) -> &[AccessibleNode] {
        &self.children
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.properties
    }

    /// Look up a single property.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// The originating DOM element.
    pub fn source(&self) -> &Rc<Node> {
        &self.source
    }

    pub fn states(&self) -> &BTreeMap<String, bool> {
        &self.states
    }

    /// Look up a single state; `None` when the state was not emitted.
    pub fn state(&self, name: &str) -> Option<bool> {
        self.states.get(name).copied()
    }

    /// `None` when no description was computed (synthetic nodes).
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// CSS selector locating `source` in its document.
    pub fn unique_selector(&self) -> String {
        unique_selector(&self.source)
    }

    /// JSON text with four-space indentation.
    ///
    /// The raw form keeps every computed field and writes `source` as an
    /// empty object. The collapsed form drops null, empty and blank members
    /// and writes `source` as its unique selector.
    pub fn to_json_string(&self, collapse_empty_properties: bool) -> String {
        let written = if collapse_empty_properties {
            write_pretty(&Collapsed(self))
        } else {
            write_pretty(self)
        };

        written.unwrap_or_else(|e| {
            error!(error = %e, role = %self.role, "Failed to serialize accessible node");
            "{}".to_string()
        })
    }

    /// Structured form of [`to_json_string`](Self::to_json_string).
    pub fn to_json_value(&self, collapse_empty_properties: bool) -> serde_json::Result<serde_json::Value> {
        if collapse_empty_properties {
            serde_json::to_value(Collapsed(self))
        } else {
            serde_json::to_value(self)
        }
    }
}

impl PartialEq for AccessibleNode {
    fn eq(&self, other: &Self) -> bool {
        self.children == other.children
            && self.name == other.name
            && self.role == other.role
            && self.properties == other.properties
            && self.states == other.states
            && self.description == other.description
            && self.value == other.value
    }
}

impl fmt::Debug for AccessibleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessibleNode")
            .field("role", &self.role)
            .field("name", &self.name)
            .field("properties", &self.properties)
            .field("states", &self.states)
            .field("description", &self.description)
            .field("value", &self.value)
            .field("source", &format_args!("<{}>", self.source.local_name()))
            .field("children", &self.children)
            .finish()
    }
}

fn serialize_opaque<S: Serializer>(_: &Rc<Node>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_map(Some(0))?.end()
}

fn write_pretty<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

// ==================== Collapsed form ====================

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Node view that omits null, empty and blank members at every level.
struct Collapsed<'a>(&'a AccessibleNode);

struct CollapsedChildren<'a>(&'a [AccessibleNode]);

struct CollapsedProperties<'a>(&'a BTreeMap<String, PropertyValue>);

impl Serialize for Collapsed<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = self.0;
        let mut map = serializer.serialize_map(None)?;

        if !node.children.is_empty() {
            map.serialize_entry("children", &CollapsedChildren(&node.children))?;
        }
        if !is_blank(&node.name) {
            map.serialize_entry("name", &node.name)?;
        }
        if !is_blank(&node.role) {
            map.serialize_entry("role", &node.role)?;
        }
        let properties = CollapsedProperties(&node.properties);
        if properties.entries().next().is_some() {
            map.serialize_entry("properties", &properties)?;
        }
        let selector = node.unique_selector();
        if !is_blank(&selector) {
            map.serialize_entry("source", &selector)?;
        }
        if !node.states.is_empty() {
            map.serialize_entry("states", &node.states)?;
        }
        if let Some(description) = node.description.as_deref().filter(|d| !is_blank(d)) {
            map.serialize_entry("description", description)?;
        }
        if let Some(value) = node.value.as_deref().filter(|v| !is_blank(v)) {
            map.serialize_entry("value", value)?;
        }

        map.end()
    }
}

impl Serialize for CollapsedChildren<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(Collapsed))
    }
}

impl<'a> CollapsedProperties<'a> {
    fn entries(&self) -> impl Iterator<Item = (&'a String, &'a PropertyValue)> {
        self.0
            .iter()
            .filter(|(_, v)| v.as_str().map_or(true, |s| !is_blank(s)))
    }
}

impl Serialize for CollapsedProperties<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries())
    }
}

// ==================== Selectors ====================

/// Build a selector for `element` by walking up to the nearest ancestor
/// with an id (or the document root).
///
/// Each step is `#id`, which ends the walk, or `tag.class…` followed by
/// `:nth-of-type(k)` when the parent holds more than one element of that
/// tag. Steps are joined with the child combinator.
pub fn unique_selector(element: &Rc<Node>) -> String {
    let mut steps = Vec::new();
    let mut current = Some(element.clone());

    while let Some(el) = current {
        if let Some(id) = el.element_id() {
            steps.push(format!("#{id}"));
            break;
        }

        let mut step = el.local_name();
        for class in el.class_list() {
            step.push('.');
            step.push_str(class);
        }

        if let Some(parent) = el.parent() {
            let same_tag: Vec<_> = parent
                .element_children()
                .into_iter()
                .filter(|sibling| sibling.tag_name() == el.tag_name())
                .collect();
            if same_tag.len() > 1 {
                if let Some(index) = same_tag.iter().position(|sibling| sibling.id == el.id) {
                    step.push_str(&format!(":nth-of-type({})", index + 1));
                }
            }
        }

        steps.push(step);
        current = el.parent_element();
    }

    steps.reverse();
    steps.join(" > ")
}
