//! ARIA roles known to the tree builder.
//!
//! Nodes carry their role as a string: an explicit `role` attribute is
//! kept verbatim even when it names a role outside this table.

use axtree_dom::{InputType, Node};

/// Role of the synthetic node wrapping a built tree.
pub const ROOT_WEB_AREA: &str = "RootWebArea";

/// ARIA role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    // Landmark roles
    Banner,
    ContentInfo,
    Main,
    Navigation,
    Region,

    // Document structure
    Heading,
    Group,
    Img,
    List,
    ListItem,
    Presentation,
    None,

    // Widget roles
    Button,
    Checkbox,
    Link,
    Option,
    Radio,
    Slider,
    TextBox,

    // Generic
    Generic,
}

impl Role {
    /// Parse a role token. Role tokens are matched exactly.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "banner" => Some(Self::Banner),
            "contentinfo" => Some(Self::ContentInfo),
            "main" => Some(Self::Main),
            "navigation" => Some(Self::Navigation),
            "region" => Some(Self::Region),
            "heading" => Some(Self::Heading),
            "group" => Some(Self::Group),
            "img" => Some(Self::Img),
            "list" => Some(Self::List),
            "listitem" => Some(Self::ListItem),
            "presentation" => Some(Self::Presentation),
            "none" => Some(Self::None),
            "button" => Some(Self::Button),
            "checkbox" => Some(Self::Checkbox),
            "link" => Some(Self::Link),
            "option" => Some(Self::Option),
            "radio" => Some(Self::Radio),
            "slider" => Some(Self::Slider),
            "textbox" => Some(Self::TextBox),
            "generic" => Some(Self::Generic),
            _ => None,
        }
    }

    /// The role token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Banner => "banner",
            Self::ContentInfo => "contentinfo",
            Self::Main => "main",
            Self::Navigation => "navigation",
            Self::Region => "region",
            Self::Heading => "heading",
            Self::Group => "group",
            Self::Img => "img",
            Self::List => "list",
            Self::ListItem => "listitem",
            Self::Presentation => "presentation",
            Self::None => "none",
            Self::Button => "button",
            Self::Checkbox => "checkbox",
            Self::Link => "link",
            Self::Option => "option",
            Self::Radio => "radio",
            Self::Slider => "slider",
            Self::TextBox => "textbox",
            Self::Generic => "generic",
        }
    }

    /// Leaf roles never expose their DOM children.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            Role::Button
                | Role::Checkbox
                | Role::Img
                | Role::Option
                | Role::Radio
                | Role::Slider
                | Role::TextBox
        )
    }

    /// `none` and `presentation` remove the element's own semantics.
    pub fn is_presentational(&self) -> bool {
        matches!(self, Role::None | Role::Presentation)
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Generic
    }
}

/// Check a role string against the leaf set.
pub fn is_leaf_role(role: &str) -> bool {
    Role::from_str(role).is_some_and(|r| r.is_leaf())
}

/// Check a role string against `none` / `presentation`.
pub fn is_presentational_role(role: &str) -> bool {
    Role::from_str(role).is_some_and(|r| r.is_presentational())
}

/// Role of an element: a non-blank `role` attribute (trimmed), otherwise
/// the implicit role of its tag.
pub fn element_role(element: &Node) -> String {
    match element.get_attribute("role").map(str::trim) {
        Some(explicit) if !explicit.is_empty() => explicit.to_string(),
        _ => implicit_role(element).as_str().to_string(),
    }
}

/// Implicit role from the element's tag, first match wins.
pub fn implicit_role(element: &Node) -> Role {
    let Some(tag) = element.tag_name() else {
        return Role::Generic;
    };

    match tag {
        "a" if element.has_attribute("href") => Role::Link,
        "button" => Role::Button,
        "img" => Role::Img,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Role::Heading,
        "ul" | "ol" => Role::List,
        "li" => Role::ListItem,
        "nav" => Role::Navigation,
        "main" => Role::Main,
        "header" => Role::Banner,
        "footer" => Role::ContentInfo,
        "section" | "article" => Role::Region,
        "input" => match element.input_type().unwrap_or_default() {
            t if t.is_button() => Role::Button,
            InputType::Checkbox => Role::Checkbox,
            InputType::Radio => Role::Radio,
            InputType::Range => Role::Slider,
            _ => Role::TextBox,
        },
        _ => Role::Generic,
    }
}
