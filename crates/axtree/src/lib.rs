//! # axtree
//!
//! Accessibility trees for HTML snapshots.
//!
//! A parsed [`Document`] (or one of its elements) is converted into a tree
//! of [`AccessibleNode`]s: each visible element gets a role, an accessible
//! name and description, ARIA states and properties, and a value.
//! `aria-owns` re-parents elements, presentational elements are collapsed,
//! and hidden content is pruned.
//!
//! ```text
//! HTML ──parse_dom──► Document ──AccessibilityTree::build──► RootWebArea
//!                                                              ├── role/name
//!                                                              ├── states
//!                                                              └── children…
//! ```
//!
//! ## Example
//!
//! ```
//! use axtree::{parse_dom, AccessibilityTree};
//!
//! let document = parse_dom("<title>Menu</title><button>Order</button>").unwrap();
//! let mut tree = AccessibilityTree::new(&document);
//! tree.build().unwrap();
//!
//! let buttons = tree.find_by_role("button");
//! assert_eq!(buttons[0].name(), "Order");
//! ```

pub mod config;
pub mod name;
pub mod node;
pub mod role;
pub mod tree;

pub use axtree_common::{AxError, Result};
pub use axtree_dom::{Document, Node};
pub use config::{AriaProperties, TreeConfig};
pub use name::NameComputer;
pub use node::{unique_selector, AccessibleNode, PropertyValue};
pub use role::{Role, ROOT_WEB_AREA};
pub use tree::{AccessibilityTree, TreeRoot};

use tracing::debug;

/// Parse markup into a document snapshot.
///
/// A parser failure is reported as a configuration error.
pub fn parse_dom(html: &str) -> Result<Document> {
    let document = Document::parse_html(html)
        .map_err(|e| AxError::config_with_source("HTML parser unavailable or failed", e))?;
    debug!(nodes = document.len(), "Parsed document");
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dom() {
        let document = parse_dom("<p>hello</p>").unwrap();
        assert!(document.body().is_some());
        assert!(!document.is_empty());
    }

    #[test]
    fn test_parse_dom_tolerates_broken_markup() {
        let document = parse_dom("<div><span>unclosed").unwrap();
        let mut tree = AccessibilityTree::new(&document);
        tree.build().unwrap();
        assert_eq!(tree.len(), 3);
    }
}
