//! Accessible name, description and text computation.

use std::rc::Rc;

use axtree_dom::{Document, InputType, Node, NodeId};
use hashbrown::HashSet;
use tracing::trace;

/// Elements already visited by one name or text computation.
pub(crate) type Visited = HashSet<NodeId>;

/// Name and description computation over one document.
pub struct NameComputer<'a> {
    document: &'a Document,
}

impl<'a> NameComputer<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Whether an element is excluded from the tree and from text.
    ///
    /// Hidden when the `hidden` attribute is present, `aria-hidden` is
    /// `"true"`, or the computed style is `display: none` or
    /// `visibility: hidden|collapse`. A failed style computation counts as
    /// visible.
    pub fn is_hidden(&self, element: &Node) -> bool {
        if element.is_hidden() || element.get_attribute("aria-hidden") == Some("true") {
            return true;
        }

        match self.document.computed_style(element) {
            Ok(style) => style.is_display_none() || style.is_invisible(),
            Err(e) => {
                trace!(error = %e, "No computed style, treating element as visible");
                false
            }
        }
    }

    /// Accessible name of an element.
    pub fn accessible_name(&self, element: &Rc<Node>) -> String {
        let mut visited = Visited::new();
        self.name_of(element, &mut visited)
    }

    fn name_of(&self, element: &Rc<Node>, visited: &mut Visited) -> String {
        if !visited.insert(element.id) {
            return String::new();
        }

        let labelled = self.referenced_text(element, "aria-labelledby", visited);
        if !labelled.is_empty() {
            return labelled;
        }

        if let Some(label) = element.get_attribute("aria-label").map(str::trim) {
            if !label.is_empty() {
                return label.to_string();
            }
        }

        let host = host_language_name(element);
        if !host.is_empty() {
            return host;
        }

        if let Some(title) = element.get_attribute("title").map(str::trim) {
            if !title.is_empty() {
                return title.to_string();
            }
        }

        self.content_text(element, visited)
    }

    /// Accessible description: `aria-describedby` targets when the attribute
    /// holds any id, otherwise the `title` attribute.
    pub fn accessible_description(&self, element: &Rc<Node>) -> String {
        let mut visited = Visited::new();
        visited.insert(element.id);

        let described = element
            .get_attribute("aria-describedby")
            .is_some_and(|ids| !ids.trim().is_empty());
        if described {
            return self.referenced_text(element, "aria-describedby", &visited);
        }

        element
            .get_attribute("title")
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    }

    /// Text of the elements named by an IDREF list attribute, joined with
    /// single spaces. Unresolved and hidden targets are skipped.
    fn referenced_text(&self, element: &Node, attribute: &str, visited: &Visited) -> String {
        let Some(ids) = element.get_attribute(attribute) else {
            return String::new();
        };

        let mut parts = Vec::new();
        for id in ids.split_whitespace() {
            let Some(target) = self.document.get_element_by_id(id) else {
                trace!(attribute, id, "Unresolved id reference");
                continue;
            };
            if self.is_hidden(&target) {
                continue;
            }
            parts.push(self.compute_text(&target, &mut visited.clone()));
        }

        parts.join(" ").trim().to_string()
    }

    /// Text of a subtree: text nodes verbatim, each element child preceded
    /// by a space. Hidden elements and elements already on the current path
    /// yield "".
    ///
    /// `visited` holds the path from the computation root down to `element`
    /// and is restored before returning.
    fn compute_text(&self, element: &Rc<Node>, visited: &mut Visited) -> String {
        if self.is_hidden(element) || !visited.insert(element.id) {
            return String::new();
        }
        let text = self.content_text(element, visited);
        visited.remove(&element.id);
        text
    }

    fn content_text(&self, element: &Node, visited: &mut Visited) -> String {
        let mut text = String::new();
        for child in element.children() {
            if let Some(data) = child.text() {
                text.push_str(data);
            } else if child.is_element() {
                text.push(' ');
                text.push_str(&self.compute_text(&child, visited));
            }
        }
        text.trim().to_string()
    }
}

/// Name supplied by the element's own markup.
fn host_language_name(element: &Node) -> String {
    let Some(tag) = element.tag_name() else {
        return String::new();
    };

    if tag == "img" {
        return element.attribute_or_empty("alt").trim().to_string();
    }

    if tag == "button" || is_heading_tag(tag) {
        return element.text_content().trim().to_string();
    }

    if let Some(input_type) = element.input_type() {
        let value = element.attribute_or_empty("value");
        // image inputs do not take their name from value
        let is_button = input_type.is_button() && input_type != InputType::Image;
        if is_button && !value.is_empty() {
            return value.to_string();
        }
        return element.placeholder().unwrap_or_default().to_string();
    }

    String::new()
}

/// `h` followed by one or more digits.
pub(crate) fn is_heading_tag(tag: &str) -> bool {
    tag.strip_prefix('h')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_by_id(html: &str, id: &str) -> String {
        let doc = Document::parse_html(html).unwrap();
        let el = doc.get_element_by_id(id).unwrap();
        NameComputer::new(&doc).accessible_name(&el)
    }

    fn description_by_id(html: &str, id: &str) -> String {
        let doc = Document::parse_html(html).unwrap();
        let el = doc.get_element_by_id(id).unwrap();
        NameComputer::new(&doc).accessible_description(&el)
    }

    #[test]
    fn test_heading_tags() {
        assert!(is_heading_tag("h1"));
        assert!(is_heading_tag("h10"));
        assert!(!is_heading_tag("h"));
        assert!(!is_heading_tag("hr"));
        assert!(!is_heading_tag("head"));
    }

    #[test]
    fn test_labelledby_joins_targets() {
        let html = r#"<span id="a">Main</span><span id="b"> menu </span>
            <nav id="n" aria-labelledby="a missing b" aria-label="ignored"></nav>"#;
        assert_eq!(name_by_id(html, "n"), "Main menu");
    }

    #[test]
    fn test_labelledby_skips_hidden_targets() {
        let html = r#"<span id="a" hidden>Secret</span><span id="b">Shown</span>
            <div id="d" aria-labelledby="a b"></div>"#;
        assert_eq!(name_by_id(html, "d"), "Shown");
    }

    #[test]
    fn test_empty_labelledby_falls_through() {
        let html = r#"<span id="a"></span><div id="d" aria-labelledby="a" aria-label="Label"></div>"#;
        assert_eq!(name_by_id(html, "d"), "Label");
    }

    #[test]
    fn test_self_reference_terminates() {
        let html = r#"<div id="d" aria-labelledby="d">Content</div>"#;
        assert_eq!(name_by_id(html, "d"), "Content");
    }

    #[test]
    fn test_host_language_names() {
        assert_eq!(name_by_id(r#"<img id="i" alt=" Logo ">"#, "i"), "Logo");
        assert_eq!(name_by_id(r#"<button id="b"> Go <span>now</span></button>"#, "b"), "Go now");
        assert_eq!(name_by_id(r#"<h2 id="h">Pasta <em>Lovers</em></h2>"#, "h"), "Pasta Lovers");
        assert_eq!(name_by_id(r#"<input id="s" type="submit" value="Send">"#, "s"), "Send");
        assert_eq!(name_by_id(r#"<input id="t" placeholder="Search">"#, "t"), "Search");
        assert_eq!(name_by_id(r#"<input id="t" title="Query">"#, "t"), "Query");
    }

    #[test]
    fn test_aria_label_beats_host_language() {
        assert_eq!(name_by_id(r#"<img id="i" alt="alt" aria-label=" label ">"#, "i"), "label");
    }

    #[test]
    fn test_text_fallback_spaces_elements() {
        let html = r#"<a id="l" href="/">Fresh<b>pasta</b> <i hidden>no</i></a>"#;
        assert_eq!(name_by_id(html, "l"), "Fresh pasta");
    }

    #[test]
    fn test_text_skips_css_hidden() {
        let html = r#"<style>.sr { display: none }</style>
            <a id="l" href="/">Menu <span class="sr">skip</span></a>"#;
        assert_eq!(name_by_id(html, "l"), "Menu");
    }

    #[test]
    fn test_description_sources() {
        let html = r#"<p id="d1">Tasty</p><button id="b" aria-describedby="d1" title="t">x</button>"#;
        assert_eq!(description_by_id(html, "b"), "Tasty");
        assert_eq!(description_by_id(r#"<button id="b" title=" Tip ">x</button>"#, "b"), "Tip");
        assert_eq!(description_by_id(r#"<button id="b">x</button>"#, "b"), "");
    }

    #[test]
    fn test_blank_describedby_falls_back_to_title() {
        let html = r#"<button id="b" aria-describedby="   " title="Tip">x</button>"#;
        assert_eq!(description_by_id(html, "b"), "Tip");
        let html = r#"<button id="b" aria-describedby="" title="Tip">x</button>"#;
        assert_eq!(description_by_id(html, "b"), "Tip");
        // ids that resolve to nothing still win over title
        let html = r#"<button id="b" aria-describedby="gone" title="Tip">x</button>"#;
        assert_eq!(description_by_id(html, "b"), "");
    }

    #[test]
    fn test_deep_text_fallback() {
        let depth = 300;
        let html = format!(
            r#"<a id="l" href="/">{}deep{}</a>"#,
            "<span>".repeat(depth),
            "</span>".repeat(depth)
        );
        assert_eq!(name_by_id(&html, "l"), "deep");
    }
}
