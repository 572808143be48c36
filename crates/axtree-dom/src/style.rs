//! Computed style for the two properties the accessibility tree needs:
//! `display` and `visibility`.
//!
//! Cascade order, lowest to highest: user-agent rules, author rules from
//! `<style>` elements, the inline `style` attribute. Within an origin, higher
//! specificity and then later source order wins; `!important` beats every
//! normal declaration. `visibility` inherits, `display` does not.

use crate::Node;
use axtree_cssparser::{parse_declarations, parse_stylesheet, DeclarationAst, StylesheetAst};
use std::sync::OnceLock;

const UA_STYLESHEET: &str = r#"
    [hidden], area, base, basefont, datalist, head, link, meta, noembed,
    noframes, param, rp, script, style, template, title { display: none; }
    input[type=hidden i] { display: none !important; }
    html, body, address, blockquote, center, div, figure, figcaption, footer,
    form, header, hr, legend, listing, main, p, plaintext, pre, search,
    xmp, article, aside, h1, h2, h3, h4, h5, h6, hgroup, nav, section,
    dir, dd, dl, dt, menu, ol, ul, fieldset, details, summary { display: block; }
    li { display: list-item; }
    table { display: table; }
    tr { display: table-row; }
    td, th { display: table-cell; }
"#;

/// Computed `visibility`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    Collapse,
}

impl Visibility {
    fn from_keyword(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "visible" => Some(Self::Visible),
            "hidden" => Some(Self::Hidden),
            "collapse" => Some(Self::Collapse),
            _ => None,
        }
    }
}

/// Style values resolved for one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedStyle {
    /// Lower-cased `display` keyword.
    pub display: String,
    pub visibility: Visibility,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: "inline".to_string(),
            visibility: Visibility::Visible,
        }
    }
}

impl ComputedStyle {
    /// `display: none`.
    pub fn is_display_none(&self) -> bool {
        self.display == "none"
    }

    /// `visibility: hidden` or `visibility: collapse`.
    pub fn is_invisible(&self) -> bool {
        matches!(self.visibility, Visibility::Hidden | Visibility::Collapse)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Origin {
    UserAgent,
    Author,
    Inline,
}

/// (ids, classes and attributes, tags)
type Specificity = (u32, u32, u32);

/// A rule with one complex selector; selector lists are split on parse.
#[derive(Debug, Clone)]
pub(crate) struct StyleRule {
    selector: Selector,
    declarations: Vec<DeclarationAst>,
    order: usize,
}

impl StyleRule {
    /// Flatten a stylesheet into rules, numbering them from `first_order`.
    /// Selectors outside the supported subset are dropped.
    pub(crate) fn from_ast(ast: &StylesheetAst, first_order: usize) -> Vec<StyleRule> {
        let mut rules = Vec::new();
        for rule in &ast.rules {
            for part in rule.selector.split(',') {
                if let Some(selector) = Selector::parse(part) {
                    rules.push(StyleRule {
                        selector,
                        declarations: rule.declarations.clone(),
                        order: first_order + rules.len(),
                    });
                }
            }
        }
        rules
    }
}

fn ua_rules() -> &'static [StyleRule] {
    static RULES: OnceLock<Vec<StyleRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        parse_stylesheet(UA_STYLESHEET)
            .map(|ast| StyleRule::from_ast(&ast, 0))
            .unwrap_or_default()
    })
}

/// Compute the style of an element against the UA sheet and `author_rules`.
/// `parent` is the computed style of the parent element, if any.
pub(crate) fn compute(
    element: &Node,
    author_rules: &[StyleRule],
    parent: Option<&ComputedStyle>,
) -> ComputedStyle {
    let parent = parent.cloned().unwrap_or_default();
    let inline = parse_declarations(element.attribute_or_empty("style"));

    let display = cascaded_value(element, "display", author_rules, &inline)
        .map(|v| v.to_ascii_lowercase());
    let display = match display.as_deref() {
        Some("inherit") => parent.display,
        Some("initial") | Some("unset") | None => ComputedStyle::default().display,
        Some(value) => value.to_string(),
    };

    let visibility = match cascaded_value(element, "visibility", author_rules, &inline) {
        Some(value) => Visibility::from_keyword(&value)
            .unwrap_or_else(|| match value.trim().to_ascii_lowercase().as_str() {
                "initial" => Visibility::Visible,
                _ => parent.visibility,
            }),
        None => parent.visibility,
    };

    ComputedStyle {
        display,
        visibility,
    }
}

fn cascaded_value(
    element: &Node,
    property: &str,
    author_rules: &[StyleRule],
    inline: &[DeclarationAst],
) -> Option<String> {
    let mut winner: Option<((bool, Origin, Specificity, usize), &str)> = None;
    let rules = ua_rules()
        .iter()
        .map(|r| (Origin::UserAgent, r))
        .chain(author_rules.iter().map(|r| (Origin::Author, r)));

    for (origin, rule) in rules {
        if !rule.selector.matches(element) {
            continue;
        }
        for decl in rule.declarations.iter().filter(|d| d.property == property) {
            let key = (decl.important, origin, rule.selector.specificity, rule.order);
            if winner.as_ref().map_or(true, |(best, _)| key >= *best) {
                winner = Some((key, decl.value.as_str()));
            }
        }
    }

    for (order, decl) in inline.iter().enumerate() {
        if decl.property != property {
            continue;
        }
        let key = (decl.important, Origin::Inline, (0, 0, 0), order);
        if winner.as_ref().map_or(true, |(best, _)| key >= *best) {
            winner = Some((key, decl.value.as_str()));
        }
    }

    winner.map(|(_, value)| value.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct AttributeMatch {
    name: String,
    value: Option<String>,
    case_insensitive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeMatch>,
}

impl Compound {
    fn matches(&self, element: &Node) -> bool {
        if !element.is_element() {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !element.is_tag(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.get_attribute("id") != Some(id.as_str()) {
                return false;
            }
        }
        let classes = element.class_list();
        if !self.classes.iter().all(|c| classes.contains(&c.as_str())) {
            return false;
        }
        self.attributes.iter().all(|attr| {
            match (element.get_attribute(&attr.name), &attr.value) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some(expected)) if attr.case_insensitive => {
                    actual.eq_ignore_ascii_case(expected)
                }
                (Some(actual), Some(expected)) => actual == expected,
            }
        })
    }

    fn specificity(&self) -> Specificity {
        (
            self.id.is_some() as u32,
            (self.classes.len() + self.attributes.len()) as u32,
            self.tag.is_some() as u32,
        )
    }
}

/// A complex selector: compounds joined by descendant or child combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Selector {
    /// Rightmost compound first; each entry's combinator links it to the
    /// next (more leftward) compound.
    parts: Vec<(Compound, Option<Combinator>)>,
    specificity: Specificity,
}

impl Selector {
    /// Parse one complex selector. Returns `None` for anything outside the
    /// supported subset (pseudo-classes, sibling combinators, namespaces).
    fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        let mut compounds: Vec<Compound> = Vec::new();
        let mut combinators: Vec<Combinator> = Vec::new();
        let mut chars = input.chars().peekable();
        let mut pending: Option<Combinator> = None;

        while chars.peek().is_some() {
            let mut saw_space = false;
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
                saw_space = true;
            }
            if chars.peek() == Some(&'>') {
                chars.next();
                pending = Some(Combinator::Child);
                continue;
            }
            if chars.peek().is_none() {
                break;
            }
            if saw_space && pending.is_none() && !compounds.is_empty() {
                pending = Some(Combinator::Descendant);
            }

            let compound = parse_compound(&mut chars)?;
            if !compounds.is_empty() {
                combinators.push(pending.take()?);
            } else if pending.is_some() {
                return None;
            }
            compounds.push(compound);
        }

        if compounds.is_empty() || pending.is_some() {
            return None;
        }

        let specificity = compounds.iter().fold((0, 0, 0), |acc, c| {
            let s = c.specificity();
            (acc.0 + s.0, acc.1 + s.1, acc.2 + s.2)
        });

        let mut parts = Vec::with_capacity(compounds.len());
        for (i, compound) in compounds.into_iter().enumerate().rev() {
            let combinator = if i == 0 { None } else { Some(combinators[i - 1]) };
            parts.push((compound, combinator));
        }

        Some(Self { parts, specificity })
    }

    fn matches(&self, element: &Node) -> bool {
        Self::matches_from(&self.parts, element)
    }

    fn matches_from(parts: &[(Compound, Option<Combinator>)], element: &Node) -> bool {
        let Some(((compound, combinator), rest)) = parts.split_first() else {
            return true;
        };
        if !compound.matches(element) {
            return false;
        }
        match combinator {
            None => true,
            Some(Combinator::Child) => element
                .parent_element()
                .is_some_and(|parent| Self::matches_from(rest, &parent)),
            Some(Combinator::Descendant) => {
                let mut ancestor = element.parent_element();
                while let Some(current) = ancestor {
                    if Self::matches_from(rest, &current) {
                        return true;
                    }
                    ancestor = current.parent_element();
                }
                false
            }
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        ident.push(c);
        chars.next();
    }
    (!ident.is_empty()).then_some(ident)
}

fn parse_compound(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<Compound> {
    let mut compound = Compound::default();
    let mut any = false;

    loop {
        match chars.peek() {
            Some('*') => {
                chars.next();
            }
            Some('#') => {
                chars.next();
                compound.id = Some(take_ident(chars)?);
            }
            Some('.') => {
                chars.next();
                compound.classes.push(take_ident(chars)?);
            }
            Some('[') => {
                chars.next();
                compound.attributes.push(parse_attribute(chars)?);
            }
            Some(&c) if is_ident_char(c) && !any => {
                compound.tag = Some(take_ident(chars)?.to_ascii_lowercase());
            }
            Some(c) if c.is_whitespace() || *c == '>' => break,
            None => break,
            Some(_) => return None,
        }
        any = true;
    }

    any.then_some(compound)
}

fn parse_attribute(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<AttributeMatch> {
    let mut body = String::new();
    let mut quote: Option<char> = None;
    for c in chars.by_ref() {
        match (quote, c) {
            (None, ']') => break,
            (None, '"') | (None, '\'') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            _ => {}
        }
        body.push(c);
    }

    let (name, value) = match body.split_once('=') {
        None => (body.trim().to_string(), None),
        Some((name, value)) => (name.trim().to_string(), Some(value.trim().to_string())),
    };
    if name.is_empty() || !name.chars().all(is_ident_char) {
        return None;
    }

    let (value, case_insensitive) = match value {
        None => (None, false),
        Some(raw) => {
            let (raw, flag) = match raw.rsplit_once(char::is_whitespace) {
                Some((v, flag)) if flag.eq_ignore_ascii_case("i") => (v.trim().to_string(), true),
                _ => (raw, false),
            };
            let unquoted = raw.trim_matches(|c| c == '"' || c == '\'').to_string();
            (Some(unquoted), flag)
        }
    };

    Some(AttributeMatch {
        name: name.to_ascii_lowercase(),
        value,
        case_insensitive,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;
    use std::rc::Rc;

    fn by_id(doc: &Document, id: &str) -> Rc<Node> {
        doc.get_element_by_id(id).unwrap()
    }

    #[test]
    fn test_selector_parse() {
        let s = Selector::parse("nav > ul li.item#x[data-a='b' i]").unwrap();
        assert_eq!(s.parts.len(), 3);
        assert_eq!(s.specificity, (1, 2, 3));
        assert_eq!(s.parts[0].1, Some(Combinator::Descendant));
        assert_eq!(s.parts[1].1, Some(Combinator::Child));
        assert_eq!(s.parts[2].1, None);

        assert!(Selector::parse("a:hover").is_none());
        assert!(Selector::parse("a + b").is_none());
        assert!(Selector::parse("> a").is_none());
        assert!(Selector::parse("").is_none());
    }

    #[test]
    fn test_ua_defaults() {
        let html = r#"<html><head><title>t</title></head>
            <body><div id="d"></div><span id="s"></span><input id="h" type="HIDDEN"></body></html>"#;
        let doc = Document::parse_html(html).unwrap();
        let head = doc
            .document_element()
            .unwrap()
            .element_children()
            .into_iter()
            .find(|n| n.is_tag("head"))
            .unwrap();
        assert!(doc.computed_style(&head).unwrap().is_display_none());
        assert_eq!(doc.computed_style(&by_id(&doc, "d")).unwrap().display, "block");
        assert_eq!(doc.computed_style(&by_id(&doc, "s")).unwrap().display, "inline");
        assert!(doc.computed_style(&by_id(&doc, "h")).unwrap().is_display_none());
    }

    #[test]
    fn test_inline_style_wins_over_author() {
        let html = r#"<style>.x { display: none; }</style>
            <div id="a" class="x" style="display: block"></div>
            <div id="b" class="x"></div>"#;
        let doc = Document::parse_html(html).unwrap();
        assert!(!doc.computed_style(&by_id(&doc, "a")).unwrap().is_display_none());
        assert!(doc.computed_style(&by_id(&doc, "b")).unwrap().is_display_none());
    }

    #[test]
    fn test_important_author_beats_inline() {
        let html = r#"<style>#a { display: none !important; }</style>
            <div id="a" style="display: block"></div>"#;
        let doc = Document::parse_html(html).unwrap();
        assert!(doc.computed_style(&by_id(&doc, "a")).unwrap().is_display_none());
    }

    #[test]
    fn test_specificity_and_order() {
        let html = r#"<style>
                #a { visibility: hidden; }
                div { visibility: visible; }
                .late { visibility: visible; }
                .late { visibility: collapse; }
            </style>
            <div id="a"></div><div id="b" class="late"></div>"#;
        let doc = Document::parse_html(html).unwrap();
        assert_eq!(
            doc.computed_style(&by_id(&doc, "a")).unwrap().visibility,
            Visibility::Hidden
        );
        assert_eq!(
            doc.computed_style(&by_id(&doc, "b")).unwrap().visibility,
            Visibility::Collapse
        );
    }

    #[test]
    fn test_visibility_inherits_display_does_not() {
        let html = r#"<div style="visibility: hidden; display: flex">
                <span id="inner"></span>
                <span id="shown" style="visibility: visible"></span>
            </div>"#;
        let doc = Document::parse_html(html).unwrap();
        let inner = doc.computed_style(&by_id(&doc, "inner")).unwrap();
        assert!(inner.is_invisible());
        assert_eq!(inner.display, "inline");
        assert!(!doc.computed_style(&by_id(&doc, "shown")).unwrap().is_invisible());
    }

    #[test]
    fn test_combinators() {
        let html = r#"<style>
                nav > a { display: none; }
                main p { visibility: hidden; }
            </style>
            <nav><a id="direct" href="/"></a><span><a id="nested" href="/"></a></span></nav>
            <main><section><p id="deep"></p></section></main><p id="outside"></p>"#;
        let doc = Document::parse_html(html).unwrap();
        assert!(doc.computed_style(&by_id(&doc, "direct")).unwrap().is_display_none());
        assert!(!doc.computed_style(&by_id(&doc, "nested")).unwrap().is_display_none());
        assert!(doc.computed_style(&by_id(&doc, "deep")).unwrap().is_invisible());
        assert!(!doc.computed_style(&by_id(&doc, "outside")).unwrap().is_invisible());
    }

    #[test]
    fn test_unsupported_selectors_never_match() {
        let html = r#"<style>p:first-child, .y { display: none; }</style>
            <p id="p" class="y"></p><p id="q"></p>"#;
        let doc = Document::parse_html(html).unwrap();
        assert!(doc.computed_style(&by_id(&doc, "p")).unwrap().is_display_none());
        assert!(!doc.computed_style(&by_id(&doc, "q")).unwrap().is_display_none());
    }
}
