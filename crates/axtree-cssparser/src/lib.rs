//! # axtree CSS Parser
//!
//! A minimal stylesheet parser: enough CSS to answer "is this element
//! displayed and visible". Parses `selector { prop: value; }` rules and bare
//! declaration lists (inline `style` attributes) into an AST.

use thiserror::Error;

/// Errors that can occur while parsing CSS.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unexpected end of input")]
    UnexpectedEof,

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// A parsed stylesheet AST.
#[derive(Debug, Default, Clone)]
pub struct StylesheetAst {
    pub rules: Vec<RuleAst>,
}

/// A parsed rule AST.
#[derive(Debug, Clone)]
pub struct RuleAst {
    pub selector: String,
    pub declarations: Vec<DeclarationAst>,
}

/// A parsed declaration AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationAst {
    /// Lower-cased property name.
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// Parse a stylesheet into an AST.
///
/// Notes:
/// - This is not a full CSS parser.
/// - At-rules (`@media`, `@supports`, `@import`) are skipped entirely.
/// - An unclosed block is an error; callers decide whether to keep going.
pub fn parse_stylesheet(css: &str) -> Result<StylesheetAst, ParseError> {
    let mut out = StylesheetAst::default();

    let mut current_selector = String::new();
    let mut block = String::new();
    let mut in_block = false;

    let stripped = strip_comments(css);
    let mut chars = stripped.chars();
    while let Some(c) = chars.next() {
        if !in_block {
            match c {
                '{' if current_selector.trim_start().starts_with('@') => {
                    skip_block(&mut chars)?;
                    current_selector.clear();
                }
                ';' if current_selector.trim_start().starts_with('@') => {
                    current_selector.clear();
                }
                '{' => {
                    in_block = true;
                    block.clear();
                }
                _ => current_selector.push(c),
            }
            continue;
        }

        if c == '}' {
            let selector = current_selector.trim().to_string();
            let declarations = parse_declarations(&block);
            if !selector.is_empty() && !declarations.is_empty() {
                out.rules.push(RuleAst {
                    selector,
                    declarations,
                });
            }

            in_block = false;
            current_selector.clear();
            block.clear();
            continue;
        }

        block.push(c);
    }

    if in_block {
        return Err(ParseError::UnexpectedEof);
    }

    Ok(out)
}

/// Parse a declaration list such as the contents of a `style` attribute.
///
/// Malformed declarations (no colon, empty property or value) are dropped.
pub fn parse_declarations(css: &str) -> Vec<DeclarationAst> {
    strip_comments(css)
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim();
            let value = value.trim();
            if property.is_empty() || value.is_empty() {
                return None;
            }

            let (value, important) = strip_important(value);
            Some(DeclarationAst {
                property: property.to_ascii_lowercase(),
                value: value.to_string(),
                important,
            })
        })
        .collect()
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut chars = css.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            while let Some(cc) = chars.next() {
                if cc == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    out
}

fn skip_block(chars: &mut impl Iterator<Item = char>) -> Result<(), ParseError> {
    let mut depth = 1usize;
    for c in chars {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            _ => {}
        }
    }
    Err(ParseError::UnexpectedEof)
}

fn strip_important(value: &str) -> (&str, bool) {
    let lower = value.to_ascii_lowercase();
    match lower.rfind("!important") {
        Some(idx) => (value[..idx].trim_end(), true),
        None => (value, false),
    }
}
