//! The CSS and XPath subsets understood by [`super::MockPage`].
//!
//! CSS selectors parse into a chain of [`SelectorPart`]s. Each part is a
//! compound step (tag or `*`, `#id`, `.class`, `[attr]`, `[attr=value]`)
//! joined to the previous one by a descendant or `>` child combinator, and
//! chains match right to left.
//!
//! XPath: `.`, `..`, and `//step` / `.//step` where a step is a tag or `*`
//! followed by any number of `[@attr='value']` predicates.

use super::dom::{MockDom, NodeId};
use crate::result::{Select2Error, Select2Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorAttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    pub(crate) tag: Option<String>,
    pub(crate) universal: bool,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<SelectorAttrCondition>,
}

impl SelectorStep {
    fn is_empty(&self) -> bool {
        !self.universal
            && self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SelectorCombinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    pub(crate) step: SelectorStep,
    // Relation to the previous (left) part.
    pub(crate) combinator: Option<SelectorCombinator>,
}

/// Parsed CSS selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CssSelector {
    parts: Vec<SelectorPart>,
}

impl CssSelector {
    /// Parse the supported CSS subset
    pub(crate) fn parse(input: &str) -> Select2Result<Self> {
        Ok(Self {
            parts: parse_selector_chain(input)?,
        })
    }

    /// Whether `node` matches
    pub(crate) fn matches(&self, dom: &MockDom, node: NodeId) -> bool {
        matches_selector_chain(dom, node, &self.parts)
    }
}

/// Where an XPath expression starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    SelfNode,
    Parent,
    DocumentDescendants,
    ScopeDescendants,
}

/// Parsed XPath expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct XPathSelector {
    axis: Axis,
    step: SelectorStep,
}

impl XPathSelector {
    /// Parse the supported XPath subset
    pub(crate) fn parse(input: &str) -> Select2Result<Self> {
        let trimmed = input.trim();
        let (axis, rest) = match trimmed {
            "." => return Ok(Self::bare(Axis::SelfNode)),
            ".." => return Ok(Self::bare(Axis::Parent)),
            _ => {
                if let Some(rest) = trimmed.strip_prefix(".//") {
                    (Axis::ScopeDescendants, rest)
                } else if let Some(rest) = trimmed.strip_prefix("//") {
                    (Axis::DocumentDescendants, rest)
                } else {
                    return Err(unsupported(input, "expected '.', '..', '//' or './/'"));
                }
            }
        };
        let step = parse_xpath_step(input, rest)?;
        Ok(Self { axis, step })
    }

    fn bare(axis: Axis) -> Self {
        Self {
            axis,
            step: SelectorStep::default(),
        }
    }

    /// Evaluate against the document, relative to `scope` when given
    pub(crate) fn evaluate(&self, dom: &MockDom, scope: Option<NodeId>) -> Vec<NodeId> {
        let context = scope.unwrap_or(MockDom::ROOT);
        match self.axis {
            Axis::SelfNode => vec![context],
            Axis::Parent => dom.parent(context).into_iter().collect(),
            Axis::DocumentDescendants => std::iter::once(MockDom::ROOT)
                .chain(dom.descendants(MockDom::ROOT))
                .filter(|node| matches_step(dom, *node, &self.step))
                .collect(),
            Axis::ScopeDescendants => dom
                .descendants(context)
                .into_iter()
                .filter(|node| matches_step(dom, *node, &self.step))
                .collect(),
        }
    }
}

fn unsupported(input: &str, reason: &str) -> Select2Error {
    Select2Error::driver(format!("mock page cannot evaluate {input:?}: {reason}"))
}

// ===== CSS parsing =====

fn parse_selector_chain(selector: &str) -> Select2Result<Vec<SelectorPart>> {
    let tokens = tokenize_selector(selector)?;
    let mut parts = Vec::new();
    let mut pending_child = false;

    for token in tokens {
        if token == ">" {
            if pending_child || parts.is_empty() {
                return Err(unsupported(selector, "dangling '>'"));
            }
            pending_child = true;
            continue;
        }

        let step = parse_selector_step(selector, &token)?;
        let combinator = if parts.is_empty() {
            None
        } else if std::mem::take(&mut pending_child) {
            Some(SelectorCombinator::Child)
        } else {
            Some(SelectorCombinator::Descendant)
        };
        parts.push(SelectorPart { step, combinator });
    }

    if parts.is_empty() {
        return Err(unsupported(selector, "empty selector"));
    }
    if pending_child {
        return Err(unsupported(selector, "dangling '>'"));
    }
    Ok(parts)
}

/// Split on whitespace and `>` outside attribute brackets and quotes
fn tokenize_selector(selector: &str) -> Select2Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in selector.chars() {
        if let Some(open) = quote {
            current.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' if bracket_depth > 0 => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                if bracket_depth == 0 {
                    return Err(unsupported(selector, "unbalanced ']'"));
                }
                bracket_depth -= 1;
                current.push(ch);
            }
            '>' if bracket_depth == 0 => {
                flush_token(&mut current, &mut tokens);
                tokens.push(">".to_string());
            }
            ch if ch.is_whitespace() && bracket_depth == 0 => {
                flush_token(&mut current, &mut tokens);
            }
            _ => current.push(ch),
        }
    }

    if bracket_depth != 0 || quote.is_some() {
        return Err(unsupported(selector, "unterminated attribute selector"));
    }
    flush_token(&mut current, &mut tokens);
    Ok(tokens)
}

fn flush_token(current: &mut String, tokens: &mut Vec<String>) {
    if !current.trim().is_empty() {
        tokens.push(current.trim().to_string());
    }
    current.clear();
}

fn parse_selector_step(selector: &str, part: &str) -> Select2Result<SelectorStep> {
    let bytes = part.as_bytes();
    let mut i = 0usize;
    let mut step = SelectorStep::default();

    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if !step.is_empty() {
                    return Err(unsupported(selector, "'*' must start a step"));
                }
                step.universal = true;
                i += 1;
            }
            b'#' => {
                let Some((id, next)) = parse_selector_ident(part, i + 1) else {
                    return Err(unsupported(selector, "expected id after '#'"));
                };
                if step.id.replace(id).is_some() {
                    return Err(unsupported(selector, "two ids in one step"));
                }
                i = next;
            }
            b'.' => {
                let Some((class_name, next)) = parse_selector_ident(part, i + 1) else {
                    return Err(unsupported(selector, "expected class after '.'"));
                };
                step.classes.push(class_name);
                i = next;
            }
            b'[' => {
                let (attr, next) = parse_selector_attr_condition(selector, part, i)?;
                step.attrs.push(attr);
                i = next;
            }
            other => {
                if !step.is_empty() {
                    return Err(unsupported(selector, &format!("unsupported {:?}", char::from(other))));
                }
                let Some((tag, next)) = parse_selector_ident(part, i) else {
                    return Err(unsupported(selector, &format!("unsupported {:?}", char::from(other))));
                };
                step.tag = Some(tag.to_ascii_lowercase());
                i = next;
            }
        }
    }

    if step.is_empty() {
        return Err(unsupported(selector, "empty step"));
    }
    Ok(step)
}

fn parse_selector_attr_condition(
    selector: &str,
    src: &str,
    open_bracket: usize,
) -> Select2Result<(SelectorAttrCondition, usize)> {
    let bytes = src.as_bytes();
    let mut i = skip_spaces(bytes, open_bracket + 1);

    let key_start = i;
    while i < bytes.len() && is_selector_attr_name_char(bytes[i]) {
        i += 1;
    }
    if key_start == i {
        return Err(unsupported(selector, "expected attribute name"));
    }
    let key = src[key_start..i].to_ascii_lowercase();

    i = skip_spaces(bytes, i);
    match bytes.get(i) {
        Some(b']') => return Ok((SelectorAttrCondition::Exists { key }, i + 1)),
        Some(b'=') => i += 1,
        _ => return Err(unsupported(selector, "only [attr] and [attr=value] are supported")),
    }

    i = skip_spaces(bytes, i);
    let (value, after_value) = parse_selector_attr_value(selector, src, i)?;
    i = skip_spaces(bytes, after_value);
    if bytes.get(i) != Some(&b']') {
        return Err(unsupported(selector, "expected ']'"));
    }
    Ok((SelectorAttrCondition::Eq { key, value }, i + 1))
}

fn parse_selector_attr_value(selector: &str, src: &str, start: usize) -> Select2Result<(String, usize)> {
    let bytes = src.as_bytes();
    match bytes.get(start) {
        None => Err(unsupported(selector, "expected attribute value")),
        Some(&quote) if quote == b'"' || quote == b'\'' => {
            let mut i = start + 1;
            while i < bytes.len() {
                if bytes[i] == b'\\' {
                    i = (i + 2).min(bytes.len());
                    continue;
                }
                if bytes[i] == quote {
                    return Ok((unescape(&src[start + 1..i]), i + 1));
                }
                i += 1;
            }
            Err(unsupported(selector, "unterminated string"))
        }
        Some(_) => {
            let mut i = start;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b']' {
                i += 1;
            }
            Ok((unescape(&src[start..i]), i))
        }
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn skip_spaces(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

fn parse_selector_ident(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    if start >= bytes.len() || !is_selector_ident_char(bytes[start]) {
        return None;
    }
    let mut end = start + 1;
    while end < bytes.len() && is_selector_ident_char(bytes[end]) {
        end += 1;
    }
    Some((src.get(start..end)?.to_string(), end))
}

// Non-ASCII bytes only occur inside whole UTF-8 sequences, so slicing at
// ident boundaries stays on char boundaries.
const fn is_selector_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b >= 0x80
}

const fn is_selector_attr_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b':'
}

// ===== XPath parsing =====

fn parse_xpath_step(input: &str, rest: &str) -> Select2Result<SelectorStep> {
    let bytes = rest.as_bytes();
    let mut step = SelectorStep::default();
    let mut i = if bytes.first() == Some(&b'*') {
        step.universal = true;
        1
    } else {
        let Some((tag, next)) = parse_selector_ident(rest, 0) else {
            return Err(unsupported(input, "expected tag or '*'"));
        };
        step.tag = Some(tag.to_ascii_lowercase());
        next
    };

    while bytes.get(i) == Some(&b'[') {
        if bytes.get(i + 1) != Some(&b'@') {
            return Err(unsupported(input, "only [@attr='value'] predicates are supported"));
        }
        let key_start = i + 2;
        let mut end = key_start;
        while end < bytes.len() && is_selector_attr_name_char(bytes[end]) {
            end += 1;
        }
        if end == key_start || bytes.get(end) != Some(&b'=') {
            return Err(unsupported(input, "expected @attr="));
        }
        if !matches!(bytes.get(end + 1), Some(b'"' | b'\'')) {
            return Err(unsupported(input, "expected quoted value"));
        }
        let (value, after_value) = parse_selector_attr_value(input, rest, end + 1)?;
        if bytes.get(after_value) != Some(&b']') {
            return Err(unsupported(input, "expected ']'"));
        }
        step.attrs.push(SelectorAttrCondition::Eq {
            key: rest[key_start..end].to_string(),
            value,
        });
        i = after_value + 1;
    }

    if i != bytes.len() {
        return Err(unsupported(input, "trailing input"));
    }
    Ok(step)
}

// ===== Matching =====

fn matches_selector_chain(dom: &MockDom, node: NodeId, parts: &[SelectorPart]) -> bool {
    let Some((last, _)) = parts.split_last() else {
        return false;
    };
    if !matches_step(dom, node, &last.step) {
        return false;
    }

    let mut current = node;
    for idx in (1..parts.len()).rev() {
        let prev_step = &parts[idx - 1].step;
        let combinator = parts[idx]
            .combinator
            .unwrap_or(SelectorCombinator::Descendant);

        let matched = match combinator {
            SelectorCombinator::Child => dom
                .parent(current)
                .filter(|parent| matches_step(dom, *parent, prev_step)),
            SelectorCombinator::Descendant => {
                let mut cursor = dom.parent(current);
                let mut found = None;
                while let Some(parent) = cursor {
                    if matches_step(dom, parent, prev_step) {
                        found = Some(parent);
                        break;
                    }
                    cursor = dom.parent(parent);
                }
                found
            }
        };

        let Some(matched) = matched else {
            return false;
        };
        current = matched;
    }

    true
}

fn matches_step(dom: &MockDom, node: NodeId, step: &SelectorStep) -> bool {
    let Some(element) = dom.element(node) else {
        return false;
    };

    if let Some(tag) = &step.tag {
        if !element.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
    }

    if step.id.is_some() && step.id != element.id {
        return false;
    }

    if step.classes.iter().any(|class_name| !element.has_class(class_name)) {
        return false;
    }

    step.attrs.iter().all(|cond| match cond {
        SelectorAttrCondition::Exists { key } => element.attribute(key).is_some(),
        SelectorAttrCondition::Eq { key, value } => {
            element.attribute(key).as_deref() == Some(value.as_str())
        }
    })
}
