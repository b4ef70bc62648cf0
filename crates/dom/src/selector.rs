//! A small CSS selector engine covering what page scripts query for.
//!
//! Supported: type and universal selectors, `#id`, `.class`, attribute
//! selectors (`[a]`, `[a=v]`, `[a^=v]`, `[a$=v]`, `[a*=v]`, `[a~=v]`),
//! compound selectors, descendant and child combinators, and selector lists.

use crate::{Document, NodeKey};
use anyhow::{Result, anyhow, bail};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Prefix,
    Suffix,
    Substring,
    Includes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    op: AttrOp,
    value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
}

/// One selector of a list: compounds joined by combinators, left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
    combinators: Vec<Combinator>,
}

/// A parsed, comma-separated selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    /// Parse a selector list.
    ///
    /// # Errors
    /// Returns an error for empty selectors, unsupported syntax (pseudo-classes,
    /// sibling combinators) or unbalanced brackets and quotes.
    pub fn parse(input: &str) -> Result<Self> {
        let mut selectors = Vec::new();
        for part in split_list(input)? {
            let part = part.trim();
            if part.is_empty() {
                bail!("empty selector in list {input:?}");
            }
            selectors.push(parse_complex(part).map_err(|err| anyhow!("{err} in selector {input:?}"))?);
        }
        Ok(Self { selectors })
    }

    /// Returns true if the node is an element matched by any selector in the list.
    pub fn matches(&self, doc: &Document, node: NodeKey) -> bool {
        self.selectors
            .iter()
            .any(|sel| match_from(doc, node, sel, sel.compounds.len() - 1))
    }
}

fn split_list(input: &str) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut bracket = false;
    let mut quote: Option<char> = None;
    let mut start = 0usize;
    for (idx, ch) in input.char_indices() {
        match (quote, ch) {
            (Some(open), _) if ch == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') if bracket => quote = Some(ch),
            (None, '[') => bracket = true,
            (None, ']') => bracket = false,
            (None, ',') if !bracket => {
                parts.push(&input[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if quote.is_some() || bracket {
        bail!("unterminated attribute selector in {input:?}");
    }
    parts.push(&input[start..]);
    Ok(parts)
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn ident(&mut self) -> Result<String> {
        let mut out = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii() {
                out.push(ch);
                self.pos += 1;
            } else {
                break;
            }
        }
        if out.is_empty() {
            bail!("expected identifier at offset {}", self.pos);
        }
        Ok(out)
    }
}

fn parse_complex(input: &str) -> Result<ComplexSelector> {
    let mut cursor = Cursor {
        chars: input.chars().collect(),
        pos: 0,
    };
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();
    let mut pending: Option<Combinator> = None;
    loop {
        cursor.skip_whitespace();
        let Some(ch) = cursor.peek() else { break };
        if ch == '>' {
            if compounds.is_empty() || pending.is_some() {
                bail!("misplaced child combinator");
            }
            cursor.pos += 1;
            pending = Some(Combinator::Child);
            continue;
        }
        if !compounds.is_empty() {
            combinators.push(pending.take().unwrap_or(Combinator::Descendant));
        }
        compounds.push(parse_compound(&mut cursor)?);
    }
    if pending.is_some() {
        bail!("dangling child combinator");
    }
    if compounds.is_empty() {
        bail!("empty selector");
    }
    Ok(ComplexSelector {
        compounds,
        combinators,
    })
}

fn parse_compound(cursor: &mut Cursor) -> Result<Compound> {
    let mut compound = Compound::default();
    let mut any = false;
    if cursor.eat('*') {
        any = true;
    } else if cursor
        .peek()
        .is_some_and(|ch| ch.is_alphabetic() || ch == '_' || !ch.is_ascii())
    {
        compound.tag = Some(cursor.ident()?.to_ascii_lowercase());
        any = true;
    }
    while let Some(ch) = cursor.peek() {
        match ch {
            '#' => {
                cursor.pos += 1;
                compound.id = Some(cursor.ident()?);
            }
            '.' => {
                cursor.pos += 1;
                compound.classes.push(cursor.ident()?);
            }
            '[' => {
                cursor.pos += 1;
                compound.attrs.push(parse_attr(cursor)?);
            }
            ch if ch.is_whitespace() || ch == '>' => break,
            ':' => bail!("pseudo-classes are not supported"),
            '+' | '~' => bail!("sibling combinators are not supported"),
            other => bail!("unexpected character {other:?}"),
        }
        any = true;
    }
    if !any {
        bail!("expected a compound selector at offset {}", cursor.pos);
    }
    Ok(compound)
}

fn parse_attr(cursor: &mut Cursor) -> Result<AttrSelector> {
    cursor.skip_whitespace();
    let name = cursor.ident()?.to_ascii_lowercase();
    cursor.skip_whitespace();
    if cursor.eat(']') {
        return Ok(AttrSelector {
            name,
            op: AttrOp::Exists,
            value: String::new(),
        });
    }
    let op = match cursor.bump() {
        Some('=') => AttrOp::Equals,
        Some(prefix @ ('^' | '$' | '*' | '~')) => {
            if !cursor.eat('=') {
                bail!("expected '=' after {prefix:?}");
            }
            match prefix {
                '^' => AttrOp::Prefix,
                '$' => AttrOp::Suffix,
                '*' => AttrOp::Substring,
                _ => AttrOp::Includes,
            }
        }
        other => bail!("unexpected {other:?} in attribute selector"),
    };
    cursor.skip_whitespace();
    let value = match cursor.peek() {
        Some(open @ ('"' | '\'')) => {
            cursor.pos += 1;
            let mut value = String::new();
            loop {
                match cursor.bump() {
                    Some(ch) if ch == open => break,
                    Some(ch) => value.push(ch),
                    None => bail!("unterminated string in attribute selector"),
                }
            }
            value
        }
        _ => cursor.ident()?,
    };
    cursor.skip_whitespace();
    if !cursor.eat(']') {
        bail!("expected ']' to close attribute selector");
    }
    Ok(AttrSelector { name, op, value })
}

fn match_from(doc: &Document, node: NodeKey, sel: &ComplexSelector, idx: usize) -> bool {
    let Some(compound) = sel.compounds.get(idx) else {
        return false;
    };
    if !compound_matches(doc, node, compound) {
        return false;
    }
    if idx == 0 {
        return true;
    }
    match sel.combinators[idx - 1] {
        Combinator::Child => doc
            .parent_element(node)
            .is_some_and(|parent| match_from(doc, parent, sel, idx - 1)),
        Combinator::Descendant => {
            let mut current = doc.parent_element(node);
            while let Some(ancestor) = current {
                if match_from(doc, ancestor, sel, idx - 1) {
                    return true;
                }
                current = doc.parent_element(ancestor);
            }
            false
        }
    }
}

fn compound_matches(doc: &Document, node: NodeKey, compound: &Compound) -> bool {
    let Some(tag) = doc.tag_name(node) else {
        return false;
    };
    if compound.tag.as_deref().is_some_and(|want| want != tag) {
        return false;
    }
    if let Some(id) = &compound.id
        && doc.attribute(node, "id") != Some(id.as_str())
    {
        return false;
    }
    if !compound.classes.iter().all(|class| doc.has_class(node, class)) {
        return false;
    }
    compound.attrs.iter().all(|attr| {
        let Some(actual) = doc.attribute(node, &attr.name) else {
            return false;
        };
        let want = attr.value.as_str();
        match attr.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == want,
            AttrOp::Prefix => !want.is_empty() && actual.starts_with(want),
            AttrOp::Suffix => !want.is_empty() && actual.ends_with(want),
            AttrOp::Substring => !want.is_empty() && actual.contains(want),
            AttrOp::Includes => actual.split_whitespace().any(|token| token == want),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsupported_syntax() {
        for bad in ["", "a,", "> a", "a >", "a:hover", "a + b", "[href", "[href^=\"#]", "#"] {
            assert!(SelectorList::parse(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn parses_lists_with_commas_inside_attribute_values() {
        let list = SelectorList::parse("a[title=\"x, y\"], .b > #c").unwrap();
        assert_eq!(list.selectors.len(), 2);
        assert_eq!(list.selectors[1].combinators, vec![Combinator::Child]);
    }
}
