//! # Selector Queries
//!
//! A scoped `querySelector` over [`Dom`]. Supported grammar:
//!
//! ```text
//! list      := complex ("," complex)*
//! complex   := compound (combinator compound)*
//! combinator:= " " | ">" | "+" | "~"
//! compound  := (tag | "*")? (#id | .class | [attr] | [attr=value]
//!              | :scope | :first-child | :last-child | :nth-child(An+B))*
//! ```
//!
//! Identifiers honor CSS escapes, so `.w-\[50\%\]` matches `class="w-[50%]"`.

use logos::Logos;

use crate::error::SelectorError;
use crate::escape::css_unescape;
use crate::node::{Dom, NodeId};

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
enum SelectorToken<'src> {
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[regex(
        r"-?([a-zA-Z_]|[^\x00-\x7F]|\\[0-9a-fA-F]{1,6}[ \t\r\n\f]?|\\[^0-9a-fA-F\r\n\f])([a-zA-Z0-9_-]|[^\x00-\x7F]|\\[0-9a-fA-F]{1,6}[ \t\r\n\f]?|\\[^0-9a-fA-F\r\n\f])*",
        |lex| lex.slice()
    )]
    #[regex(
        r"--([a-zA-Z0-9_-]|[^\x00-\x7F]|\\[0-9a-fA-F]{1,6}[ \t\r\n\f]?|\\[^0-9a-fA-F\r\n\f])*",
        |lex| lex.slice()
    )]
    Ident(&'src str),

    #[regex(
        r"#([a-zA-Z0-9_-]|[^\x00-\x7F]|\\[0-9a-fA-F]{1,6}[ \t\r\n\f]?|\\[^0-9a-fA-F\r\n\f])+",
        |lex| &lex.slice()[1..]
    )]
    Hash(&'src str),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    #[regex(r"'([^'\\]|\\.)*'", |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    Str(&'src str),

    #[regex(r"[0-9]+", |lex| lex.slice())]
    Number(&'src str),

    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("=")]
    Eq,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("~")]
    Tilde,
    #[token(",")]
    Comma,
    #[token("*")]
    Star,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Id(String),
    Class(String),
    Attribute { name: String, value: Option<String> },
    Scope,
    FirstChild,
    LastChild,
    /// `:nth-child(An+B)`
    NthChild { a: i64, b: i64 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    /// `None` matches any tag
    pub tag: Option<String>,
    pub parts: Vec<SimpleSelector>,
}

/// Compounds joined by combinators. `steps[i].0` links `steps[i - 1]` to
/// `steps[i]`; the first combinator is unused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub steps: Vec<(Combinator, Compound)>,
}

/// Parsed, comma-separated selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        Parser::new(source)?.parse_list()
    }

    /// Whether `element` matches any selector in the list
    pub fn matches(&self, dom: &Dom, element: NodeId, scope: Option<NodeId>) -> bool {
        self.selectors
            .iter()
            .any(|complex| matches_step(dom, element, &complex.steps, complex.steps.len() - 1, scope))
    }
}

struct Parser<'src> {
    source: &'src str,
    tokens: Vec<(SelectorToken<'src>, std::ops::Range<usize>)>,
    pos: usize,
}

impl<'src> Parser<'src> {
    fn new(source: &'src str) -> Result<Self, SelectorError> {
        let mut tokens = Vec::new();
        for (token, span) in SelectorToken::lexer(source).spanned() {
            let token = token.map_err(|_| SelectorError::LexerError { pos: span.start })?;
            tokens.push((token, span));
        }
        Ok(Self {
            source,
            tokens,
            pos: 0,
        })
    }

    fn peek(&self) -> Option<&SelectorToken<'src>> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn advance(&mut self) -> Option<SelectorToken<'src>> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        self.pos += 1;
        token
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self.peek() == Some(&SelectorToken::Whitespace) {
            self.pos += 1;
            skipped = true;
        }
        skipped
    }

    fn unexpected(&self) -> SelectorError {
        match self.tokens.get(self.pos) {
            Some((token, span)) => SelectorError::UnexpectedToken {
                pos: span.start,
                found: format!("{:?}", token),
            },
            None => SelectorError::UnexpectedEnd,
        }
    }

    fn parse_list(&mut self) -> Result<SelectorList, SelectorError> {
        let mut selectors = Vec::new();

        loop {
            self.skip_whitespace();
            selectors.push(self.parse_complex()?);
            self.skip_whitespace();
            match self.peek() {
                Some(SelectorToken::Comma) => {
                    self.pos += 1;
                }
                None => break,
                Some(_) => return Err(self.unexpected()),
            }
        }

        Ok(SelectorList { selectors })
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        if self.peek().is_none() {
            return Err(SelectorError::Empty);
        }

        let mut steps = vec![(Combinator::Descendant, self.parse_compound()?)];

        loop {
            let had_whitespace = self.skip_whitespace();
            let combinator = match self.peek() {
                Some(SelectorToken::Gt) => Combinator::Child,
                Some(SelectorToken::Plus) => Combinator::NextSibling,
                Some(SelectorToken::Tilde) => Combinator::SubsequentSibling,
                Some(SelectorToken::Comma) | None => break,
                Some(_) if had_whitespace => {
                    steps.push((Combinator::Descendant, self.parse_compound()?));
                    continue;
                }
                Some(_) => return Err(self.unexpected()),
            };
            self.pos += 1;
            self.skip_whitespace();
            steps.push((combinator, self.parse_compound()?));
        }

        Ok(ComplexSelector { steps })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut universal = false;

        match self.peek() {
            Some(SelectorToken::Ident(name)) => {
                compound.tag = Some(css_unescape(name).to_ascii_lowercase());
                self.pos += 1;
            }
            Some(SelectorToken::Star) => {
                universal = true;
                self.pos += 1;
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some(SelectorToken::Hash(id)) => {
                    compound.parts.push(SimpleSelector::Id(css_unescape(id)));
                    self.pos += 1;
                }
                Some(SelectorToken::Dot) => {
                    self.pos += 1;
                    match self.advance() {
                        Some(SelectorToken::Ident(class)) => {
                            compound.parts.push(SimpleSelector::Class(css_unescape(class)))
                        }
                        _ => {
                            self.pos -= 1;
                            return Err(self.unexpected());
                        }
                    }
                }
                Some(SelectorToken::LBracket) => {
                    self.pos += 1;
                    compound.parts.push(self.parse_attribute()?);
                }
                Some(SelectorToken::Colon) => {
                    self.pos += 1;
                    compound.parts.push(self.parse_pseudo()?);
                }
                _ => break,
            }
        }

        if !universal && compound.tag.is_none() && compound.parts.is_empty() {
            return Err(self.unexpected());
        }

        Ok(compound)
    }

    fn parse_attribute(&mut self) -> Result<SimpleSelector, SelectorError> {
        self.skip_whitespace();
        let name = match self.advance() {
            Some(SelectorToken::Ident(name)) => css_unescape(name).to_ascii_lowercase(),
            _ => {
                self.pos -= 1;
                return Err(self.unexpected());
            }
        };
        self.skip_whitespace();

        let value = match self.advance() {
            Some(SelectorToken::RBracket) => return Ok(SimpleSelector::Attribute { name, value: None }),
            Some(SelectorToken::Eq) => {
                self.skip_whitespace();
                let value = match self.advance() {
                    Some(SelectorToken::Str(v)) => css_unescape(v),
                    Some(SelectorToken::Ident(v)) | Some(SelectorToken::Number(v)) => css_unescape(v),
                    _ => {
                        self.pos -= 1;
                        return Err(self.unexpected());
                    }
                };
                self.skip_whitespace();
                value
            }
            _ => {
                self.pos -= 1;
                return Err(self.unexpected());
            }
        };

        match self.advance() {
            Some(SelectorToken::RBracket) => Ok(SimpleSelector::Attribute {
                name,
                value: Some(value),
            }),
            _ => {
                self.pos -= 1;
                Err(self.unexpected())
            }
        }
    }

    fn parse_pseudo(&mut self) -> Result<SimpleSelector, SelectorError> {
        let name = match self.advance() {
            Some(SelectorToken::Ident(name)) => css_unescape(name).to_ascii_lowercase(),
            _ => {
                self.pos -= 1;
                return Err(self.unexpected());
            }
        };

        match name.as_str() {
            "scope" => Ok(SimpleSelector::Scope),
            "first-child" => Ok(SimpleSelector::FirstChild),
            "last-child" => Ok(SimpleSelector::LastChild),
            "nth-child" => {
                let open = match self.tokens.get(self.pos) {
                    Some((SelectorToken::LParen, span)) => span.end,
                    _ => return Err(self.unexpected()),
                };
                let close_index = self.tokens[self.pos..]
                    .iter()
                    .position(|(t, _)| *t == SelectorToken::RParen)
                    .map(|i| self.pos + i)
                    .ok_or(SelectorError::UnexpectedEnd)?;
                let close = self.tokens[close_index].1.start;
                let (a, b) = parse_nth(&self.source[open..close])?;
                self.pos = close_index + 1;
                Ok(SimpleSelector::NthChild { a, b })
            }
            other => Err(SelectorError::UnsupportedPseudo(other.to_string())),
        }
    }
}

/// Parse `An+B`, `odd`, `even` or a plain integer
fn parse_nth(argument: &str) -> Result<(i64, i64), SelectorError> {
    let compact: String = argument
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    let invalid = || SelectorError::InvalidNth(argument.trim().to_string());

    match compact.as_str() {
        "odd" => return Ok((2, 1)),
        "even" => return Ok((2, 0)),
        "" => return Err(invalid()),
        _ => {}
    }

    match compact.split_once('n') {
        Some((a, b)) => {
            let a = match a {
                "" | "+" => 1,
                "-" => -1,
                _ => a.parse::<i64>().map_err(|_| invalid())?,
            };
            let b = match b {
                "" => 0,
                _ if b.starts_with('+') || b.starts_with('-') => {
                    b.parse::<i64>().map_err(|_| invalid())?
                }
                _ => return Err(invalid()),
            };
            Ok((a, b))
        }
        None => compact.parse::<i64>().map(|b| (0, b)).map_err(|_| invalid()),
    }
}

fn matches_step(
    dom: &Dom,
    element: NodeId,
    steps: &[(Combinator, Compound)],
    index: usize,
    scope: Option<NodeId>,
) -> bool {
    let (combinator, compound) = &steps[index];
    if !matches_compound(dom, element, compound, scope) {
        return false;
    }
    if index == 0 {
        return true;
    }

    match combinator {
        Combinator::Child => dom
            .parent_element(element)
            .is_some_and(|parent| matches_step(dom, parent, steps, index - 1, scope)),
        Combinator::Descendant => {
            let mut current = dom.parent_element(element);
            while let Some(ancestor) = current {
                if matches_step(dom, ancestor, steps, index - 1, scope) {
                    return true;
                }
                current = dom.parent_element(ancestor);
            }
            false
        }
        Combinator::NextSibling => dom
            .previous_element_sibling(element)
            .is_some_and(|sibling| matches_step(dom, sibling, steps, index - 1, scope)),
        Combinator::SubsequentSibling => {
            let mut current = dom.previous_element_sibling(element);
            while let Some(sibling) = current {
                if matches_step(dom, sibling, steps, index - 1, scope) {
                    return true;
                }
                current = dom.previous_element_sibling(sibling);
            }
            false
        }
    }
}

fn matches_compound(dom: &Dom, node: NodeId, compound: &Compound, scope: Option<NodeId>) -> bool {
    let Some(element) = dom.element(node) else {
        return false;
    };

    if let Some(tag) = &compound.tag {
        if element.tag != *tag {
            return false;
        }
    }

    compound.parts.iter().all(|part| match part {
        SimpleSelector::Id(id) => element.id() == Some(id.as_str()),
        SimpleSelector::Class(class) => element.has_class(class),
        SimpleSelector::Attribute { name, value } => {
            let actual = if name == "style" {
                (!element.styles.is_empty()).then(|| element.styles.to_css_text())
            } else {
                element.attribute(name).map(str::to_string)
            };
            match (actual, value) {
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == *expected,
                (None, _) => false,
            }
        }
        SimpleSelector::Scope => match scope {
            Some(scope) => node == scope,
            None => dom.document_element() == Some(node),
        },
        SimpleSelector::FirstChild => dom.element_index(node) == Some(1),
        SimpleSelector::LastChild => match dom.parent(node) {
            Some(parent) => dom.element_children(parent).last() == Some(node),
            None => false,
        },
        SimpleSelector::NthChild { a, b } => match dom.element_index(node) {
            Some(position) => nth_matches(*a, *b, position as i64),
            None => false,
        },
    })
}

fn nth_matches(a: i64, b: i64, position: i64) -> bool {
    if a == 0 {
        return position == b;
    }
    let Some(offset) = position.checked_sub(b) else {
        return false;
    };
    match (offset.checked_rem(a), offset.checked_div(a)) {
        (Some(0), Some(steps)) => steps >= 0,
        _ => false,
    }
}

impl Dom {
    /// First element matching `selector` among the descendants of `scope`
    /// (the whole document when `None`), in document order
    pub fn query_selector(&self, scope: Option<NodeId>, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        let root = scope.unwrap_or_else(|| self.document());
        Ok(self
            .descendants(root)
            .into_iter()
            .find(|&node| list.matches(self, node, scope)))
    }

    /// Every element matching `selector` below `scope`, in document order
    pub fn query_selector_all(&self, scope: Option<NodeId>, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        let root = scope.unwrap_or_else(|| self.document());
        Ok(self
            .descendants(root)
            .into_iter()
            .filter(|&node| list.matches(self, node, scope))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Dom {
        Dom::parse_document(
            r#"<main id="app">
                <section class="card primary"><h2>One</h2><p class="w-[50%]">a</p></section>
                <section class="card"><h2>Two</h2><p data-role="note">b</p><p>c</p></section>
            </main>"#,
        )
        .unwrap()
    }

    fn text_of(dom: &Dom, node: Option<NodeId>) -> String {
        node.map(|n| dom.text_content(n)).unwrap_or_default()
    }

    #[test]
    fn test_parse_compound() {
        let list = SelectorList::parse("div#main.a.b[data-x=\"1\"]:first-child").unwrap();
        let compound = &list.selectors[0].steps[0].1;
        assert_eq!(compound.tag.as_deref(), Some("div"));
        assert_eq!(compound.parts.len(), 5);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(SelectorList::parse(""), Err(SelectorError::Empty));
        assert!(SelectorList::parse("div >").is_err());
        assert!(matches!(
            SelectorList::parse("a:hover"),
            Err(SelectorError::UnsupportedPseudo(_))
        ));
        assert!(matches!(
            SelectorList::parse("li:nth-child(x)"),
            Err(SelectorError::InvalidNth(_))
        ));
    }

    #[test]
    fn test_parse_nth() {
        assert_eq!(parse_nth("3").unwrap(), (0, 3));
        assert_eq!(parse_nth("odd").unwrap(), (2, 1));
        assert_eq!(parse_nth("2n + 1").unwrap(), (2, 1));
        assert_eq!(parse_nth("-n+3").unwrap(), (-1, 3));
        assert_eq!(parse_nth("n").unwrap(), (1, 0));
    }

    #[test]
    fn test_nth_matches() {
        assert!(nth_matches(0, 2, 2));
        assert!(!nth_matches(0, 2, 3));
        assert!(nth_matches(2, 1, 5));
        assert!(!nth_matches(2, 1, 4));
        assert!(nth_matches(-1, 3, 1));
        assert!(!nth_matches(-1, 3, 4));
    }

    #[test]
    fn test_nth_extremes_do_not_overflow() {
        assert!(!nth_matches(-1, i64::MIN, 1));
        assert!(!nth_matches(0, i64::MIN, 1));
        assert!(nth_matches(i64::MIN, 1, 1));
        assert!(!nth_matches(-1, i64::MIN, i64::MAX));

        let dom = page();
        assert_eq!(dom.query_selector(None, "p:nth-child(-n-9223372036854775808)").unwrap(), None);
        assert_eq!(dom.query_selector(None, "p:nth-child(9223372036854775807n+9223372036854775807)").unwrap(), None);
    }

    #[test]
    fn test_query_by_id_class_and_child() {
        let dom = page();
        let found = dom.query_selector(None, "#app > section.card:nth-child(2) h2").unwrap();
        assert_eq!(text_of(&dom, found), "Two");
    }

    #[test]
    fn test_query_escaped_class() {
        let dom = page();
        let found = dom.query_selector(None, "p.w-\\[50\\%\\]").unwrap();
        assert_eq!(text_of(&dom, found), "a");
    }

    #[test]
    fn test_query_attribute_and_siblings() {
        let dom = page();
        assert_eq!(text_of(&dom, dom.query_selector(None, "[data-role=note]").unwrap()), "b");
        assert_eq!(text_of(&dom, dom.query_selector(None, "[data-role] + p").unwrap()), "c");
        assert_eq!(text_of(&dom, dom.query_selector(None, "h2 ~ p:last-child").unwrap()), "a");
    }

    #[test]
    fn test_scoped_query() {
        let dom = page();
        let second = dom.query_selector(None, "section:nth-child(2)").unwrap().unwrap();

        let found = dom.query_selector(Some(second), ":scope > p").unwrap();
        assert_eq!(text_of(&dom, found), "b");

        // ancestors outside the scope still take part in matching
        let found = dom.query_selector(Some(second), "main p").unwrap();
        assert_eq!(text_of(&dom, found), "b");

        // the scope itself is never a result
        assert_eq!(dom.query_selector(Some(second), "section").unwrap(), None);
    }

    #[test]
    fn test_selector_list() {
        let dom = page();
        let all = dom.query_selector_all(None, "h2, [data-role]").unwrap();
        assert_eq!(all.len(), 3);
    }
}
