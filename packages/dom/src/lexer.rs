//! Markup lexers built with logos
//!
//! Two levels: [`MarkupToken`] splits a document into tags, text and
//! comments; [`TagToken`] splits the inside of a start tag into a name and
//! attributes.

use logos::{Lexer, Logos};

/// Top-level markup tokens
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
pub enum MarkupToken<'src> {
    /// Comment body, without the `<!--` / `-->` delimiters
    #[token("<!--", lex_comment)]
    Comment(&'src str),

    #[regex(r"<![dD][oO][cC][tT][yY][pP][eE][^>]*>", |lex| lex.slice())]
    Doctype(&'src str),

    #[regex(r#"<[a-zA-Z][a-zA-Z0-9:_-]*([^>"']|"[^"]*"|'[^']*')*>"#, |lex| lex.slice())]
    StartTag(&'src str),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9:_-]*[ \t\r\n\f]*>", |lex| lex.slice())]
    EndTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),

    /// A `<` that does not open a tag; kept as text
    #[token("<")]
    Lt,
}

fn lex_comment<'src>(lex: &mut Lexer<'src, MarkupToken<'src>>) -> Option<&'src str> {
    let rest = lex.remainder();
    let end = rest.find("-->")?;
    lex.bump(end + 3);
    Some(&rest[..end])
}

/// Tokens inside a start tag (between `<` and `>`)
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TagToken<'src> {
    #[token("=")]
    Eq,

    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        &s[1..s.len() - 1]
    })]
    DoubleQuoted(&'src str),

    #[regex(r"'[^']*'", |lex| {
        let s = lex.slice();
        &s[1..s.len() - 1]
    })]
    SingleQuoted(&'src str),

    #[regex(r#"[^ \t\r\n\f"'=]+"#, |lex| lex.slice())]
    Word(&'src str),
}

/// Parsed start tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub self_closing: bool,
}

/// Split a raw `<tag a="b">` slice into name and attributes.
/// `pos` is the byte offset of the tag in the source, used for errors.
pub fn lex_start_tag(raw: &str, pos: usize) -> Result<StartTag, crate::ParseError> {
    let inner = raw
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .ok_or_else(|| crate::ParseError::malformed_tag(pos, "missing angle brackets"))?;

    let mut tokens = Vec::new();
    for (token, span) in TagToken::lexer(inner).spanned() {
        match token {
            Ok(token) => tokens.push(token),
            Err(_) => return Err(crate::ParseError::lexer_error(pos + 1 + span.start)),
        }
    }

    let mut iter = tokens.into_iter().peekable();
    let mut self_closing = false;

    let name = match iter.next() {
        Some(TagToken::Word(word)) => {
            let (word, closes) = strip_self_closing(word);
            self_closing |= closes;
            word.to_ascii_lowercase()
        }
        _ => return Err(crate::ParseError::malformed_tag(pos, "missing tag name")),
    };

    let mut attributes: Vec<(String, String)> = Vec::new();
    while let Some(token) = iter.next() {
        let TagToken::Word(word) = token else {
            // stray quoted text or `=`; browsers drop it
            continue;
        };

        if word == "/" {
            self_closing = iter.peek().is_none();
            continue;
        }

        let value = if iter.peek() == Some(&TagToken::Eq) {
            iter.next();
            match iter.next() {
                Some(TagToken::DoubleQuoted(v)) | Some(TagToken::SingleQuoted(v)) => v.to_string(),
                Some(TagToken::Word(v)) => v.to_string(),
                Some(TagToken::Eq) | None => String::new(),
            }
        } else {
            let (word, closes) = strip_self_closing(word);
            if closes && iter.peek().is_none() {
                self_closing = true;
                push_attribute(&mut attributes, word, String::new());
                continue;
            }
            String::new()
        };

        push_attribute(&mut attributes, word, value);
    }

    Ok(StartTag {
        name,
        attributes,
        self_closing,
    })
}

fn strip_self_closing(word: &str) -> (&str, bool) {
    match word.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => (stripped, true),
        _ => (word, false),
    }
}

fn push_attribute(attributes: &mut Vec<(String, String)>, name: &str, value: String) {
    let name = name.to_ascii_lowercase();
    if name.is_empty() || attributes.iter().any(|(existing, _)| *existing == name) {
        return;
    }
    let value = crate::escape::decode_entities(&value).into_owned();
    attributes.push((name, value));
}

/// Tag name of a raw `</tag>` slice
pub fn end_tag_name(raw: &str) -> String {
    raw.trim_start_matches("</")
        .trim_end_matches('>')
        .trim()
        .to_ascii_lowercase()
}
