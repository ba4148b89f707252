//! Escaping helpers shared by the serializer, the markup parser and the
//! selector engine.

use std::borrow::Cow;

/// Serialize an identifier for use in a selector (CSSOM `CSS.escape`).
///
/// `w-[50%]` becomes `w-\[50\%\]`, `123` becomes `\31 23`.
pub fn css_escape(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len() + 8);

    for (i, &ch) in chars.iter().enumerate() {
        match ch {
            '\0' => out.push('\u{FFFD}'),
            '\u{1}'..='\u{1f}' | '\u{7f}' => push_hex_escape(&mut out, ch),
            '0'..='9' if i == 0 => push_hex_escape(&mut out, ch),
            '0'..='9' if i == 1 && chars[0] == '-' => push_hex_escape(&mut out, ch),
            '-' if i == 0 && chars.len() == 1 => out.push_str("\\-"),
            c if c >= '\u{80}' || c == '-' || c == '_' || c.is_ascii_alphanumeric() => out.push(c),
            c => {
                out.push('\\');
                out.push(c);
            }
        }
    }

    out
}

fn push_hex_escape(out: &mut String, ch: char) {
    out.push_str(&format!("\\{:x} ", ch as u32));
}

/// Resolve CSS escapes inside an identifier token
pub fn css_unescape(ident: &str) -> String {
    if !ident.contains('\\') {
        return ident.to_string();
    }

    let mut out = String::with_capacity(ident.len());
    let mut chars = ident.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        let mut hex = String::new();
        while hex.len() < 6 {
            match chars.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    hex.push(*c);
                    chars.next();
                }
                _ => break,
            }
        }

        if hex.is_empty() {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
            continue;
        }

        if matches!(chars.peek(), Some(' ' | '\t' | '\n' | '\r' | '\u{c}')) {
            chars.next();
        }
        let code = u32::from_str_radix(&hex, 16).unwrap_or(0xFFFD);
        let decoded = match code {
            0 => '\u{FFFD}',
            _ => char::from_u32(code).unwrap_or('\u{FFFD}'),
        };
        out.push(decoded);
    }

    out
}

/// Decode character references in text and attribute values
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        match rest.find(';').filter(|&semi| semi <= 10) {
            Some(semi) => match decode_reference(&rest[1..semi]) {
                Some(ch) => {
                    out.push(ch);
                    rest = &rest[semi + 1..];
                }
                None => {
                    out.push('&');
                    rest = &rest[1..];
                }
            },
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);

    Cow::Owned(out)
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Escape a text node for serialization
pub fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

/// Escape an attribute value for serialization inside double quotes
pub fn escape_attribute(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}
