//! Inline style declarations (`style="..."`)
//!
//! Declarations keep their insertion order so serialization is stable.
//! Clearing a property keeps its slot; setting it again restores it at the
//! same position.
//! Property names are stored in kebab-case; camelCase names coming from
//! script-style payloads (`backgroundColor`) are normalized on the way in.

/// Ordered inline style declarations of one element
#[derive(Debug, Clone, Default)]
pub struct StyleDeclarations {
    /// Cleared properties stay as empty-value slots
    declarations: Vec<(String, String)>,
}

impl PartialEq for StyleDeclarations {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for StyleDeclarations {}

impl StyleDeclarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the text of a `style` attribute
    pub fn parse(css_text: &str) -> Self {
        let mut styles = Self::new();

        for declaration in split_declarations(css_text) {
            let Some((name, value)) = declaration.split_once(':') else {
                continue;
            };
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                continue;
            }
            styles.set(name, value);
        }

        styles
    }

    /// Value of a property, if set
    pub fn get(&self, property: &str) -> Option<&str> {
        let property = normalize_property(property);
        self.declarations
            .iter()
            .find(|(name, value)| *name == property && !value.is_empty())
            .map(|(_, value)| value.as_str())
    }

    /// Set a property. An empty value removes it.
    pub fn set(&mut self, property: &str, value: &str) {
        let property = normalize_property(property);
        let value = value.trim();

        match self.declarations.iter_mut().find(|(name, _)| *name == property) {
            Some((_, existing)) => *existing = value.to_string(),
            None if value.is_empty() => {}
            None => self.declarations.push((property, value.to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Properties that are set, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Serialized form used for the `style` attribute
    pub fn to_css_text(&self) -> String {
        self.iter()
            .map(|(name, value)| format!("{}: {};", name, value))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Convert `backgroundColor` / `WebkitTransform` / `cssFloat` into CSS names.
/// Custom properties and names that are already kebab-case pass through.
pub fn normalize_property(property: &str) -> String {
    let property = property.trim();

    if property.starts_with("--") {
        return property.to_string();
    }
    if property == "cssFloat" {
        return "float".to_string();
    }

    let mut out = String::with_capacity(property.len() + 4);
    for (i, ch) in property.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 || matches!(ch, 'W' | 'M' | 'O') {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Split on `;` outside of parentheses and quotes
fn split_declarations(css_text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, ch) in css_text.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                parts.push(&css_text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&css_text[start..]);

    parts
}
