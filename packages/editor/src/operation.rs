//! # Operations
//!
//! Wire format of a mutation request and its typed form.
//!
//! [`Operation`] is what an instruction source sends and what inverse batches
//! are stored as. Its fields are loosely typed on purpose: one malformed
//! operation must not reject the rest of a batch, so validation happens per
//! operation in [`Operation::to_mutation`] rather than at deserialization.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::MutationError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Replace,
    Append,
    Prepend,
    SetStyle,
    Remove,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Replace => "replace",
            Action::Append => "append",
            Action::Prepend => "prepend",
            Action::SetStyle => "setStyle",
            Action::Remove => "remove",
            Action::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// One structural edit addressed by selector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub selector: String,
    pub action: Action,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_styles"
    )]
    pub styles: Option<BTreeMap<String, String>>,
}

impl Operation {
    pub fn replace(selector: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_content(selector, Action::Replace, content)
    }

    pub fn append(selector: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_content(selector, Action::Append, content)
    }

    pub fn prepend(selector: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_content(selector, Action::Prepend, content)
    }

    pub fn set_style<K, V>(selector: impl Into<String>, styles: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            selector: selector.into(),
            action: Action::SetStyle,
            content: None,
            styles: Some(styles.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        }
    }

    pub fn remove(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            action: Action::Remove,
            content: None,
            styles: None,
        }
    }

    fn with_content(selector: impl Into<String>, action: Action, content: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            action,
            content: Some(content.into()),
            styles: None,
        }
    }

    /// Check required fields for the action and borrow the typed form
    pub fn to_mutation(&self) -> Result<Mutation<'_>, MutationError> {
        let content = || {
            self.content
                .as_deref()
                .ok_or_else(|| MutationError::malformed(format!("{} requires content", self.action)))
        };

        match self.action {
            Action::Replace => Ok(Mutation::Replace { content: content()? }),
            Action::Append => Ok(Mutation::Append { content: content()? }),
            Action::Prepend => Ok(Mutation::Prepend { content: content()? }),
            Action::SetStyle => self
                .styles
                .as_ref()
                .map(|styles| Mutation::SetStyle { styles })
                .ok_or_else(|| MutationError::malformed("setStyle requires styles")),
            Action::Remove => Ok(Mutation::Remove),
            Action::Unknown => Err(MutationError::malformed("unknown action")),
        }
    }
}

/// Validated operation payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mutation<'a> {
    /// Discard all children and parse `content` in their place
    Replace { content: &'a str },
    Append { content: &'a str },
    Prepend { content: &'a str },
    /// Merge into inline styles, overwriting the listed keys
    SetStyle { styles: &'a BTreeMap<String, String> },
    /// Detach the node from its parent
    Remove,
}

/// Outcome of one operation, in batch order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    pub selector: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    pub fn ok(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(selector: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Operations plus the selector all of them are scoped to
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub operations: Vec<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_selector: Option<String>,
}

/// Per-operation results and the batch that undoes the successful ones
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub results: Vec<OperationResult>,
    /// Most recent operation's inverse first
    pub inverse: Vec<Operation>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &OperationResult> {
        self.results.iter().filter(|r| !r.success)
    }

    pub fn has_errors(&self) -> bool {
        self.results.iter().any(|r| !r.success)
    }
}

/// Style values arrive as strings, numbers or booleans; `null` clears
fn deserialize_styles<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|styles| {
        styles
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let json = r##"[
            {"selector": "#hero", "action": "replace", "content": "<h1>Hi</h1>"},
            {"selector": ":scope", "action": "setStyle", "styles": {"color": "red", "opacity": 0.5}},
            {"selector": ".ad", "action": "explode"}
        ]"##;

        let ops: Vec<Operation> = serde_json::from_str(json).unwrap();
        assert_eq!(ops[0], Operation::replace("#hero", "<h1>Hi</h1>"));
        assert_eq!(
            ops[1],
            Operation::set_style(":scope", [("color", "red"), ("opacity", "0.5")])
        );
        assert_eq!(ops[2].action, Action::Unknown);
    }

    #[test]
    fn test_optional_fields_omitted() {
        let json = serde_json::to_string(&Operation::remove(".x")).unwrap();
        assert_eq!(json, r#"{"selector":".x","action":"remove"}"#);

        let json = serde_json::to_string(&OperationResult::ok(".x")).unwrap();
        assert_eq!(json, r#"{"selector":".x","success":true}"#);
    }

    #[test]
    fn test_to_mutation_requires_fields() {
        let missing_content = Operation {
            selector: "p".to_string(),
            action: Action::Append,
            content: None,
            styles: None,
        };
        assert_eq!(
            missing_content.to_mutation(),
            Err(MutationError::malformed("append requires content"))
        );

        let missing_styles = Operation {
            action: Action::SetStyle,
            ..missing_content.clone()
        };
        assert!(missing_styles.to_mutation().is_err());

        let unknown = Operation {
            action: Action::Unknown,
            ..missing_content
        };
        assert!(unknown.to_mutation().is_err());

        assert_eq!(Operation::remove("p").to_mutation(), Ok(Mutation::Remove));
    }

    #[test]
    fn test_outcome_helpers() {
        let outcome = BatchOutcome {
            results: vec![
                OperationResult::ok("a"),
                OperationResult::failed("b", "Element not found"),
            ],
            inverse: vec![],
        };
        assert_eq!(outcome.succeeded(), 1);
        assert!(outcome.has_errors());
        assert_eq!(outcome.failures().count(), 1);
    }
}
