//! Parsing of instruction-source responses into design variations.
//!
//! Accepted shapes, in order:
//!
//! - `{ "variations": [ ... ] }`
//! - `[ ... ]`, a bare list of variations
//! - `{ "title", "summary", "operations" }`, a single variation
//!
//! Text that is not JSON as a whole is searched for the first `{...}` or
//! `[...]` span. A top-level `usage` (or `usageMetadata`) object on an
//! object response is read into [`Usage`].

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::budget::Usage;
use crate::errors::EditorError;
use crate::operation::Operation;
use crate::reconciler::TurnRequest;

const DEFAULT_TITLE: &str = "Generated Design";

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Variation {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl Variation {
    /// Turn request applying this variation under `root_selector`
    pub fn into_request(
        self,
        instruction: impl Into<String>,
        root_selector: Option<String>,
        usage: Option<Usage>,
    ) -> TurnRequest {
        TurnRequest {
            instruction: instruction.into(),
            summary: Some(self.summary).filter(|s| !s.is_empty()),
            operations: self.operations,
            root_selector,
            usage,
            aux_snapshot: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DesignResponse {
    pub variations: Vec<Variation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

pub fn parse_design_response(text: &str) -> Result<DesignResponse, EditorError> {
    let value = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(_) => extract_json(text)?,
    };

    let mut usage = None;
    let variations = match value {
        Value::Object(mut object) => {
            usage = take_usage(&mut object);
            match object.remove("variations") {
                Some(variations @ Value::Array(_)) => from_value(variations)?,
                _ => vec![from_value(Value::Object(object))?],
            }
        }
        array @ Value::Array(_) => from_value(array)?,
        other => {
            return Err(EditorError::InvalidResponse(format!(
                "expected an object or array, found {}",
                other
            )))
        }
    };

    Ok(DesignResponse { variations, usage })
}

/// Token counts are informational; a malformed block is ignored
fn take_usage(object: &mut serde_json::Map<String, Value>) -> Option<Usage> {
    let usage = object.remove("usage");
    let metadata = object.remove("usageMetadata");
    usage
        .or(metadata)
        .and_then(|value| serde_json::from_value(value).ok())
}

fn extract_json(text: &str) -> Result<Value, EditorError> {
    static SPAN: OnceLock<Option<Regex>> = OnceLock::new();
    let span = SPAN
        .get_or_init(|| Regex::new(r"(?s)\{.*\}|\[.*\]").ok())
        .as_ref()
        .and_then(|re| re.find(text))
        .ok_or_else(|| EditorError::InvalidResponse("no JSON found in response".to_string()))?;

    serde_json::from_str(span.as_str()).map_err(|e| EditorError::InvalidResponse(e.to_string()))
}

fn from_value<V: serde::de::DeserializeOwned>(value: Value) -> Result<V, EditorError> {
    serde_json::from_value(value).map_err(|e| EditorError::InvalidResponse(e.to_string()))
}
