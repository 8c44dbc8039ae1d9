//! Parsing of J-Platform success and error bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What J-Platform hands back for a created slip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlipReceipt {
    pub transaction_no: Option<String>,
    /// Document number, e.g. `"SIL-202600000001"` for invoices.
    pub code: Option<String>,
    pub logical_ref: Option<i64>,
    /// Raw response body.
    pub body: String,
}

impl SlipReceipt {
    /// Pull the known fields out of a 2xx body. Anything unparseable leaves
    /// the field empty.
    pub fn parse(body: &str) -> Self {
        let root: Value = serde_json::from_str(body).unwrap_or(Value::Null);
        Self {
            transaction_no: text_field(&root, "transactionNo"),
            code: text_field(&root, "code"),
            logical_ref: root.get("logicalRef").and_then(|v| match v {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }),
            body: body.to_string(),
        }
    }

    /// Reference stored on the queue row: the transaction number, else the
    /// logical ref.
    pub fn reference(&self) -> Option<String> {
        self.transaction_no
            .clone()
            .or_else(|| self.logical_ref.map(|r| r.to_string()))
    }

    /// Invoice series, the first three characters of `code`.
    pub fn invoice_no_part1(&self) -> Option<String> {
        self.code.as_deref().map(|c| c.chars().take(3).collect())
    }

    /// Invoice number without its series.
    pub fn invoice_no_part2(&self) -> Option<String> {
        self.code.as_deref().map(|c| c.chars().skip(3).collect())
    }
}

fn text_field(root: &Value, key: &str) -> Option<String> {
    match root.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Vendor error text from a non-2xx body.
///
/// J-Platform is inconsistent about where it puts the message; the shapes
/// are tried in a fixed order and `None` means none matched.
pub fn error_message(body: &str) -> Option<String> {
    let root: Value = serde_json::from_str(body).ok()?;

    if let Some(Value::Array(messages)) = root.get("message") {
        let joined = messages
            .iter()
            .map(|m| match m {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" | ");
        return Some(joined);
    }

    if let Some(error) = root.get("error") {
        if let Some(message) = error.get("message").and_then(Value::as_str) {
            return Some(message.to_string());
        }
    }

    ["Message", "ERRORMESSAGE", "errorMessage"]
        .iter()
        .find_map(|key| root.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
