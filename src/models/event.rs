use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Inbound domain event. Beyond the two required fields, events carry
/// whatever placeholder values their template references (`name`, `otp`, ...),
/// collected here untyped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub email: String,
    pub event_type: String,

    #[serde(flatten, default)]
    pub fields: HashMap<String, JsonValue>,
}

impl EventMessage {
    /// Substitution variables for template rendering: every extra field
    /// coerced to a string, plus `email` itself.
    pub fn variables(&self) -> HashMap<String, String> {
        let mut vars: HashMap<String, String> = self
            .fields
            .iter()
            .map(|(key, value)| (key.clone(), coerce_to_string(value)))
            .collect();

        vars.insert("email".to_string(), self.email.clone());
        vars
    }
}

fn coerce_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}
