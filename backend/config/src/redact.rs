//! Config redaction: produce loggable config snapshots by masking secrets.

use serde_json::Value;

/// Keys whose string values are masked.
static SENSITIVE_KEYS: &[&str] = &[
    "accessToken",
    "access_token",
    "token",
    "apiKey",
    "api_key",
    "secret",
    "password",
];

/// Redact a config value tree, masking every sensitive string field.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) if is_sensitive_key(key) && !s.is_empty() => {
            // Keep a short hint so operators can tell tokens apart.
            let hint: String = s.chars().take(4).collect();
            if s.chars().count() > 8 {
                Value::String(format!("{hint}***"))
            } else {
                Value::String("***".to_string())
            }
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_recursive(v, k)))
                .collect(),
        ),
        other => other.clone(),
    }
}
