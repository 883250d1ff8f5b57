use serde_json::Value;

/// Human-readable failure message pulled out of a backend error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorMessage {
    Detail(String),
    Message(String),
    RawBody(String),
    Status(u16),
}

// Tried in order before falling back to the raw body.
const MESSAGE_FIELDS: &[(&str, fn(String) -> ErrorMessage)] = &[
    ("detail", ErrorMessage::Detail),
    ("message", ErrorMessage::Message),
];

impl ErrorMessage {
    pub fn extract(status: u16, body: &str) -> Self {
        if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
            for (field, wrap) in MESSAGE_FIELDS {
                if let Some(text) = fields.get(*field).and_then(field_text) {
                    return wrap(text);
                }
            }
        }

        let raw = body.trim();
        if raw.is_empty() {
            ErrorMessage::Status(status)
        } else {
            ErrorMessage::RawBody(raw.to_string())
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ErrorMessage::Detail(text)
            | ErrorMessage::Message(text)
            | ErrorMessage::RawBody(text) => text,
            ErrorMessage::Status(status) => format!("request failed with status {}", status),
        }
    }
}

// FastAPI reports validation failures as a list under `detail`; those are
// surfaced as compact JSON rather than skipped.
fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
