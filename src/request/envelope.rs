//! Request shape resolution
//!
//! A request either carries `action` at the top level, or wraps it in a
//! gateway envelope whose `body` field is JSON text:
//!
//! ```json
//! {"action": "start"}
//! {"body": "{\"action\":\"stop\"}"}
//! ```

use serde_json::Value;
use tracing::debug;

/// The raw request is not a JSON object
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Malformed request: expected a JSON object, got {0}")]
pub struct RequestShapeError(pub &'static str);

/// A request resolved to one of the two supported shapes
#[derive(Debug, Clone, PartialEq)]
pub enum InboundRequest {
    /// Gateway envelope with a textual `body` payload
    Enveloped { body: String },
    /// Direct invocation with top-level fields
    Direct { action: Option<Value> },
}

impl InboundRequest {
    pub fn resolve(event: &Value) -> Result<Self, RequestShapeError> {
        let fields = event
            .as_object()
            .ok_or_else(|| RequestShapeError(json_kind(event)))?;

        if let Some(Value::String(body)) = fields.get("body") {
            return Ok(InboundRequest::Enveloped { body: body.clone() });
        }

        Ok(InboundRequest::Direct {
            action: fields.get("action").cloned(),
        })
    }

    /// The raw `action` value; an unparseable envelope body yields `None`
    pub fn action(&self) -> Option<Value> {
        match self {
            InboundRequest::Direct { action } => action.clone(),
            InboundRequest::Enveloped { body } => match serde_json::from_str::<Value>(body) {
                Ok(Value::Object(mut fields)) => fields.remove("action"),
                Ok(other) => {
                    debug!("Envelope body is a JSON {}, not an object", json_kind(&other));
                    None
                }
                Err(e) => {
                    debug!("Envelope body is not valid JSON: {}", e);
                    None
                }
            },
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
