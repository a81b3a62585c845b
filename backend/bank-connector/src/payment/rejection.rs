//! Human-readable reasons out of a bank's payment error body.
//!
//! Shape handled:
//! ```json
//! { "errors": [ { "message": "...", "code": "...",
//!                 "params": [[ { "errorCode": "...", "field": { "exposedName": "..." } } ]] } ],
//!   "payload": { "message": "..." } }
//! ```

use serde_json::Value;

pub const FALLBACK_MESSAGE: &str = "Error processing payment";

pub fn rejection_messages(body: &Value) -> Vec<String> {
    let mut messages = Vec::new();

    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        for error in errors {
            collect_error(error, &mut messages);
        }
    }

    if messages.is_empty()
        && let Some(message) = body
            .pointer("/payload/message")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
    {
        messages.push(message.trim().to_string());
    }

    if messages.is_empty()
        && let Some(text) = body.as_str().filter(|t| !t.trim().is_empty())
    {
        messages.push(text.trim().to_string());
    }

    if messages.is_empty() {
        messages.push(FALLBACK_MESSAGE.to_string());
    }

    messages
}

fn collect_error(error: &Value, messages: &mut Vec<String>) {
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty());

    match (message, error.get("code")) {
        (Some(message), _) => messages.push(message.trim().to_string()),
        (None, Some(code)) if !code.is_null() => {
            messages.push(format!("Error code: {}", scalar_text(code)))
        }
        _ => {}
    }

    if let Some(params) = error.get("params").and_then(Value::as_array) {
        for group in params {
            match group.as_array() {
                Some(group) => group.iter().for_each(|p| collect_param(p, messages)),
                None => collect_param(group, messages),
            }
        }
    }
}

fn collect_param(param: &Value, messages: &mut Vec<String>) {
    let field = param
        .pointer("/field/exposedName")
        .and_then(Value::as_str);

    if let (Some(field), Some(code)) = (field, param.get("errorCode")) {
        messages.push(format!("Field '{}': {}", field, scalar_text(code)));
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
