//! Tool dispatcher: lookup, argument validation, bounded execution, and
//! normalization of every outcome into the response envelope.
//!
//! Per-call state machine: Received → Validated → Executing →
//! Completed{Success|Failure}. No retries happen here — retry policy belongs
//! to individual handlers. No error raised below this layer escapes; every
//! path returns a `ToolCallResult`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

use crate::envelope::{ResponseEnvelope, ToolCallResult};
use crate::error::ServerError;
use crate::registry::ToolRegistry;

/// Call counters shared between the dispatcher (writer) and the status tool
/// (reader).
#[derive(Default)]
pub struct CallStats {
    completed_calls: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl CallStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count of calls that reached the Completed state, success or failure.
    pub fn completed_calls(&self) -> u64 {
        self.completed_calls.load(Ordering::Relaxed)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().expect("last_error lock poisoned").clone()
    }

    fn record_completed(&self) {
        self.completed_calls.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self, message: String) {
        *self.last_error.lock().expect("last_error lock poisoned") = Some(message);
    }
}

pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    stats: Arc<CallStats>,
    call_timeout: Duration,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, stats: Arc<CallStats>, call_timeout: Duration) -> Self {
        Self {
            registry,
            stats,
            call_timeout,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &CallStats {
        &self.stats
    }

    pub async fn dispatch(&self, name: &str, args: Value) -> ToolCallResult {
        tracing::debug!(tool = name, "Tool call received");
        let result = self.dispatch_inner(name, args).await;
        self.stats.record_completed();
        match &result {
            ToolCallResult::Success(_) => {
                tracing::debug!(tool = name, "Tool call completed");
            }
            ToolCallResult::Failure { kind, message } => {
                tracing::warn!(tool = name, kind = %kind, "Tool call failed: {}", message);
                self.stats.record_failure(format!("{name}: {message}"));
            }
        }
        result
    }

    async fn dispatch_inner(&self, name: &str, args: Value) -> ToolCallResult {
        let definition = match self.registry.get(name) {
            Ok(def) => def,
            Err(err) => return ToolCallResult::failure(&err),
        };

        if let Err(err) = validate_args(&definition.input_schema, &args) {
            return ToolCallResult::failure(&err);
        }
        tracing::debug!(tool = name, "Arguments validated, executing");

        // The bounded timeout keeps an abandoned call from leaking the
        // session lock forever.
        let outcome = tokio::time::timeout(self.call_timeout, definition.invoke(args)).await;
        match outcome {
            Ok(Ok(output)) => ToolCallResult::Success(ResponseEnvelope::from_output(name, output)),
            Ok(Err(err)) => ToolCallResult::failure(&err),
            Err(_) => ToolCallResult::failure(&ServerError::OperationTimeout(self.call_timeout)),
        }
    }
}

/// Structural validation of a JSON argument object against a schemars-produced
/// JSON Schema: required fields must be present, and present fields must match
/// the declared primitive type. Unknown fields pass through untouched (the
/// handler's serde deserialization ignores them).
pub fn validate_args(schema: &Value, args: &Value) -> Result<(), ServerError> {
    let args_obj = match args {
        Value::Null => return check_required(schema, &serde_json::Map::new()),
        Value::Object(map) => map,
        other => {
            return Err(ServerError::InvalidArguments(format!(
                "expected an argument object, got {}",
                json_type_name(other)
            )))
        }
    };

    check_required(schema, args_obj)?;

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (field, field_schema) in properties {
            let Some(value) = args_obj.get(field) else { continue };
            if value.is_null() {
                // Optional fields may be passed explicitly as null.
                continue;
            }
            if !type_matches(field_schema, value) {
                return Err(ServerError::InvalidArguments(format!(
                    "field '{}' has type {}, expected {}",
                    field,
                    json_type_name(value),
                    declared_types(field_schema).join(" or "),
                )));
            }
        }
    }
    Ok(())
}

fn check_required(schema: &Value, args: &serde_json::Map<String, Value>) -> Result<(), ServerError> {
    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required.iter().filter_map(Value::as_str) {
            if !args.contains_key(field) || args[field].is_null() {
                return Err(ServerError::InvalidArguments(format!(
                    "missing required field '{field}'"
                )));
            }
        }
    }
    Ok(())
}

fn declared_types(field_schema: &Value) -> Vec<String> {
    match field_schema.get("type") {
        Some(Value::String(t)) => vec![t.clone()],
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn type_matches(field_schema: &Value, value: &Value) -> bool {
    let declared = declared_types(field_schema);
    if declared.is_empty() {
        // No type constraint (e.g. enum refs) — accept.
        return true;
    }
    declared.iter().any(|t| match t.as_str() {
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
