//! Tool registry: name → definition mapping with ordered discovery.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::envelope::ToolOutput;
use crate::error::ServerError;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<ToolOutput, ServerError>> + Send>>;

/// A registered handler: invocable with a single (possibly empty) JSON
/// argument object.
pub type ToolHandler = Arc<dyn Fn(Value) -> HandlerFuture + Send + Sync>;

/// Immutable once registered.
#[derive(Clone)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Arc<Value>,
    handler: ToolHandler,
}

impl ToolDefinition {
    pub fn new(
        name: &'static str,
        description: &'static str,
        input_schema: Value,
        handler: ToolHandler,
    ) -> Self {
        Self {
            name,
            description,
            input_schema: Arc::new(input_schema),
            handler,
        }
    }

    pub fn invoke(&self, args: Value) -> HandlerFuture {
        (self.handler)(args)
    }
}

/// Summary exposed by discovery listings.
#[derive(Debug, Clone)]
pub struct ToolSummary {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Arc<Value>,
}

#[derive(Default)]
pub struct ToolRegistry {
    // Registration order is what discovery reports; the map backs lookups.
    tools: Vec<ToolDefinition>,
    index: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: ToolDefinition) -> Result<(), ServerError> {
        if self.index.contains_key(definition.name) {
            return Err(ServerError::DuplicateTool(definition.name.to_string()));
        }
        self.index.insert(definition.name, self.tools.len());
        self.tools.push(definition);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&ToolDefinition, ServerError> {
        self.index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| ServerError::UnknownTool(name.to_string()))
    }

    /// Finite, restartable discovery listing in registration order.
    pub fn list(&self) -> impl Iterator<Item = ToolSummary> + '_ {
        self.tools.iter().map(|t| ToolSummary {
            name: t.name,
            description: t.description,
            input_schema: Arc::clone(&t.input_schema),
        })
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn noop_definition(name: &'static str) -> ToolDefinition {
        ToolDefinition::new(
            name,
            "test tool",
            json!({"type": "object", "properties": {}}),
            Arc::new(|_| Box::pin(async { Ok(ToolOutput::Text("ok".into())) })),
        )
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = ToolRegistry::new();
        registry.register(noop_definition("a")).unwrap();
        let err = registry.register(noop_definition("a")).unwrap_err();
        assert!(matches!(err, ServerError::DuplicateTool(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_tool_lookup_fails() {
        let registry = ToolRegistry::new();
        assert!(matches!(
            registry.get("missing"),
            Err(ServerError::UnknownTool(_))
        ));
    }

    #[test]
    fn list_preserves_registration_order_and_restarts() {
        let mut registry = ToolRegistry::new();
        for name in ["c", "a", "b"] {
            registry.register(noop_definition(name)).unwrap();
        }
        let first: Vec<_> = registry.list().map(|t| t.name).collect();
        let second: Vec<_> = registry.list().map(|t| t.name).collect();
        assert_eq!(first, vec!["c", "a", "b"]);
        assert_eq!(first, second);
    }
}
