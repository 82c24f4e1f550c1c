//! Tool registration.
//!
//! A tool is a named, schema-described callable the model may request. The
//! registry maps exact names to handlers; declaration order is preserved so
//! the declarations sent to the model are stable across requests.

pub(crate) mod dispatch;

pub use dispatch::{run_tool_loop, DEFAULT_MAX_TOOL_ROUNDS};

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ToolFault;
use crate::types::FunctionDeclaration;

/// An executable tool: its declaration plus its invocation behavior.
///
/// Implementations must be `Send + Sync`; the dispatcher invokes them
/// in-order and awaits each invocation before the next.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// The declaration advertised to the model.
    fn declaration(&self) -> &FunctionDeclaration;

    /// Execute the tool with the model-supplied keyword arguments.
    ///
    /// A fault here is contained by the dispatcher and reported back to the
    /// model as data; it never aborts the conversation.
    async fn invoke(&self, args: Value) -> std::result::Result<Value, ToolFault>;
}

type ToolFn =
    dyn Fn(Value) -> BoxFuture<'static, std::result::Result<Value, ToolFault>> + Send + Sync;

/// A tool backed by an async closure.
pub struct FunctionTool {
    declaration: FunctionDeclaration,
    handler: Box<ToolFn>,
}

impl FunctionTool {
    /// Create a tool from a declaration and an async handler.
    ///
    /// ```
    /// use converse::tools::FunctionTool;
    /// use converse::types::FunctionDeclaration;
    /// use serde_json::json;
    ///
    /// let add = FunctionTool::new(
    ///     FunctionDeclaration::new(
    ///         "add",
    ///         "Add two integers",
    ///         json!({
    ///             "type": "object",
    ///             "properties": {"a": {"type": "integer"}, "b": {"type": "integer"}},
    ///             "required": ["a", "b"]
    ///         }),
    ///     ),
    ///     |args| async move {
    ///         let a = args["a"].as_i64().unwrap_or(0);
    ///         let b = args["b"].as_i64().unwrap_or(0);
    ///         Ok(json!({"sum": a + b}))
    ///     },
    /// );
    /// assert_eq!(add.declaration().name, "add");
    /// ```
    pub fn new<F, Fut>(declaration: FunctionDeclaration, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = std::result::Result<Value, ToolFault>> + Send + 'static,
    {
        Self {
            declaration,
            handler: Box::new(move |args| Box::pin(handler(args))),
        }
    }

    /// The declaration this tool advertises.
    pub fn declaration(&self) -> &FunctionDeclaration {
        &self.declaration
    }
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.declaration.name)
            .finish()
    }
}

#[async_trait]
impl ToolHandler for FunctionTool {
    fn declaration(&self) -> &FunctionDeclaration {
        &self.declaration
    }

    async fn invoke(&self, args: Value) -> std::result::Result<Value, ToolFault> {
        (self.handler)(args).await
    }
}

/// Registry of callable tools, keyed by exact name.
///
/// Registering a name twice replaces the previous handler; declaration order
/// follows first registration.
#[derive(Default)]
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    order: Vec<String>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its declared name.
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        let name = handler.declaration().name.clone();
        if !self.handlers.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.handlers.insert(name, handler);
    }

    /// Register a closure-backed tool.
    pub fn register_fn<F, Fut>(&mut self, declaration: FunctionDeclaration, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = std::result::Result<Value, ToolFault>> + Send + 'static,
    {
        self.register(Arc::new(FunctionTool::new(declaration, handler)));
    }

    /// Look up a handler by exact name. No fuzzy matching.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.handlers.get(name)
    }

    /// Declarations of all registered tools, in registration order.
    pub fn declarations(&self) -> Vec<FunctionDeclaration> {
        self.order
            .iter()
            .filter_map(|name| self.handlers.get(name))
            .map(|h| h.declaration().clone())
            .collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.order)
            .finish()
    }
}
