//! Tool-protocol sessions over a subprocess or HTTP.
//!
//! Both flavors speak JSON-RPC 2.0. The stdio flavor spawns the server as a
//! child process and frames messages as newline-delimited JSON on its
//! stdin/stdout; a background task routes responses to their waiting
//! callers. The HTTP flavor posts each call to a streamable endpoint and
//! accepts either a JSON body or an SSE body carrying the response frame.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

use crate::error::{Error, Result, ToolFault};
use crate::tools::{ToolHandler, ToolRegistry};
use crate::types::FunctionDeclaration;

use super::types::{
    InitializeResult, JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, McpToolInfo,
    ToolCallResult, ToolsListResult, PROTOCOL_VERSION,
};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

type ResponseWaiter = oneshot::Sender<JsonRpcResponse>;
type PendingMap = Arc<Mutex<HashMap<u64, ResponseWaiter>>>;

enum SessionTransport {
    Stdio {
        stdin: AsyncMutex<ChildStdin>,
        pending: PendingMap,
        child: Mutex<Option<Child>>,
        reader: Mutex<Option<JoinHandle<()>>>,
    },
    Http {
        http: reqwest::Client,
        url: String,
        session_id: Mutex<Option<String>>,
    },
}

/// A live session with a remote tool server.
///
/// Construction performs the full handshake (`initialize` followed by the
/// `notifications/initialized` notification), so a returned session is ready
/// for `tools/list` and `tools/call`.
pub struct McpSession {
    transport: SessionTransport,
    next_id: AtomicU64,
    request_timeout: Duration,
    server_name: Mutex<Option<String>>,
}

impl std::fmt::Debug for McpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flavor = match &self.transport {
            SessionTransport::Stdio { .. } => "stdio",
            SessionTransport::Http { .. } => "http",
        };
        f.debug_struct("McpSession")
            .field("transport", &flavor)
            .field("server", &self.server_name.lock().ok().and_then(|s| s.clone()))
            .finish()
    }
}

impl McpSession {
    /// Spawn a tool server as a subprocess and complete the handshake.
    ///
    /// The child is killed when the session is dropped.
    pub async fn connect_stdio(
        command: &str,
        args: &[&str],
        envs: &[(&str, &str)],
    ) -> Result<Self> {
        let mut child = Command::new(command)
            .args(args)
            .envs(envs.iter().copied())
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Mcp(format!("failed to spawn {command}: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Mcp("child stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Mcp("child stdout unavailable".to_string()))?;

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let reader = tokio::spawn(Self::read_frames(stdout, Arc::clone(&pending)));

        let session = Self {
            transport: SessionTransport::Stdio {
                stdin: AsyncMutex::new(stdin),
                pending,
                child: Mutex::new(Some(child)),
                reader: Mutex::new(Some(reader)),
            },
            next_id: AtomicU64::new(1),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            server_name: Mutex::new(None),
        };
        session.handshake().await?;
        Ok(session)
    }

    /// Connect to a tool server over streamable HTTP and complete the
    /// handshake.
    pub async fn connect_http(url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()?;
        let session = Self {
            transport: SessionTransport::Http {
                http,
                url: url.into(),
                session_id: Mutex::new(None),
            },
            next_id: AtomicU64::new(1),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            server_name: Mutex::new(None),
        };
        session.handshake().await?;
        Ok(session)
    }

    /// Name reported by the server during the handshake, if any.
    pub fn server_name(&self) -> Option<String> {
        self.server_name.lock().ok().and_then(|s| s.clone())
    }

    async fn handshake(&self) -> Result<()> {
        let result = self
            .request(
                "initialize",
                Some(json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                })),
            )
            .await?;
        let init: InitializeResult = serde_json::from_value(result)?;
        if let Some(info) = &init.server_info {
            tracing::debug!(server = %info.name, protocol = %init.protocol_version, "tool server initialized");
            if let Ok(mut name) = self.server_name.lock() {
                *name = Some(info.name.clone());
            }
        }
        self.notify("notifications/initialized", None).await
    }

    /// List the server's tools as function declarations.
    pub async fn list_tools(&self) -> Result<Vec<FunctionDeclaration>> {
        let result = self.request("tools/list", Some(json!({}))).await?;
        let listed: ToolsListResult = serde_json::from_value(result)?;
        Ok(listed.tools.into_iter().map(declaration_from_info).collect())
    }

    /// Invoke a named tool on the server.
    ///
    /// A result the server marks as an error becomes [`Error::Mcp`]; the
    /// registry proxy downgrades that to a tool fault.
    pub async fn call_tool(&self, name: &str, args: Value) -> Result<Value> {
        let result = self
            .request("tools/call", Some(json!({"name": name, "arguments": args})))
            .await?;
        let call: ToolCallResult = serde_json::from_value(result)?;
        let text = call.text();
        if call.is_error {
            return Err(Error::Mcp(format!("tool {name} failed: {text}")));
        }
        // Structured text results come back as JSON when they parse as such.
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }

    /// Register every server tool into the given registry.
    ///
    /// Returns the number of tools registered.
    pub async fn register_tools(self: &Arc<Self>, registry: &mut ToolRegistry) -> Result<usize> {
        let declarations = self.list_tools().await?;
        let count = declarations.len();
        for declaration in declarations {
            registry.register(Arc::new(McpToolHandler {
                session: Arc::clone(self),
                declaration,
            }));
        }
        Ok(count)
    }

    /// Terminate the session, killing the subprocess if one was spawned.
    pub async fn shutdown(&self) -> Result<()> {
        if let SessionTransport::Stdio {
            child,
            reader,
            pending,
            ..
        } = &self.transport
        {
            let handle = reader.lock().ok().and_then(|mut r| r.take());
            if let Some(handle) = handle {
                handle.abort();
            }
            // Wake in-flight waiters rather than leaving them to time out.
            if let Ok(mut map) = pending.lock() {
                map.clear();
            }
            let taken = child.lock().ok().and_then(|mut c| c.take());
            if let Some(mut child) = taken {
                child
                    .kill()
                    .await
                    .map_err(|e| Error::Mcp(format!("failed to kill tool server: {e}")))?;
            }
        }
        Ok(())
    }

    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let frame = JsonRpcRequest::call(id, method, params);
        let response = match &self.transport {
            SessionTransport::Stdio { stdin, pending, .. } => {
                let (tx, rx) = oneshot::channel();
                pending
                    .lock()
                    .map_err(|_| Error::Mcp("pending map poisoned".to_string()))?
                    .insert(id, tx);

                if let Err(e) = self.write_frame(stdin, &frame).await {
                    if let Ok(mut map) = pending.lock() {
                        map.remove(&id);
                    }
                    return Err(e);
                }

                match tokio::time::timeout(self.request_timeout, rx).await {
                    Ok(Ok(response)) => response,
                    Ok(Err(_)) => {
                        return Err(Error::Mcp(format!("server closed during {method}")))
                    }
                    Err(_) => {
                        if let Ok(mut map) = pending.lock() {
                            map.remove(&id);
                        }
                        return Err(Error::Mcp(format!("timeout waiting for {method}")));
                    }
                }
            }
            SessionTransport::Http { .. } => self.post_frame(&frame, id).await?,
        };

        if let Some(error) = response.error {
            return Err(Error::Mcp(format!(
                "{method} failed ({}): {}",
                error.code, error.message
            )));
        }
        response
            .result
            .ok_or_else(|| Error::Mcp(format!("{method} returned neither result nor error")))
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        let frame = JsonRpcRequest::notification(method, params);
        match &self.transport {
            SessionTransport::Stdio { stdin, .. } => self.write_frame(stdin, &frame).await,
            SessionTransport::Http { http, url, session_id } => {
                let mut post = http
                    .post(url)
                    .header(reqwest::header::ACCEPT, "application/json, text/event-stream")
                    .json(&frame);
                if let Some(sid) = session_id.lock().ok().and_then(|s| s.clone()) {
                    post = post.header("Mcp-Session-Id", sid);
                }
                let response = post.send().await?;
                if !response.status().is_success() {
                    return Err(Error::Mcp(format!(
                        "{method} notification rejected with {}",
                        response.status()
                    )));
                }
                Ok(())
            }
        }
    }

    async fn write_frame(
        &self,
        stdin: &AsyncMutex<ChildStdin>,
        frame: &JsonRpcRequest,
    ) -> Result<()> {
        let mut line = serde_json::to_string(frame)?;
        line.push('\n');
        let mut stdin = stdin.lock().await;
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| Error::Mcp(format!("write to tool server failed: {e}")))?;
        stdin
            .flush()
            .await
            .map_err(|e| Error::Mcp(format!("flush to tool server failed: {e}")))
    }

    async fn post_frame(&self, frame: &JsonRpcRequest, id: u64) -> Result<JsonRpcResponse> {
        let SessionTransport::Http { http, url, session_id } = &self.transport else {
            return Err(Error::Mcp("not an HTTP session".to_string()));
        };

        let mut post = http
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json, text/event-stream")
            .json(frame);
        if let Some(sid) = session_id.lock().ok().and_then(|s| s.clone()) {
            post = post.header("Mcp-Session-Id", sid);
        }
        let response = post.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Mcp(format!(
                "{} rejected with {status}",
                frame.method
            )));
        }

        // The server may pin a session on initialize.
        if let Some(sid) = response
            .headers()
            .get("Mcp-Session-Id")
            .and_then(|v| v.to_str().ok())
        {
            if let Ok(mut slot) = session_id.lock() {
                *slot = Some(sid.to_string());
            }
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await?;

        if content_type.starts_with("text/event-stream") {
            // Scan the SSE body for the frame answering our id.
            for data in body.lines().filter_map(|l| l.strip_prefix("data:")) {
                if let Ok(frame) = serde_json::from_str::<JsonRpcResponse>(data.trim()) {
                    if frame.id == id {
                        return Ok(frame);
                    }
                }
            }
            Err(Error::Mcp(format!(
                "no response for id {id} in event stream"
            )))
        } else {
            Ok(serde_json::from_str(&body)?)
        }
    }

    async fn read_frames(stdout: tokio::process::ChildStdout, pending: PendingMap) {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<JsonRpcMessage>(line) {
                Ok(JsonRpcMessage::Response(response)) => {
                    let waiter = pending.lock().ok().and_then(|mut map| map.remove(&response.id));
                    match waiter {
                        Some(waiter) => {
                            let _ = waiter.send(response);
                        }
                        None => {
                            tracing::warn!(id = response.id, "response for unknown request id")
                        }
                    }
                }
                Ok(JsonRpcMessage::Request(request)) => {
                    tracing::debug!(method = %request.method, "ignoring server-initiated frame");
                }
                Err(e) => tracing::warn!(error = %e, "undecodable frame from tool server"),
            }
        }
        // EOF: wake every waiter so callers fail fast instead of timing out.
        if let Ok(mut map) = pending.lock() {
            map.clear();
        }
    }
}

fn declaration_from_info(info: McpToolInfo) -> FunctionDeclaration {
    FunctionDeclaration {
        name: info.name,
        description: info.description.unwrap_or_default(),
        parameters: info.input_schema,
    }
}

/// Registry adapter that proxies invocations to a live session.
///
/// Server-side failures surface as tool faults, so the conversation
/// continues with the failure reported to the model as data.
pub struct McpToolHandler {
    session: Arc<McpSession>,
    declaration: FunctionDeclaration,
}

#[async_trait::async_trait]
impl ToolHandler for McpToolHandler {
    fn declaration(&self) -> &FunctionDeclaration {
        &self.declaration
    }

    async fn invoke(&self, args: Value) -> std::result::Result<Value, ToolFault> {
        self.session
            .call_tool(&self.declaration.name, args)
            .await
            .map_err(ToolFault::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn declaration_maps_input_schema_to_parameters() {
        let info = McpToolInfo {
            name: "search".into(),
            description: Some("Full-text search".into()),
            input_schema: Some(json!({"type": "object"})),
        };
        let declaration = declaration_from_info(info);
        assert_eq!(declaration.name, "search");
        assert_eq!(declaration.parameters, Some(json!({"type": "object"})));
    }

    #[test]
    fn declaration_tolerates_missing_fields() {
        let info: McpToolInfo = serde_json::from_value(json!({"name": "bare"})).unwrap();
        let declaration = declaration_from_info(info);
        assert_eq!(declaration.description, "");
        assert!(declaration.parameters.is_none());
    }
}
