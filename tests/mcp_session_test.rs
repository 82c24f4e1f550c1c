//! Remote tool sessions over the HTTP flavor, against a mock server.

use converse::mcp::McpSession;
use converse::prelude::*;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_handshake(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({"method": "initialize"})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Mcp-Session-Id", "session-1")
                .set_body_json(json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": {
                        "protocolVersion": "2025-06-18",
                        "capabilities": {"tools": {}},
                        "serverInfo": {"name": "mock-tools", "version": "0.1.0"}
                    }
                })),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({"method": "notifications/initialized"})))
        .respond_with(ResponseTemplate::new(202))
        .mount(server)
        .await;
}

#[tokio::test]
async fn handshake_pins_the_session_and_reports_the_server() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    let session = McpSession::connect_http(server.uri()).await.unwrap();
    assert_eq!(session.server_name().as_deref(), Some("mock-tools"));
}

#[tokio::test]
async fn listed_tools_become_function_declarations() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "tools/list"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "result": {
                "tools": [{
                    "name": "search_docs",
                    "description": "Search the documentation",
                    "inputSchema": {
                        "type": "object",
                        "properties": {"query": {"type": "string"}},
                        "required": ["query"]
                    }
                }]
            }
        })))
        .mount(&server)
        .await;

    let session = McpSession::connect_http(server.uri()).await.unwrap();
    let declarations = session.list_tools().await.unwrap();
    assert_eq!(declarations.len(), 1);
    assert_eq!(declarations[0].name, "search_docs");
    assert_eq!(
        declarations[0].parameters.as_ref().unwrap()["required"],
        json!(["query"])
    );
}

#[tokio::test]
async fn registered_remote_tools_dispatch_through_the_registry() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "tools/list"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "result": {"tools": [{"name": "add", "inputSchema": {"type": "object"}}]}
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "tools/call",
            "params": {"name": "add", "arguments": {"a": 2, "b": 2}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "result": {"content": [{"type": "text", "text": "{\"sum\": 4}"}]}
        })))
        .mount(&server)
        .await;

    let session = Arc::new(McpSession::connect_http(server.uri()).await.unwrap());
    let mut registry = ToolRegistry::new();
    let count = session.register_tools(&mut registry).await.unwrap();
    assert_eq!(count, 1);

    let handler = registry.get("add").unwrap();
    let result = handler.invoke(json!({"a": 2, "b": 2})).await.unwrap();
    assert_eq!(result, json!({"sum": 4}));
}

#[tokio::test]
async fn server_reported_tool_errors_become_faults() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "tools/list"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "result": {"tools": [{"name": "flaky", "inputSchema": {"type": "object"}}]}
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "tools/call"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "result": {
                "content": [{"type": "text", "text": "upstream timeout"}],
                "isError": true
            }
        })))
        .mount(&server)
        .await;

    let session = Arc::new(McpSession::connect_http(server.uri()).await.unwrap());
    let mut registry = ToolRegistry::new();
    session.register_tools(&mut registry).await.unwrap();

    let fault = registry
        .get("flaky")
        .unwrap()
        .invoke(json!({}))
        .await
        .unwrap_err();
    assert!(fault.message().contains("upstream timeout"));
}

#[tokio::test]
async fn sse_response_bodies_are_scanned_for_the_matching_frame() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    let body = concat!(
        "event: message\n",
        "data: {\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{\"tools\":[{\"name\":\"ping\"}]}}\n\n",
    );
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "tools/list"})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let session = McpSession::connect_http(server.uri()).await.unwrap();
    let declarations = session.list_tools().await.unwrap();
    assert_eq!(declarations[0].name, "ping");
}

#[tokio::test]
async fn json_rpc_errors_surface_as_mcp_errors() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "tools/list"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "error": {"code": -32601, "message": "method not found"}
        })))
        .mount(&server)
        .await;

    let session = McpSession::connect_http(server.uri()).await.unwrap();
    let err = session.list_tools().await.unwrap_err();
    assert!(matches!(err, Error::Mcp(_)));
    assert!(err.to_string().contains("method not found"));
}
