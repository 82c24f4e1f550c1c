//! Remote tool sessions over a scripted subprocess.
//!
//! Each test spawns `sh` with a script playing the server's side of the
//! newline-framed JSON-RPC conversation: read a request line on stdin,
//! answer on stdout.

use converse::mcp::McpSession;
use converse::prelude::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const INIT_RESPONSE: &str = r#"{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2025-06-18","capabilities":{"tools":{}},"serverInfo":{"name":"scripted-tools","version":"0.0.1"}}}"#;

async fn connect(script: &str) -> converse::Result<McpSession> {
    McpSession::connect_stdio("sh", &["-c", script], &[]).await
}

#[tokio::test]
async fn stdio_handshake_lists_and_dispatches() {
    // initialize, notifications/initialized, tools/list, tools/call.
    let script = format!(
        r#"
read line
printf '%s\n' '{INIT_RESPONSE}'
read line
read line
printf '%s\n' '{{"jsonrpc":"2.0","id":2,"result":{{"tools":[{{"name":"add","description":"Add two integers","inputSchema":{{"type":"object","properties":{{"a":{{"type":"integer"}},"b":{{"type":"integer"}}}},"required":["a","b"]}}}}]}}}}'
read line
printf '%s\n' '{{"jsonrpc":"2.0","id":3,"result":{{"content":[{{"type":"text","text":"{{\"sum\": 4}}"}}]}}}}'
"#
    );

    let session = Arc::new(connect(&script).await.unwrap());
    assert_eq!(session.server_name().as_deref(), Some("scripted-tools"));

    let mut registry = ToolRegistry::new();
    let count = session.register_tools(&mut registry).await.unwrap();
    assert_eq!(count, 1);

    let declaration = registry.get("add").unwrap().declaration();
    assert_eq!(declaration.parameters.as_ref().unwrap()["required"], json!(["a", "b"]));

    let result = registry
        .get("add")
        .unwrap()
        .invoke(json!({"a": 2, "b": 2}))
        .await
        .unwrap();
    assert_eq!(result, json!({"sum": 4}));
}

#[tokio::test]
async fn in_flight_request_fails_fast_when_the_server_closes_stdout() {
    // The server completes the handshake, reads the tools/list request, and
    // exits without answering it.
    let script = format!(
        r#"
read line
printf '%s\n' '{INIT_RESPONSE}'
read line
read line
"#
    );

    let session = connect(&script).await.unwrap();
    let result = timeout(Duration::from_secs(10), session.list_tools()).await;
    let err = result.expect("waiter should be woken at EOF").unwrap_err();
    assert!(matches!(err, Error::Mcp(_)));
}

#[tokio::test]
async fn request_after_server_exit_errors_instead_of_hanging() {
    // The server dies right after the handshake.
    let script = format!(
        r#"
read line
printf '%s\n' '{INIT_RESPONSE}'
read line
"#
    );

    let session = connect(&script).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let result = timeout(Duration::from_secs(10), session.list_tools()).await;
    let err = result.expect("dead server should fail the call").unwrap_err();
    assert!(matches!(err, Error::Mcp(_)));
}

#[tokio::test]
async fn shutdown_wakes_in_flight_waiters() {
    // The server answers the handshake, then goes silent while staying alive.
    let script = format!(
        r#"
read line
printf '%s\n' '{INIT_RESPONSE}'
read line
sleep 60
"#
    );

    let session = Arc::new(connect(&script).await.unwrap());

    let in_flight = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.list_tools().await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;

    session.shutdown().await.unwrap();

    let result = timeout(Duration::from_secs(10), in_flight)
        .await
        .expect("shutdown should wake the waiter")
        .unwrap();
    assert!(matches!(result, Err(Error::Mcp(_))));
}
