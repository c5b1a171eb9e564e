//! Integration tests for the SQLite MCP bridge
//!
//! Each test starts a real server on an ephemeral port backed by a temporary
//! database and talks to it with `McpClient`.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use sqlite_mcp_bridge::api::{create_router, SseState};
use sqlite_mcp_bridge::config::HttpConfig;
use sqlite_mcp_bridge::constants::MESSAGES_PATH;
use sqlite_mcp_bridge::tools::register_all_tools;
use sqlite_mcp_bridge::{
    BridgeError, ClientConfig, ConnectionState, McpClient, McpServer, SqliteDatabase,
};
use tempfile::NamedTempFile;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const SCHEMA: &str = "
    CREATE TABLE properties (id INTEGER PRIMARY KEY, address TEXT, price REAL);
    CREATE TABLE agents (id INTEGER PRIMARY KEY, name TEXT);
    INSERT INTO properties VALUES (1, '12 Elm St', 250000.0), (2, '9 Oak Ave', 310000.5);
    INSERT INTO agents VALUES (1, 'Dana');
";

struct TestServer {
    base_url: String,
    state: Arc<SseState>,
    handle: JoinHandle<()>,
    _db: NamedTempFile,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn build_server(db_path: &std::path::Path) -> McpServer {
    let db = Arc::new(SqliteDatabase::new(db_path));
    let mut server = McpServer::new();
    register_all_tools(&mut server, db);
    server
}

async fn start_server(schema: &str) -> TestServer {
    let db = NamedTempFile::new().unwrap();
    rusqlite::Connection::open(db.path())
        .unwrap()
        .execute_batch(schema)
        .unwrap();

    let state = Arc::new(SseState::new(build_server(db.path())));
    let app = create_router(state.clone(), &HttpConfig::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{addr}"),
        state,
        handle,
        _db: db,
    }
}

async fn connected_client(server: &TestServer) -> McpClient {
    let mut client = McpClient::new(ClientConfig::new(server.base_url.clone())).unwrap();
    client.connect().await.unwrap();
    client
}

fn tool_text(result: &sqlite_mcp_bridge::protocol::ToolCallResult) -> &str {
    result.first_text().expect("tool result has text content")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connect_establishes_session() {
    let server = start_server(SCHEMA).await;
    let mut client = connected_client(&server).await;

    assert_eq!(client.state(), ConnectionState::Ready);
    let session_id = client.session_id().unwrap().to_string();
    assert_eq!(session_id.len(), 32);
    assert!(server.state.sessions.get_session(&session_id).is_some());

    let info = client.server_info().unwrap();
    assert_eq!(info["serverInfo"]["name"], "sqlite-mcp-server");
    assert_eq!(info["protocolVersion"], "2024-11-05");

    // The initialized notification gets no reply, so nothing is left over.
    assert_eq!(client.pending_len(), 0);

    client.disconnect().await;
    assert_eq!(client.state(), ConnectionState::Disconnected);
    assert!(client.session_id().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_tables() {
    let server = start_server(SCHEMA).await;
    let mut client = connected_client(&server).await;

    let result = client.list_tables().await.unwrap();
    assert!(!result.is_error);
    let mut tables: Vec<String> = serde_json::from_str(tool_text(&result)).unwrap();
    tables.sort();
    assert_eq!(tables, vec!["agents", "properties"]);

    client.disconnect().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_tables_on_empty_database() {
    let server = start_server("").await;
    let mut client = connected_client(&server).await;

    let result = client.list_tables().await.unwrap();
    assert_eq!(tool_text(&result), "[]");

    client.disconnect().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_select_query_returns_rows_keyed_by_column() {
    let server = start_server(SCHEMA).await;
    let mut client = connected_client(&server).await;

    let result = client
        .execute_query("SELECT * FROM properties ORDER BY id LIMIT 1")
        .await
        .unwrap();
    let rows: Vec<Map<String, Value>> = serde_json::from_str(tool_text(&result)).unwrap();
    assert_eq!(rows.len(), 1);
    let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["id", "address", "price"]);
    assert_eq!(rows[0]["address"], "12 Elm St");

    let result = client
        .execute_query("  select name from agents")
        .await
        .unwrap();
    assert_eq!(
        serde_json::from_str::<Value>(tool_text(&result)).unwrap(),
        json!([{"name": "Dana"}])
    );

    client.disconnect().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_non_select_is_refused_and_nothing_changes() {
    let server = start_server(SCHEMA).await;
    let mut client = connected_client(&server).await;

    let result = client.execute_query("DELETE FROM properties").await.unwrap();
    assert_eq!(
        tool_text(&result),
        "Error: Only SELECT queries are allowed for security reasons."
    );

    let result = client
        .execute_query("SELECT COUNT(*) AS n FROM properties")
        .await
        .unwrap();
    assert_eq!(
        serde_json::from_str::<Value>(tool_text(&result)).unwrap(),
        json!([{"n": 2}])
    );

    client.disconnect().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_backend_error_is_a_text_result() {
    let server = start_server(SCHEMA).await;
    let mut client = connected_client(&server).await;

    let result = client
        .execute_query("SELECT * FROM no_such_table")
        .await
        .unwrap();
    assert!(tool_text(&result).starts_with("Error executing query:"));

    client.disconnect().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_method_matches_as_error_envelope() {
    let server = start_server(SCHEMA).await;
    let mut client = connected_client(&server).await;

    let response = client
        .call_with_timeout("resources/list", json!({}), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(response.error.unwrap().code, -32601);

    let err = client.call_tool("drop_everything", json!({})).await.unwrap_err();
    assert!(matches!(err, BridgeError::UnknownTool(ref name) if name == "drop_everything"));

    let response = client.call("tools/call", json!({})).await.unwrap();
    assert_eq!(response.error.unwrap().code, -32602);

    client.disconnect().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_calls_are_correlated() {
    let server = start_server(SCHEMA).await;
    let mut client = connected_client(&server).await;

    let (tables, agents) = tokio::join!(
        client.list_tables(),
        client.execute_query("SELECT name FROM agents"),
    );
    assert!(tool_text(&tables.unwrap()).contains("properties"));
    assert!(tool_text(&agents.unwrap()).contains("Dana"));
    assert_eq!(client.pending_len(), 0);

    client.disconnect().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_post_rejections() {
    let server = start_server(SCHEMA).await;
    let http = reqwest::Client::new();
    let url = format!("{}{MESSAGES_PATH}", server.base_url);
    let ping = json!({"jsonrpc": "2.0", "id": 1, "method": "ping"});

    let missing = http.post(&url).json(&ping).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let malformed = http
        .post(&url)
        .query(&[("session_id", "not-a-session")])
        .json(&ping)
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

    let unknown = http
        .post(&url)
        .query(&[("session_id", "0123456789abcdef0123456789abcdef")])
        .json(&ping)
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_disconnect_releases_server_session() {
    let server = start_server(SCHEMA).await;
    let mut client = connected_client(&server).await;
    let session_id = client.session_id().unwrap().to_string();

    client.disconnect().await;

    // The server notices the closed stream asynchronously.
    let mut released = false;
    for _ in 0..50 {
        if server.state.sessions.get_session(&session_id).is_none() {
            released = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(released);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_client_reconnects_with_new_session() {
    let server = start_server(SCHEMA).await;
    let mut client = connected_client(&server).await;
    let first = client.session_id().unwrap().to_string();
    client.disconnect().await;

    client.connect().await.unwrap();
    assert_eq!(client.state(), ConnectionState::Ready);
    assert_ne!(client.session_id().unwrap(), first);
    client.disconnect().await;
}

#[test]
fn test_stdio_loop_answers_each_request_line() {
    let db = NamedTempFile::new().unwrap();
    rusqlite::Connection::open(db.path())
        .unwrap()
        .execute_batch(SCHEMA)
        .unwrap();
    let server = build_server(db.path());

    let input = [
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#,
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"list_tables","arguments":{}}}"#,
    ]
    .join("\n");
    let mut output = Vec::new();
    server.run(Cursor::new(input), &mut output).unwrap();

    let lines: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["result"]["tools"].as_array().unwrap().len(), 2);
    assert_eq!(lines[1]["id"], 2);
    assert!(lines[1]["result"]["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("agents"));
}
