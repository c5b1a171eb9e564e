//! End-to-end smoke checks against a running SQLite MCP server.
//!
//! Reads `MCP_BASE_URL` (default `http://localhost:8000`), runs each check
//! on its own connection and exits non-zero if any failed.

use std::process::ExitCode;

use anyhow::{anyhow, bail, ensure, Context, Result};
use reqwest::header::ACCEPT;
use serde_json::{Map, Value};
use sqlite_mcp_bridge::client::{ClientConfig, McpClient, SseDecoder};
use sqlite_mcp_bridge::constants::SSE_PATH;
use sqlite_mcp_bridge::protocol::ToolCallResult;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("--- Running MCP Server Tests ---");

    println!("\n--- Test 1: SSE Connection ---");
    if let Err(e) = check_sse_connection(&config).await {
        println!("FAILURE: Could not connect to SSE endpoint at {}{SSE_PATH}.", config.base_url);
        println!("Error: {e:#}");
        println!("Is the server running?");
        return ExitCode::FAILURE;
    }
    println!("SUCCESS: Connected to SSE endpoint.");

    let mut failures = 0;

    println!("\n--- Test 2: List Tables ---");
    failures += report(with_client(&config, Check::ListTables).await);

    println!("\n--- Test 3: Execute SELECT Query ---");
    failures += report(with_client(&config, Check::SelectQuery).await);

    println!("\n--- Test 4: Execute Non-SELECT Query ---");
    failures += report(with_client(&config, Check::NonSelectQuery).await);

    println!("\n--- All Tests Completed ---");
    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn report(outcome: Result<String>) -> usize {
    match outcome {
        Ok(message) => {
            println!("SUCCESS: {message}");
            0
        }
        Err(e) => {
            println!("FAILURE: Test failed. Error: {e:#}");
            1
        }
    }
}

/// Open the stream and read up to the endpoint event, without a session
async fn check_sse_connection(config: &ClientConfig) -> Result<()> {
    let url = config.base()?.join(SSE_PATH)?;
    let mut response = reqwest::Client::new()
        .get(url)
        .header(ACCEPT, "text/event-stream")
        .send()
        .await?
        .error_for_status()?;

    let mut decoder = SseDecoder::new();
    let read = async {
        while let Some(chunk) = response.chunk().await? {
            if decoder.feed(&chunk).iter().any(|f| f.event == "endpoint") {
                return Ok::<(), anyhow::Error>(());
            }
        }
        bail!("stream ended before the endpoint event")
    };
    tokio::time::timeout(config.handshake_timeout, read)
        .await
        .map_err(|_| anyhow!("no endpoint event within {:?}", config.handshake_timeout))?
}

#[derive(Debug, Clone, Copy)]
enum Check {
    ListTables,
    SelectQuery,
    NonSelectQuery,
}

/// Connect, run `check`, and disconnect whatever happened
async fn with_client(config: &ClientConfig, check: Check) -> Result<String> {
    let mut client = McpClient::new(config.clone())?;
    let outcome = match client.connect().await {
        Ok(()) => match check {
            Check::ListTables => check_list_tables(&client).await,
            Check::SelectQuery => check_select_query(&client).await,
            Check::NonSelectQuery => check_non_select_query(&client).await,
        },
        Err(e) => Err(e.into()),
    };
    client.disconnect().await;
    outcome
}

fn text_of(result: &ToolCallResult) -> Result<&str> {
    result.first_text().context("tool result has no content")
}

fn table_names(result: &ToolCallResult) -> Result<Vec<String>> {
    let text = text_of(result)?;
    serde_json::from_str(text).with_context(|| format!("not a JSON list of tables: {text}"))
}

async fn check_list_tables(client: &McpClient) -> Result<String> {
    let result = client.list_tables().await?;
    let tables = table_names(&result)?;
    ensure!(!tables.is_empty(), "database has no tables");
    Ok(format!("Result is a list with {} table(s): {tables:?}", tables.len()))
}

async fn check_select_query(client: &McpClient) -> Result<String> {
    let tables = table_names(&client.list_tables().await?)?;
    let table = tables.first().context("database has no tables to query")?;
    println!("Found table to query: {table}");

    let result = client
        .execute_query(&format!("SELECT * FROM {table} LIMIT 1"))
        .await?;
    let text = text_of(&result)?;
    let rows: Vec<Map<String, Value>> =
        serde_json::from_str(text).with_context(|| format!("not a JSON list of rows: {text}"))?;
    ensure!(rows.len() <= 1, "LIMIT 1 returned {} rows", rows.len());
    Ok("Query executed and result format is correct.".to_string())
}

async fn check_non_select_query(client: &McpClient) -> Result<String> {
    let result = client.execute_query("DELETE FROM some_table").await?;
    let text = text_of(&result)?;
    ensure!(
        text.contains("Only SELECT queries are allowed"),
        "server did not refuse the statement: {text}"
    );
    Ok("Server correctly rejected non-SELECT query.".to_string())
}
