//! MCP Tools implementation
//!
//! Two read-only SQL tools:
//! - `list_tables`: table names as a JSON array
//! - `execute_query`: SELECT results as a JSON array of row objects

pub mod sql;

use std::sync::Arc;

use crate::database::SqliteDatabase;
use crate::protocol::Tool;
use crate::server::McpServer;

pub use sql::{ExecuteQueryTool, ListTablesTool};

/// Every tool bound to `db`
pub fn get_all_tools(db: Arc<SqliteDatabase>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListTablesTool::new(db.clone())),
        Arc::new(ExecuteQueryTool::new(db)),
    ]
}

/// Register all tools with the MCP server
pub fn register_all_tools(server: &mut McpServer, db: Arc<SqliteDatabase>) {
    for tool in get_all_tools(db) {
        server.register_tool(tool);
    }
}
