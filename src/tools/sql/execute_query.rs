//! Execute query tool

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use crate::database::{is_select_query, SqliteDatabase, READ_ONLY_REJECTION};
use crate::error::McpResult;
use crate::protocol::{McpTool, Tool};
use crate::server::{error_response, text_response};

use super::backend_cause;

/// Tool running a read-only SELECT and returning the rows as JSON
pub struct ExecuteQueryTool {
    db: Arc<SqliteDatabase>,
}

impl ExecuteQueryTool {
    pub fn new(db: Arc<SqliteDatabase>) -> Self {
        Self { db }
    }
}

impl Tool for ExecuteQueryTool {
    fn definition(&self) -> McpTool {
        McpTool {
            name: "execute_query".to_string(),
            description: "Executes a read-only SQL query on the database. Only SELECT statements are allowed. Returns a JSON string of the query result.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The SQL SELECT statement to execute"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    fn execute(&self, params: Value) -> McpResult<Value> {
        let Some(query) = params.get("query").and_then(|v| v.as_str()) else {
            return Ok(error_response("Missing required argument 'query'".to_string()));
        };

        if !is_select_query(query) {
            info!("rejected non-SELECT statement");
            return Ok(text_response(READ_ONLY_REJECTION.to_string()));
        }

        let text = match self.db.execute_query(query) {
            Ok(rows) => serde_json::to_string(&rows)?,
            Err(e) => format!("Error executing query: {}", backend_cause(&e)),
        };
        Ok(text_response(text))
    }
}
