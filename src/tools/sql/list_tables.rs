//! List tables tool

use std::sync::Arc;

use serde_json::{json, Value};

use crate::database::SqliteDatabase;
use crate::error::McpResult;
use crate::protocol::{McpTool, Tool};
use crate::server::text_response;

use super::backend_cause;

/// Tool listing every table of the database as a JSON array of names
pub struct ListTablesTool {
    db: Arc<SqliteDatabase>,
}

impl ListTablesTool {
    pub fn new(db: Arc<SqliteDatabase>) -> Self {
        Self { db }
    }
}

impl Tool for ListTablesTool {
    fn definition(&self) -> McpTool {
        McpTool {
            name: "list_tables".to_string(),
            description: "Lists all tables in the SQLite database. Returns a JSON string of the table names.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        }
    }

    fn execute(&self, _params: Value) -> McpResult<Value> {
        let text = match self.db.list_tables() {
            Ok(tables) => serde_json::to_string(&tables)?,
            Err(e) => format!("Error listing tables: {}", backend_cause(&e)),
        };
        Ok(text_response(text))
    }
}
