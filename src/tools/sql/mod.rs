//! SQL tools over the SQLite backend
//!
//! Backend failures never escape as protocol errors: both tools render them
//! into the result text.

mod execute_query;
mod list_tables;

pub use execute_query::ExecuteQueryTool;
pub use list_tables::ListTablesTool;

use crate::error::BridgeError;

/// The message of the underlying failure, without our error-kind prefix
fn backend_cause(err: &BridgeError) -> String {
    match err {
        BridgeError::Database(e) => e.to_string(),
        other => other.to_string(),
    }
}
