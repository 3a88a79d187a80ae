//! Testing utilities
//!
//! In-memory stand-ins for the driver that record every statement and
//! emulate the warehouse's session namespace.
//!
//! # Example
//!
//! ```rust,ignore
//! use databricks_input::prelude::*;
//! use databricks_input::testing::*;
//!
//! #[tokio::test]
//! async fn test_open() {
//!     let conn = MockConnection::new().with_current_catalog("main");
//!     let connector = DatabricksInputConnector::new(MockConnectionFactory::new(conn.clone()));
//!
//!     let config = DatabricksInputConfig::new("h", "/p", "token").with_table("t");
//!     let session = connector.open(&config).await.unwrap();
//!
//!     assert_eq!(conn.statements(), vec!["SELECT CURRENT_CATALOG()", "SELECT CURRENT_SCHEMA()"]);
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::connection::{Connection, ConnectionFactory};
use crate::error::{Error, Result};
use crate::properties::ConnectionProperties;
use crate::types::{ColumnMetadata, Row, Value};

// ============================================================================
// Mock Connection
// ============================================================================

/// Reverse backtick quoting of a single identifier
fn unquote(quoted: &str) -> String {
    let inner = quoted
        .trim()
        .strip_prefix('`')
        .and_then(|s| s.strip_suffix('`'))
        .unwrap_or(quoted);
    inner.replace("``", "`")
}

/// A mock connection for testing.
///
/// Clones share state, so a test can keep a clone while the connector owns
/// another.
#[derive(Debug, Clone)]
pub struct MockConnection {
    statements: Arc<Mutex<Vec<String>>>,
    described: Arc<Mutex<Vec<String>>>,
    current_catalog: Arc<Mutex<Option<String>>>,
    current_schema: Arc<Mutex<Option<String>>>,
    columns: Arc<Mutex<Vec<ColumnMetadata>>>,
    rows: Arc<Mutex<Vec<Row>>>,
    failures: Arc<Mutex<Vec<(String, String)>>>,
    auto_commit_calls: Arc<Mutex<Vec<bool>>>,
    commits: Arc<Mutex<usize>>,
    closes: Arc<Mutex<usize>>,
}

impl Default for MockConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConnection {
    /// Create a new mock connection with no current catalog or schema
    pub fn new() -> Self {
        Self {
            statements: Arc::new(Mutex::new(Vec::new())),
            described: Arc::new(Mutex::new(Vec::new())),
            current_catalog: Arc::new(Mutex::new(None)),
            current_schema: Arc::new(Mutex::new(None)),
            columns: Arc::new(Mutex::new(Vec::new())),
            rows: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(Vec::new())),
            auto_commit_calls: Arc::new(Mutex::new(Vec::new())),
            commits: Arc::new(Mutex::new(0)),
            closes: Arc::new(Mutex::new(0)),
        }
    }

    /// Set the engine's default catalog
    pub fn with_current_catalog(self, catalog: impl Into<String>) -> Self {
        *self.current_catalog.lock() = Some(catalog.into());
        self
    }

    /// Set the engine's default schema
    pub fn with_current_schema(self, schema: impl Into<String>) -> Self {
        *self.current_schema.lock() = Some(schema.into());
        self
    }

    /// Columns returned by `describe`
    pub fn with_columns(self, columns: Vec<ColumnMetadata>) -> Self {
        *self.columns.lock() = columns;
        self
    }

    /// Rows returned by any other query
    pub fn with_rows(self, rows: Vec<Row>) -> Self {
        *self.rows.lock() = rows;
        self
    }

    /// Fail every statement starting with `prefix`
    pub fn fail_with(self, prefix: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.lock().push((prefix.into(), message.into()));
        self
    }

    /// Statements run through `query` or `execute`, in order
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().clone()
    }

    /// Statements passed to `describe`, in order
    pub fn described(&self) -> Vec<String> {
        self.described.lock().clone()
    }

    /// Catalog currently selected in the emulated session
    pub fn current_catalog(&self) -> Option<String> {
        self.current_catalog.lock().clone()
    }

    /// Schema currently selected in the emulated session
    pub fn current_schema(&self) -> Option<String> {
        self.current_schema.lock().clone()
    }

    /// Values passed to `set_auto_commit` that reached this connection
    pub fn auto_commit_calls(&self) -> Vec<bool> {
        self.auto_commit_calls.lock().clone()
    }

    /// Number of `commit` calls that reached this connection
    pub fn commit_count(&self) -> usize {
        *self.commits.lock()
    }

    /// Number of `close` calls
    pub fn close_count(&self) -> usize {
        *self.closes.lock()
    }

    fn record(&self, sql: &str) -> Result<()> {
        self.statements.lock().push(sql.to_string());
        let failure = self
            .failures
            .lock()
            .iter()
            .find(|(prefix, _)| sql.starts_with(prefix.as_str()))
            .map(|(_, message)| message.clone());
        match failure {
            Some(message) => Err(Error::query_with_sql(message, sql)),
            None => Ok(()),
        }
    }

    fn scalar(column: &str, value: Option<String>) -> Row {
        Row::new(vec![column.to_string()], vec![Value::from(value)])
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn query(&self, sql: &str, _params: &[Value]) -> Result<Vec<Row>> {
        self.record(sql)?;
        let row = match sql {
            "SELECT CURRENT_CATALOG()" => Self::scalar("current_catalog()", self.current_catalog()),
            "SELECT CURRENT_SCHEMA()" => Self::scalar("current_schema()", self.current_schema()),
            _ => return Ok(self.rows.lock().clone()),
        };
        Ok(vec![row])
    }

    async fn execute(&self, sql: &str, _params: &[Value]) -> Result<u64> {
        self.record(sql)?;
        if let Some(name) = sql.strip_prefix("USE CATALOG ") {
            *self.current_catalog.lock() = Some(unquote(name));
        } else if let Some(name) = sql.strip_prefix("USE SCHEMA ") {
            *self.current_schema.lock() = Some(unquote(name));
        }
        Ok(0)
    }

    async fn describe(&self, sql: &str) -> Result<Vec<ColumnMetadata>> {
        self.described.lock().push(sql.to_string());
        Ok(self.columns.lock().clone())
    }

    async fn set_auto_commit(&self, enabled: bool) -> Result<()> {
        self.auto_commit_calls.lock().push(enabled);
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        *self.commits.lock() += 1;
        Ok(())
    }

    async fn is_valid(&self) -> bool {
        *self.closes.lock() == 0
    }

    async fn close(&self) -> Result<()> {
        *self.closes.lock() += 1;
        Ok(())
    }
}

// ============================================================================
// Mock Connection Factory
// ============================================================================

/// A mock factory handing out clones of one [`MockConnection`]
#[derive(Debug, Clone)]
pub struct MockConnectionFactory {
    connection: MockConnection,
    connects: Arc<Mutex<Vec<ConnectionProperties>>>,
    fail_message: Arc<Mutex<Option<String>>>,
}

impl MockConnectionFactory {
    /// Factory returning `connection`
    pub fn new(connection: MockConnection) -> Self {
        Self {
            connection,
            connects: Arc::new(Mutex::new(Vec::new())),
            fail_message: Arc::new(Mutex::new(None)),
        }
    }

    /// Make every connect attempt fail
    pub fn fail_with(self, message: impl Into<String>) -> Self {
        *self.fail_message.lock() = Some(message.into());
        self
    }

    /// Properties of every connect attempt
    pub fn connects(&self) -> Vec<ConnectionProperties> {
        self.connects.lock().clone()
    }

    /// Number of connect attempts
    pub fn connect_count(&self) -> usize {
        self.connects.lock().len()
    }
}

#[async_trait]
impl ConnectionFactory for MockConnectionFactory {
    async fn connect(&self, properties: &ConnectionProperties) -> Result<Box<dyn Connection>> {
        self.connects.lock().push(properties.clone());
        if let Some(message) = self.fail_message.lock().clone() {
            return Err(Error::connection(message));
        }
        Ok(Box::new(self.connection.clone()))
    }
}
