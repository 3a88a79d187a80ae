//! SQL dialect for the Databricks SQL warehouse
//!
//! - SqlDialect: statement text for namespace selection and probing
//! - Capability flags the connector consults instead of overriding hooks
//! - Three-level `catalog.schema.table` naming

use crate::security::{quote_identifier, quote_validated};

/// How a backend scopes unqualified table names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamespaceStrategy {
    /// Namespace is session state set by `USE` statements; there is no
    /// per-query search path to derive.
    SessionStatements,
    /// Namespace is applied as a per-query search path
    SearchPath,
}

impl NamespaceStrategy {
    /// Whether a per-query search path must be derived
    pub const fn uses_search_path(self) -> bool {
        matches!(self, Self::SearchPath)
    }
}

/// SQL dialect for vendor-specific statement text
pub trait SqlDialect: Send + Sync {
    /// Quote an identifier (catalog, schema, table, column name)
    fn quote_identifier(&self, name: &str) -> String;

    /// How unqualified names are scoped
    fn namespace_strategy(&self) -> NamespaceStrategy;

    /// Statement selecting the session catalog
    fn use_catalog_sql(&self, catalog: &str) -> crate::Result<String>;

    /// Statement selecting the session schema
    fn use_schema_sql(&self, schema: &str) -> crate::Result<String>;

    /// Read-only probe for the session catalog
    fn current_catalog_sql(&self) -> &'static str;

    /// Read-only probe for the session schema
    fn current_schema_sql(&self) -> &'static str;

    /// Fully qualified table name
    fn qualified_table_name(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: &str,
    ) -> String {
        [catalog, schema, Some(table)]
            .into_iter()
            .flatten()
            .map(|part| self.quote_identifier(part))
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Databricks SQL dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabricksDialect;

impl SqlDialect for DatabricksDialect {
    fn quote_identifier(&self, name: &str) -> String {
        quote_identifier(name)
    }

    fn namespace_strategy(&self) -> NamespaceStrategy {
        NamespaceStrategy::SessionStatements
    }

    fn use_catalog_sql(&self, catalog: &str) -> crate::Result<String> {
        Ok(format!("USE CATALOG {}", quote_validated(catalog)?))
    }

    fn use_schema_sql(&self, schema: &str) -> crate::Result<String> {
        Ok(format!("USE SCHEMA {}", quote_validated(schema)?))
    }

    fn current_catalog_sql(&self) -> &'static str {
        "SELECT CURRENT_CATALOG()"
    }

    fn current_schema_sql(&self) -> &'static str {
        "SELECT CURRENT_SCHEMA()"
    }
}
