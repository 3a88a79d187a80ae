//! Session namespace bootstrap
//!
//! Selects catalog and schema on a fresh connection before any schema
//! discovery or data query runs. Unset levels are probed read-only and only
//! logged; the engine's pre-existing default stays in effect.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::connection::Connection;
use crate::dialect::SqlDialect;
use crate::error::{Error, Result};
use crate::types::Value;

/// Level of the three-level namespace a statement addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamespaceKind {
    /// Catalog level
    Catalog,
    /// Schema level, resolved within the current catalog
    Schema,
}

impl fmt::Display for NamespaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Catalog => write!(f, "catalog"),
            Self::Schema => write!(f, "schema"),
        }
    }
}

/// Requested catalog and schema for a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceContext {
    /// Catalog to select, or `None` to keep the engine default
    pub catalog: Option<String>,
    /// Schema to select, or `None` to keep the engine default
    pub schema: Option<String>,
}

impl NamespaceContext {
    /// Empty context: keep the engine defaults for both levels
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a catalog
    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Select a schema
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

/// How one namespace level ended up after bootstrap
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceLevel {
    /// Explicitly selected with a `USE` statement
    Selected(String),
    /// Left at the engine default; holds the probed value, if any
    Inherited(Option<String>),
}

impl NamespaceLevel {
    /// Effective name for this level, when known
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Selected(name) => Some(name),
            Self::Inherited(probed) => probed.as_deref(),
        }
    }

    /// Whether a `USE` statement was issued for this level
    pub fn is_selected(&self) -> bool {
        matches!(self, Self::Selected(_))
    }
}

/// Effective namespace of a bootstrapped connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNamespace {
    /// Catalog level
    pub catalog: NamespaceLevel,
    /// Schema level
    pub schema: NamespaceLevel,
}

/// Applies a [`NamespaceContext`] to an open connection
pub struct SessionBootstrapper<'a> {
    dialect: &'a dyn SqlDialect,
}

impl<'a> SessionBootstrapper<'a> {
    /// Bootstrapper issuing statements in `dialect`
    pub fn new(dialect: &'a dyn SqlDialect) -> Self {
        Self { dialect }
    }

    /// Establish the namespace on `conn`.
    ///
    /// Catalog is handled before schema since schema names resolve within
    /// the current catalog. Running it again on the same connection issues
    /// the same statements and yields the same result. Nothing is retried.
    pub async fn bootstrap(
        &self,
        conn: &dyn Connection,
        namespace: &NamespaceContext,
    ) -> Result<ResolvedNamespace> {
        let catalog = self
            .resolve_level(conn, NamespaceKind::Catalog, namespace.catalog.as_deref())
            .await?;
        let schema = self
            .resolve_level(conn, NamespaceKind::Schema, namespace.schema.as_deref())
            .await?;

        Ok(ResolvedNamespace { catalog, schema })
    }

    async fn resolve_level(
        &self,
        conn: &dyn Connection,
        kind: NamespaceKind,
        requested: Option<&str>,
    ) -> Result<NamespaceLevel> {
        match requested {
            Some(name) => {
                let sql = match kind {
                    NamespaceKind::Catalog => self.dialect.use_catalog_sql(name)?,
                    NamespaceKind::Schema => self.dialect.use_schema_sql(name)?,
                };
                info!(sql = %sql, "Selecting {}", kind);
                conn.execute(&sql, &[])
                    .await
                    .map_err(|e| Error::Namespace {
                        kind,
                        name: name.to_string(),
                        source: Box::new(e),
                    })?;
                Ok(NamespaceLevel::Selected(name.to_string()))
            }
            None => {
                let sql = match kind {
                    NamespaceKind::Catalog => self.dialect.current_catalog_sql(),
                    NamespaceKind::Schema => self.dialect.current_schema_sql(),
                };
                info!(sql = %sql, "Probing current {}", kind);
                let row = conn.query_one(sql, &[]).await.map_err(|e| {
                    Error::connection_with_source(format!("failed to probe current {}", kind), e)
                })?;
                let current = row.and_then(|r| match r.get(0) {
                    Some(Value::String(s)) => Some(s.clone()),
                    _ => None,
                });
                debug!(
                    current = current.as_deref().unwrap_or("<none>"),
                    "Keeping engine default {}",
                    kind
                );
                Ok(NamespaceLevel::Inherited(current))
            }
        }
    }
}
