//! Connector facade
//!
//! [`DatabricksInputConnector::open`] turns a configuration into a ready
//! [`SessionHandle`]:
//!
//! 1. capability gate and configuration checks, before any I/O
//! 2. driver property assembly, logged with secrets masked
//! 3. connect through the [`ConnectionFactory`]
//! 4. wrap so every statement is its own unit of work
//! 5. namespace bootstrap; the connection is closed if it fails

use tracing::{info, warn};

use crate::capability::{CapabilityGate, ReplicationRequest};
use crate::config::DatabricksInputConfig;
use crate::connection::{Connection, ConnectionFactory, StatementScopedConnection};
use crate::dialect::{DatabricksDialect, NamespaceStrategy, SqlDialect};
use crate::error::Result;
use crate::portable::PortableSchema;
use crate::properties::ConnectionProperties;
use crate::session::{ResolvedNamespace, SessionBootstrapper};
use crate::typemap::{ResolvedRule, TypeNormalizer};
use crate::types::ColumnMetadata;

/// Assemble driver properties from configuration.
///
/// Order matters: pass-through `options` may replace any computed property,
/// except `UserAgentEntry`, which is set last. Keys match case-insensitively.
pub fn build_connection_properties(config: &DatabricksInputConfig) -> Result<ConnectionProperties> {
    let mut props = ConnectionProperties::new(config.server_hostname.as_str());
    if let Some(path) = &config.driver_path {
        props = props.with_driver_path(path.as_str());
    }

    props.set("httpPath", config.http_path.as_str());
    config.auth()?.apply(&mut props);
    props.set("SSL", "1");

    if let Some(catalog) = &config.catalog_name {
        props.set("ConnCatalog", catalog.as_str());
    }
    if let Some(schema) = &config.schema_name {
        props.set("ConnSchema", schema.as_str());
    }

    for (key, value) in config.option_entries() {
        props.set(key, value);
    }

    props.set("UserAgentEntry", config.user_agent.entry());
    Ok(props)
}

/// Opens bootstrapped sessions against a Databricks SQL warehouse
pub struct DatabricksInputConnector<F: ConnectionFactory> {
    factory: F,
    dialect: DatabricksDialect,
}

impl<F: ConnectionFactory> DatabricksInputConnector<F> {
    /// Connector using `factory` for driver connections
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            dialect: DatabricksDialect,
        }
    }

    /// Underlying connection factory
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Open a session for `config`.
    ///
    /// Rejected replication modes and invalid configuration fail before a
    /// connection is opened.
    pub async fn open(&self, config: &DatabricksInputConfig) -> Result<SessionHandle> {
        let request = config.replication_request();
        CapabilityGate::new().validate(&request)?;
        config.validate_all()?;

        let normalizer = TypeNormalizer::new(config.type_rules()?);
        let props = build_connection_properties(config)?;
        info!(properties = %props, "Connecting to Databricks SQL warehouse");

        let conn = StatementScopedConnection::new(self.factory.connect(&props).await?);

        let namespace = config.namespace();
        let resolved = match SessionBootstrapper::new(&self.dialect)
            .bootstrap(&conn, &namespace)
            .await
        {
            Ok(resolved) => resolved,
            Err(e) => {
                if let Err(close_err) = conn.close().await {
                    warn!(error = %close_err, "Failed to close connection after bootstrap error");
                }
                return Err(e);
            }
        };

        Ok(SessionHandle {
            connection: conn,
            namespace: resolved,
            normalizer,
            request,
            dialect: self.dialect,
        })
    }
}

/// Open, bootstrapped connection plus everything needed to build the
/// portable schema. The caller must [`close`](SessionHandle::close) it.
pub struct SessionHandle {
    connection: StatementScopedConnection,
    namespace: ResolvedNamespace,
    normalizer: TypeNormalizer,
    request: ReplicationRequest,
    dialect: DatabricksDialect,
}

impl SessionHandle {
    /// The session connection
    pub fn connection(&self) -> &dyn Connection {
        &self.connection
    }

    /// Effective catalog and schema
    pub fn namespace(&self) -> &ResolvedNamespace {
        &self.namespace
    }

    /// Replication settings that passed the capability gate
    pub fn request(&self) -> &ReplicationRequest {
        &self.request
    }

    /// How the namespace is scoped; never a per-query search path here
    pub fn namespace_strategy(&self) -> NamespaceStrategy {
        self.dialect.namespace_strategy()
    }

    /// Column rule resolver
    pub fn normalizer(&self) -> &TypeNormalizer {
        &self.normalizer
    }

    /// Resolve one discovered column
    pub fn resolve(&self, source_type: &str, column: &str) -> Result<ResolvedRule> {
        self.normalizer.resolve(source_type, column)
    }

    /// Portable schema for discovered columns
    pub fn build_schema(&self, columns: &[ColumnMetadata]) -> Result<PortableSchema> {
        PortableSchema::build(&self.normalizer, columns)
    }

    /// Discover and resolve the columns of a query
    pub async fn describe_query(&self, sql: &str) -> Result<PortableSchema> {
        let columns = self.connection.describe(sql).await?;
        self.build_schema(&columns)
    }

    /// Discover and resolve the columns of a table in the session namespace
    pub async fn describe_table(&self, table: &str) -> Result<PortableSchema> {
        let sql = format!(
            "SELECT * FROM {}",
            self.dialect.qualified_table_name(None, None, table)
        );
        self.describe_query(&sql).await
    }

    /// Close the session connection
    pub async fn close(self) -> Result<()> {
        self.connection.close().await
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("namespace", &self.namespace)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}
