//! # databricks-input
//!
//! Input connector core for Databricks SQL warehouses.
//!
//! This crate prepares a correctly scoped session against the warehouse's
//! three-level namespace (catalog, schema, table) and maps its type system
//! onto a small set of portable types for a generic extraction engine.
//!
//! ## Features
//!
//! - **Session Bootstrap**: `USE CATALOG` / `USE SCHEMA`, or read-only probes of the defaults
//! - **Capability Gate**: refuses raw-query incremental mode before any I/O
//! - **Type Normalization**: built-in, per-type and per-column rules with timestamp formatting
//! - **JSON for Nested Types**: arrays, maps and structs as canonical JSON text
//! - **Authentication**: personal access token or OAuth machine-to-machine
//! - **Secret Masking**: credentials never appear in logs or config dumps
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use databricks_input::prelude::*;
//!
//! let config = DatabricksInputConfig::from_file("databricks.yml")?;
//! let connector = DatabricksInputConnector::new(my_driver_factory);
//!
//! let session = connector.open(&config).await?;
//! let schema = session.describe_table("orders").await?;
//! for column in schema.columns() {
//!     println!("{}: {}", column.name(), column.value_type());
//! }
//! session.close().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod auth;
pub mod capability;
pub mod config;
pub mod connection;
pub mod connector;
pub mod dialect;
pub mod error;
pub mod portable;
pub mod properties;
pub mod secret;
pub mod security;
pub mod session;
pub mod testing;
pub mod typemap;
pub mod types;

/// Prelude module for convenient imports
pub mod prelude {
    // Error types
    pub use crate::error::{Error, ErrorCategory, Result};

    // Value and type system
    pub use crate::types::{ColumnMetadata, Row, Value};

    // Connection traits
    pub use crate::connection::{Connection, ConnectionFactory, StatementScopedConnection};
    pub use crate::properties::{ConnectionProperties, PropertyValue};

    // Dialect
    pub use crate::dialect::{DatabricksDialect, NamespaceStrategy, SqlDialect};

    // Configuration and auth
    pub use crate::auth::{AuthStrategy, AuthType};
    pub use crate::config::{ColumnOptionConfig, DatabricksInputConfig, UserAgentConfig};
    pub use crate::secret::SensitiveString;

    // Session, gate and type normalization
    pub use crate::capability::{
        CapabilityGate, RejectionReason, ReplicationMode, ReplicationRequest,
    };
    pub use crate::portable::{PortableColumn, PortableSchema, PortableValue};
    pub use crate::session::{
        NamespaceContext, NamespaceKind, NamespaceLevel, ResolvedNamespace, SessionBootstrapper,
    };
    pub use crate::typemap::{
        ColumnRule, PortableType, ResolvedRule, RuleLayer, SourceTypeFamily, TypeNormalizer,
        TypeRules,
    };

    // Facade
    pub use crate::connector::{
        build_connection_properties, DatabricksInputConnector, SessionHandle,
    };
}

// Re-export commonly used items at crate root
pub use error::{Error, Result};
pub use secret::SensitiveString;
pub use types::Value;
