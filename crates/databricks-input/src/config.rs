//! Connector configuration
//!
//! Loaded from YAML with `${VAR}` / `${VAR:-default}` environment expansion,
//! validated structurally with `validator` and semantically by
//! [`DatabricksInputConfig::validate_all`].
//!
//! ```yaml
//! server_hostname: dbc-1234.cloud.databricks.com
//! http_path: /sql/1.0/warehouses/abc
//! personal_access_token: ${DATABRICKS_TOKEN}
//! catalog_name: main
//! schema_name: sales
//! table: orders
//! column_options:
//!   created_at: { type: string, timestamp_format: "%Y/%m/%d %H:%M:%S", timezone: Asia/Tokyo }
//! default_column_options:
//!   VARCHAR: { type: json }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::{AuthStrategy, AuthType};
use crate::capability::{ReplicationMode, ReplicationRequest};
use crate::error::{Error, Result};
use crate::secret::SensitiveString;
use crate::security::validate_identifier;
use crate::session::NamespaceContext;
use crate::typemap::{parse_timezone, validate_timestamp_format, ColumnRule, PortableType, TypeRules};

/// Pre-compiled regex for environment variable expansion
/// Pattern: ${VAR} or ${VAR:-default}
static ENV_VAR_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("env var regex pattern is invalid - this is a bug")
});

/// Expand environment variables in the format ${VAR} or ${VAR:-default}
pub fn expand_env_vars(content: &str) -> String {
    ENV_VAR_REGEX
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default = caps.get(2).map(|m| m.as_str());

            std::env::var(var_name).unwrap_or_else(|_| default.unwrap_or("").to_string())
        })
        .to_string()
}

/// Identity reported to the warehouse as `UserAgentEntry`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Validate, JsonSchema)]
pub struct UserAgentConfig {
    /// Product name
    #[serde(default = "default_product_name")]
    #[validate(length(min = 1, max = 128))]
    pub product_name: String,

    /// Product version
    #[serde(default = "default_product_version")]
    #[validate(length(min = 1, max = 64))]
    pub product_version: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            product_name: default_product_name(),
            product_version: default_product_version(),
        }
    }
}

impl UserAgentConfig {
    /// `product_name/product_version`
    pub fn entry(&self) -> String {
        format!("{}/{}", self.product_name, self.product_version)
    }
}

fn default_product_name() -> String {
    "unknown".to_string()
}

fn default_product_version() -> String {
    "0.0.0".to_string()
}

fn default_auth_type() -> String {
    AuthType::default().as_str().to_string()
}

/// Output type and timestamp formatting for a column or a source type
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct ColumnOptionConfig {
    /// Portable output type: long, double, boolean, string, timestamp or json
    #[serde(default, rename = "type")]
    pub value_type: Option<String>,

    /// strftime pattern used when rendering timestamps
    #[serde(default)]
    pub timestamp_format: Option<String>,

    /// IANA timezone used when rendering timestamps
    #[serde(default)]
    pub timezone: Option<String>,
}

impl ColumnOptionConfig {
    /// Convert into a [`ColumnRule`]; errors name `path`
    pub fn to_rule(&self, path: &str) -> Result<ColumnRule> {
        let value_type = self
            .value_type
            .as_deref()
            .map(|t| {
                t.parse::<PortableType>()
                    .map_err(|e| e.for_option(format!("{}.type", path)))
            })
            .transpose()?;

        if let Some(format) = &self.timestamp_format {
            validate_timestamp_format(format)
                .map_err(|e| e.for_option(format!("{}.timestamp_format", path)))?;
        }

        let timezone = self
            .timezone
            .as_deref()
            .map(|tz| {
                parse_timezone(tz).map_err(|e| e.for_option(format!("{}.timezone", path)))
            })
            .transpose()?;

        Ok(ColumnRule {
            value_type,
            timestamp_format: self.timestamp_format.clone(),
            timezone,
        })
    }
}

/// Databricks input configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate, JsonSchema)]
pub struct DatabricksInputConfig {
    /// Workspace host name, e.g. `dbc-1234.cloud.databricks.com`
    #[validate(length(min = 1, max = 512))]
    pub server_hostname: String,

    /// HTTP path of the SQL warehouse, e.g. `/sql/1.0/warehouses/abc`
    #[validate(length(min = 1, max = 1024))]
    pub http_path: String,

    /// `pat` (default) or `oauth-m2m`
    #[serde(default = "default_auth_type")]
    pub auth_type: String,

    /// Personal access token (auth_type `pat`)
    #[serde(default)]
    pub personal_access_token: Option<SensitiveString>,

    /// Service principal id (auth_type `oauth-m2m`)
    #[serde(default)]
    pub oauth2_client_id: Option<String>,

    /// Service principal secret (auth_type `oauth-m2m`)
    #[serde(default)]
    pub oauth2_client_secret: Option<SensitiveString>,

    /// Catalog to select; engine default when unset
    #[serde(default)]
    pub catalog_name: Option<String>,

    /// Schema to select; engine default when unset
    #[serde(default)]
    pub schema_name: Option<String>,

    /// Location of a non-bundled driver
    #[serde(default)]
    pub driver_path: Option<String>,

    /// Identity reported to the warehouse
    #[serde(default)]
    #[validate(nested)]
    pub user_agent: UserAgentConfig,

    /// Pass-through driver properties
    #[serde(default)]
    pub options: BTreeMap<String, serde_json::Value>,

    /// Table to extract
    #[serde(default)]
    pub table: Option<String>,

    /// Query to extract
    #[serde(default)]
    pub query: Option<String>,

    /// Incremental extraction
    #[serde(default)]
    pub incremental: bool,

    /// Incremental boundary columns
    #[serde(default)]
    pub incremental_columns: Vec<String>,

    /// Last-seen values of the incremental columns
    #[serde(default)]
    pub last_record: Option<Vec<String>>,

    /// Raw query with incremental placeholders (not supported by this engine)
    #[serde(default)]
    pub use_raw_query_with_incremental: bool,

    /// Per-column rules, keyed by column name
    #[serde(default)]
    pub column_options: BTreeMap<String, ColumnOptionConfig>,

    /// Per-type rules, keyed by driver type name (`BIGINT`, `REAL`, `VARCHAR`, ...)
    #[serde(default)]
    pub default_column_options: BTreeMap<String, ColumnOptionConfig>,
}

impl DatabricksInputConfig {
    /// Minimal configuration with a personal access token
    pub fn new(
        server_hostname: impl Into<String>,
        http_path: impl Into<String>,
        personal_access_token: impl Into<String>,
    ) -> Self {
        Self {
            server_hostname: server_hostname.into(),
            http_path: http_path.into(),
            auth_type: default_auth_type(),
            personal_access_token: Some(SensitiveString::new(personal_access_token)),
            oauth2_client_id: None,
            oauth2_client_secret: None,
            catalog_name: None,
            schema_name: None,
            driver_path: None,
            user_agent: UserAgentConfig::default(),
            options: BTreeMap::new(),
            table: None,
            query: None,
            incremental: false,
            incremental_columns: Vec::new(),
            last_record: None,
            use_raw_query_with_incremental: false,
            column_options: BTreeMap::new(),
            default_column_options: BTreeMap::new(),
        }
    }

    /// Set the catalog
    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog_name = Some(catalog.into());
        self
    }

    /// Set the schema
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema_name = Some(schema.into());
        self
    }

    /// Extract a table
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Extract a query
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Add a pass-through driver property
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options
            .insert(key.into(), serde_json::Value::String(value.into()));
        self
    }

    /// Parse YAML, expanding environment variables, and validate
    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content);
        let config: Self = serde_yaml::from_str(&expanded)
            .map_err(|e| Error::config(format!("failed to parse config: {}", e)))?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Structural and semantic validation, before any I/O
    pub fn validate_all(&self) -> Result<()> {
        self.validate()
            .map_err(|e| Error::config(format!("invalid configuration: {}", e)))?;

        match (&self.table, &self.query) {
            (Some(_), Some(_)) => {
                return Err(Error::config(
                    "'table' and 'query' are mutually exclusive",
                ))
            }
            (None, None) => return Err(Error::config("either 'table' or 'query' is required")),
            _ => {}
        }

        if let Some(catalog) = &self.catalog_name {
            validate_identifier(catalog).map_err(|e| e.for_option("catalog_name"))?;
        }
        if let Some(schema) = &self.schema_name {
            validate_identifier(schema).map_err(|e| e.for_option("schema_name"))?;
        }

        self.auth()?;
        self.type_rules()?;
        Ok(())
    }

    /// Parsed `auth_type`
    pub fn auth_type(&self) -> Result<AuthType> {
        self.auth_type.parse()
    }

    /// Credentials for the selected `auth_type`
    pub fn auth(&self) -> Result<AuthStrategy> {
        AuthStrategy::from_parts(
            self.auth_type()?,
            self.personal_access_token.as_ref(),
            self.oauth2_client_id.as_deref(),
            self.oauth2_client_secret.as_ref(),
        )
    }

    /// Requested catalog and schema
    pub fn namespace(&self) -> NamespaceContext {
        NamespaceContext {
            catalog: self.catalog_name.clone(),
            schema: self.schema_name.clone(),
        }
    }

    /// Replication settings for the capability gate
    pub fn replication_request(&self) -> ReplicationRequest {
        ReplicationRequest {
            mode: if self.query.is_some() {
                ReplicationMode::Query
            } else {
                ReplicationMode::Table
            },
            incremental: self.incremental,
            use_raw_query_with_incremental: self.use_raw_query_with_incremental,
            incremental_columns: self.incremental_columns.clone(),
            last_record: self.last_record.clone(),
        }
    }

    /// Override layers from `column_options` and `default_column_options`
    pub fn type_rules(&self) -> Result<TypeRules> {
        let mut rules = TypeRules::new();
        for (type_name, option) in &self.default_column_options {
            let rule = option.to_rule(&format!("default_column_options.{}", type_name))?;
            rules = rules.with_type(type_name.as_str(), rule);
        }
        for (column, option) in &self.column_options {
            let rule = option.to_rule(&format!("column_options.{}", column))?;
            rules = rules.with_column(column.as_str(), rule);
        }
        Ok(rules)
    }

    /// Pass-through properties as strings
    pub fn option_entries(&self) -> impl Iterator<Item = (&str, String)> {
        self.options.iter().map(|(k, v)| {
            let value = match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.as_str(), value)
        })
    }
}
