//! Driver connection properties
//!
//! - Ordered key/value bag handed to the [`ConnectionFactory`](crate::connection::ConnectionFactory)
//! - Secret entries are tagged at insert time and never printed
//! - [`ConnectionProperties::masked`] is a copy-and-redact view for diagnostics

use std::collections::BTreeMap;
use std::fmt;

use crate::secret::SensitiveString;

/// Fixed replacement for secret values in diagnostic output
pub const MASK: &str = "***";

/// Fixed port the SQL warehouse endpoint listens on
pub const DEFAULT_PORT: u16 = 443;

/// Property keys whose values are credentials
pub const SENSITIVE_KEYS: &[&str] = &["PWD", "OAuth2Secret"];

/// Whether a property key carries a credential
pub fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// A single property value
#[derive(Clone, PartialEq)]
pub enum PropertyValue {
    /// Logged as-is
    Plain(String),
    /// Write-only for transport
    Secret(SensitiveString),
}

impl PropertyValue {
    /// Value to hand to the driver
    pub fn expose(&self) -> &str {
        match self {
            Self::Plain(v) => v,
            Self::Secret(v) => v.expose_secret(),
        }
    }

    /// Whether this value is a credential
    pub fn is_secret(&self) -> bool {
        matches!(self, Self::Secret(_))
    }
}

impl fmt::Debug for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(v) => write!(f, "{:?}", v),
            Self::Secret(_) => write!(f, "{:?}", MASK),
        }
    }
}

/// Connection properties assembled for the driver
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionProperties {
    host: String,
    port: u16,
    entries: BTreeMap<String, PropertyValue>,
    driver_path: Option<String>,
}

impl ConnectionProperties {
    /// Properties for `host` on the default port
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            entries: BTreeMap::new(),
            driver_path: None,
        }
    }

    /// Server host name
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Server port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` endpoint address
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// JDBC-style URL for drivers that take one
    pub fn url(&self) -> String {
        format!("jdbc:databricks://{}", self.endpoint())
    }

    /// Location of a non-bundled driver, if configured
    pub fn driver_path(&self) -> Option<&str> {
        self.driver_path.as_deref()
    }

    /// Set the driver location
    pub fn with_driver_path(mut self, path: impl Into<String>) -> Self {
        self.driver_path = Some(path.into());
        self
    }

    /// Set a property. Known credential keys are stored as secrets.
    ///
    /// The driver reads keys case-insensitively, so an existing key that
    /// differs only in case is replaced, spelling included.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        let value = if is_sensitive_key(&key) {
            PropertyValue::Secret(SensitiveString::new(value))
        } else {
            PropertyValue::Plain(value)
        };
        self.insert(key, value);
    }

    /// Set a property that is always treated as a secret
    pub fn set_secret(&mut self, key: impl Into<String>, value: SensitiveString) {
        self.insert(key.into(), PropertyValue::Secret(value));
    }

    fn insert(&mut self, key: String, value: PropertyValue) {
        self.entries.retain(|k, _| !k.eq_ignore_ascii_case(&key));
        self.entries.insert(key, value);
    }

    fn lookup(&self, key: &str) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find_map(|(k, v)| k.eq_ignore_ascii_case(key).then_some(v))
    }

    /// Get a property value as the driver will see it
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lookup(key).map(PropertyValue::expose)
    }

    /// Whether a property is stored as a secret
    pub fn is_secret(&self, key: &str) -> bool {
        self.lookup(key).is_some_and(PropertyValue::is_secret)
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no properties are set
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over properties with exposed values, for the driver
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.expose()))
    }

    /// Copy of the properties with every secret replaced by [`MASK`].
    ///
    /// Leaves `self` untouched.
    pub fn masked(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|(k, v)| {
                let shown = match v {
                    PropertyValue::Plain(v) => v.clone(),
                    PropertyValue::Secret(_) => MASK.to_string(),
                };
                (k.clone(), shown)
            })
            .collect()
    }
}

impl fmt::Display for ConnectionProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.url())?;
        for (i, (k, v)) in self.masked().iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {}={}", k, v)?;
        }
        write!(f, " }}")
    }
}
