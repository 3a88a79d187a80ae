//! Source type resolution
//!
//! Maps warehouse column types onto the closed set of [`PortableType`]s.
//! A column's rule comes from the first layer that has one:
//!
//! 1. per-column rule, keyed by column name
//! 2. per-type rule, keyed by driver type name (`VARCHAR`, `REAL`, ...) or
//!    by the SQL keyword (`STRING`, `FLOAT`, ...)
//! 3. the built-in table below
//!
//! | family | portable type |
//! |---|---|
//! | TINYINT, SMALLINT, INT, BIGINT | long |
//! | FLOAT, DOUBLE, DECIMAL | double |
//! | BOOLEAN | boolean |
//! | STRING, VARCHAR, CHAR | string |
//! | DATE, TIMESTAMP, TIMESTAMP_NTZ | timestamp |
//! | ARRAY, MAP, STRUCT | string, holding compact JSON text |
//! | INTERVAL, VOID, unknown | string |
//! | BINARY | unsupported |

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Portable output value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PortableType {
    /// 64-bit integer
    Long,
    /// 64-bit float
    Double,
    /// Boolean
    Boolean,
    /// Text
    String,
    /// Instant with microsecond precision
    Timestamp,
    /// JSON document, rendered as compact text
    Json,
}

impl PortableType {
    /// Type name as used in configuration
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Timestamp => "timestamp",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for PortableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PortableType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" => Ok(Self::Long),
            "double" => Ok(Self::Double),
            "boolean" => Ok(Self::Boolean),
            "string" => Ok(Self::String),
            "timestamp" => Ok(Self::Timestamp),
            "json" => Ok(Self::Json),
            other => Err(Error::config(format!(
                "unknown type '{}': expected one of long, double, boolean, string, timestamp, json",
                other
            ))),
        }
    }
}

/// Source type family, parsed from an engine type name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceTypeFamily {
    /// TINYINT / BYTE
    TinyInt,
    /// SMALLINT / SHORT
    SmallInt,
    /// INT / INTEGER
    Int,
    /// BIGINT / LONG
    BigInt,
    /// FLOAT / REAL
    Float,
    /// DOUBLE
    Double,
    /// DECIMAL / DEC / NUMERIC
    Decimal,
    /// BOOLEAN
    Boolean,
    /// STRING / VARCHAR / CHAR
    String,
    /// DATE
    Date,
    /// TIMESTAMP / TIMESTAMP_LTZ
    Timestamp,
    /// TIMESTAMP_NTZ
    TimestampNtz,
    /// ARRAY<...>
    Array,
    /// MAP<...>
    Map,
    /// STRUCT<...>
    Struct,
    /// BINARY
    Binary,
    /// INTERVAL ...
    Interval,
    /// VOID / NULL
    Void,
    /// Anything else, by upper-cased base keyword
    Other(String),
}

impl SourceTypeFamily {
    /// Parse a type name such as `DECIMAL(4,2)`, `Map<STRING, INT>` or
    /// `INTERVAL YEAR TO MONTH`. Case-insensitive; total.
    pub fn parse(type_name: &str) -> Self {
        let base: String = type_name
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect::<String>()
            .to_ascii_uppercase();

        match base.as_str() {
            "TINYINT" | "BYTE" => Self::TinyInt,
            "SMALLINT" | "SHORT" => Self::SmallInt,
            "INT" | "INTEGER" => Self::Int,
            "BIGINT" | "LONG" => Self::BigInt,
            "FLOAT" | "REAL" => Self::Float,
            "DOUBLE" => Self::Double,
            "DECIMAL" | "DEC" | "NUMERIC" => Self::Decimal,
            "BOOLEAN" | "BOOL" => Self::Boolean,
            "STRING" | "VARCHAR" | "CHAR" => Self::String,
            "DATE" => Self::Date,
            "TIMESTAMP" | "TIMESTAMP_LTZ" => Self::Timestamp,
            "TIMESTAMP_NTZ" => Self::TimestampNtz,
            "ARRAY" => Self::Array,
            "MAP" => Self::Map,
            "STRUCT" => Self::Struct,
            "BINARY" => Self::Binary,
            "INTERVAL" => Self::Interval,
            "VOID" | "NULL" => Self::Void,
            _ => Self::Other(base),
        }
    }

    /// SQL keyword of the family
    pub fn keyword(&self) -> &str {
        match self {
            Self::TinyInt => "TINYINT",
            Self::SmallInt => "SMALLINT",
            Self::Int => "INT",
            Self::BigInt => "BIGINT",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Decimal => "DECIMAL",
            Self::Boolean => "BOOLEAN",
            Self::String => "STRING",
            Self::Date => "DATE",
            Self::Timestamp => "TIMESTAMP",
            Self::TimestampNtz => "TIMESTAMP_NTZ",
            Self::Array => "ARRAY",
            Self::Map => "MAP",
            Self::Struct => "STRUCT",
            Self::Binary => "BINARY",
            Self::Interval => "INTERVAL",
            Self::Void => "VOID",
            Self::Other(name) => name,
        }
    }

    /// Type name the driver reports for this family
    pub fn driver_type_name(&self) -> &str {
        match self {
            Self::TinyInt => "TINYINT",
            Self::SmallInt => "SMALLINT",
            Self::Int => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Float => "REAL",
            Self::Double => "DOUBLE",
            Self::Decimal => "DECIMAL",
            Self::Boolean => "BOOLEAN",
            Self::String | Self::Array | Self::Map | Self::Struct | Self::Interval => "VARCHAR",
            Self::Date => "DATE",
            Self::Timestamp | Self::TimestampNtz => "TIMESTAMP",
            Self::Binary => "BINARY",
            Self::Void => "NULL",
            Self::Other(name) => name,
        }
    }

    /// Built-in portable type, `None` for families that cannot be represented
    pub fn builtin_type(&self) -> Option<PortableType> {
        match self {
            Self::TinyInt | Self::SmallInt | Self::Int | Self::BigInt => Some(PortableType::Long),
            Self::Float | Self::Double | Self::Decimal => Some(PortableType::Double),
            Self::Boolean => Some(PortableType::Boolean),
            Self::Date | Self::Timestamp | Self::TimestampNtz => Some(PortableType::Timestamp),
            Self::Binary => None,
            Self::String
            | Self::Array
            | Self::Map
            | Self::Struct
            | Self::Interval
            | Self::Void
            | Self::Other(_) => Some(PortableType::String),
        }
    }

    /// Whether the family carries date/time values
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Timestamp | Self::TimestampNtz)
    }
}

impl fmt::Display for SourceTypeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One override rule
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnRule {
    /// Output type; unset keeps the family's built-in type
    pub value_type: Option<PortableType>,
    /// strftime pattern for timestamp text
    pub timestamp_format: Option<String>,
    /// Zone for timestamp text and for parsing zone-less strings
    pub timezone: Option<Tz>,
}

impl ColumnRule {
    /// Rule forcing an output type
    pub fn of_type(value_type: PortableType) -> Self {
        Self {
            value_type: Some(value_type),
            ..Default::default()
        }
    }

    /// Set the timestamp format, rejecting invalid strftime patterns
    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Result<Self> {
        let format = format.into();
        validate_timestamp_format(&format)?;
        self.timestamp_format = Some(format);
        Ok(self)
    }

    /// Set the timezone
    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = Some(tz);
        self
    }
}

/// Reject strftime patterns chrono cannot render
pub fn validate_timestamp_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(Error::config(format!(
            "invalid timestamp_format '{}'",
            format
        )));
    }
    Ok(())
}

/// Parse an IANA zone name
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| Error::config(format!("unknown timezone '{}'", name)))
}

/// Which layer a resolved rule came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleLayer {
    /// Per-column rule
    Column,
    /// Per-type default rule
    SourceType,
    /// Built-in table
    BuiltIn,
}

/// Override rules for the two configurable layers
#[derive(Debug, Clone, Default)]
pub struct TypeRules {
    by_column: BTreeMap<String, ColumnRule>,
    by_type: BTreeMap<String, ColumnRule>,
}

impl TypeRules {
    /// No overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a per-column rule
    pub fn with_column(mut self, column: impl Into<String>, rule: ColumnRule) -> Self {
        self.by_column.insert(column.into(), rule);
        self
    }

    /// Add a per-type rule; the key is matched case-insensitively
    pub fn with_type(mut self, type_name: impl Into<String>, rule: ColumnRule) -> Self {
        self.by_type
            .insert(type_name.into().to_ascii_uppercase(), rule);
        self
    }

    /// Per-column rule, exact name first, then case-insensitive
    pub fn column_rule(&self, column: &str) -> Option<&ColumnRule> {
        self.by_column.get(column).or_else(|| {
            self.by_column
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(column))
                .map(|(_, rule)| rule)
        })
    }

    /// Per-type rule, by driver type name first, then by SQL keyword
    pub fn type_rule(&self, family: &SourceTypeFamily) -> Option<&ColumnRule> {
        self.by_type
            .get(&family.driver_type_name().to_ascii_uppercase())
            .or_else(|| self.by_type.get(&family.keyword().to_ascii_uppercase()))
    }
}

/// Outcome of resolving one column
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRule {
    /// Column name
    pub column: String,
    /// Source type name as reported
    pub source_type: String,
    /// Parsed source family
    pub family: SourceTypeFamily,
    /// Output type
    pub value_type: PortableType,
    /// strftime pattern from the winning layer
    pub timestamp_format: Option<String>,
    /// Zone from the winning layer
    pub timezone: Option<Tz>,
    /// Layer the rule came from
    pub layer: RuleLayer,
}

/// Resolves column rules. Pure; no I/O.
#[derive(Debug, Clone, Default)]
pub struct TypeNormalizer {
    rules: TypeRules,
}

impl TypeNormalizer {
    /// Normalizer with the given overrides
    pub fn new(rules: TypeRules) -> Self {
        Self { rules }
    }

    /// Configured overrides
    pub fn rules(&self) -> &TypeRules {
        &self.rules
    }

    /// Resolve the rule for `column` of type `source_type`.
    ///
    /// The winning layer's rule is taken whole; format and timezone are not
    /// merged from lower layers. BINARY columns are rejected regardless of
    /// overrides.
    pub fn resolve(&self, source_type: &str, column: &str) -> Result<ResolvedRule> {
        let family = SourceTypeFamily::parse(source_type);
        let builtin = family
            .builtin_type()
            .ok_or_else(|| Error::unsupported_type(column, source_type))?;

        let layered = [
            (RuleLayer::Column, self.rules.column_rule(column)),
            (RuleLayer::SourceType, self.rules.type_rule(&family)),
        ]
        .into_iter()
        .find_map(|(layer, rule)| rule.map(|rule| (layer, rule)));

        let resolved = match layered {
            Some((layer, rule)) => ResolvedRule {
                column: column.to_string(),
                source_type: source_type.to_string(),
                value_type: rule.value_type.unwrap_or(builtin),
                timestamp_format: rule.timestamp_format.clone(),
                timezone: rule.timezone,
                layer,
                family,
            },
            None => ResolvedRule {
                column: column.to_string(),
                source_type: source_type.to_string(),
                value_type: builtin,
                timestamp_format: None,
                timezone: None,
                layer: RuleLayer::BuiltIn,
                family,
            },
        };
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parameterized_types() {
        assert_eq!(SourceTypeFamily::parse("DECIMAL(4,2)"), SourceTypeFamily::Decimal);
        assert_eq!(SourceTypeFamily::parse("ARRAY<INT>"), SourceTypeFamily::Array);
        assert_eq!(SourceTypeFamily::parse("Map<STRING, INT>"), SourceTypeFamily::Map);
        assert_eq!(
            SourceTypeFamily::parse("STRUCT<c1:STRING>"),
            SourceTypeFamily::Struct
        );
        assert_eq!(
            SourceTypeFamily::parse("interval year to month"),
            SourceTypeFamily::Interval
        );
        assert_eq!(
            SourceTypeFamily::parse("GEOGRAPHY"),
            SourceTypeFamily::Other("GEOGRAPHY".into())
        );
    }

    #[test]
    fn test_driver_type_names() {
        assert_eq!(SourceTypeFamily::Int.driver_type_name(), "INTEGER");
        assert_eq!(SourceTypeFamily::Float.driver_type_name(), "REAL");
        assert_eq!(SourceTypeFamily::Struct.driver_type_name(), "VARCHAR");
        assert_eq!(SourceTypeFamily::TimestampNtz.driver_type_name(), "TIMESTAMP");
    }

    #[test]
    fn test_portable_type_from_str() {
        assert_eq!("JSON".parse::<PortableType>().unwrap(), PortableType::Json);
        assert!("binary".parse::<PortableType>().is_err());
    }

    #[test]
    fn test_invalid_timestamp_format() {
        assert!(validate_timestamp_format("%Y/%m/%d %H:%M:%S").is_ok());
        assert!(validate_timestamp_format("%Q").is_err());
        assert!(ColumnRule::default().with_timestamp_format("%").is_err());
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("Asia/Tokyo").unwrap(), chrono_tz::Asia::Tokyo);
        assert!(parse_timezone("Mars/Olympus").is_err());
    }
}
