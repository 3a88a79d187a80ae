//! Portable values and schema
//!
//! Converts engine [`Value`]s into [`PortableValue`]s according to a
//! [`ResolvedRule`], and renders them as text for the output sink.

use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::{Map as JsonMap, Number, Value as Json};

use crate::error::{Error, Result};
use crate::typemap::{PortableType, ResolvedRule, TypeNormalizer};
use crate::types::{ColumnMetadata, Row, Value};

/// Default pattern for timestamp text: microseconds and numeric offset
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f %z";

/// Pattern for DATE values rendered as string without a format or zone
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A value of one of the portable types
#[derive(Debug, Clone, PartialEq)]
pub enum PortableValue {
    /// NULL of any type
    Null,
    /// long
    Long(i64),
    /// double
    Double(f64),
    /// boolean
    Boolean(bool),
    /// string
    String(String),
    /// timestamp
    Timestamp(DateTime<Utc>),
    /// json
    Json(Json),
}

impl PortableValue {
    /// Check if value is NULL
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Portable type of a non-null value
    pub fn portable_type(&self) -> Option<PortableType> {
        match self {
            Self::Null => None,
            Self::Long(_) => Some(PortableType::Long),
            Self::Double(_) => Some(PortableType::Double),
            Self::Boolean(_) => Some(PortableType::Boolean),
            Self::String(_) => Some(PortableType::String),
            Self::Timestamp(_) => Some(PortableType::Timestamp),
            Self::Json(_) => Some(PortableType::Json),
        }
    }
}

/// Render a double so integral values keep a fractional part (`2.0`)
pub fn format_double(v: f64) -> String {
    format!("{:?}", v)
}

fn format_in_zone(ts: &DateTime<Utc>, pattern: &str, tz: Option<Tz>) -> Option<String> {
    let mut out = String::new();
    let written = match tz {
        Some(tz) => write!(out, "{}", ts.with_timezone(&tz).format(pattern)),
        None => write!(out, "{}", ts.format(pattern)),
    };
    written.ok().map(|_| out)
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    const PATTERNS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
    PATTERNS
        .iter()
        .find_map(|p| NaiveDateTime::parse_from_str(s, p).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Parse a timestamp string. Zone-less input is read in `tz` (UTC if unset).
pub fn parse_timestamp(s: &str, tz: Option<Tz>) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    const ZONED: &[&str] = &["%Y-%m-%d %H:%M:%S%.f %z", "%Y-%m-%d %H:%M:%S%.f%:z"];
    if let Some(dt) = ZONED
        .iter()
        .find_map(|p| DateTime::parse_from_str(s, p).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = match s.strip_suffix('Z') {
        Some(stripped) => return parse_naive(stripped.trim_end()).map(|n| n.and_utc()),
        None => parse_naive(s)?,
    };
    match tz {
        Some(tz) => tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
        None => Some(naive.and_utc()),
    }
}

fn midnight_utc(d: &NaiveDate) -> DateTime<Utc> {
    d.and_time(NaiveTime::MIN).and_utc()
}

/// Structural JSON form of an engine value
pub fn to_json(value: &Value) -> std::result::Result<Json, String> {
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int8(n) => Json::from(*n),
        Value::Int16(n) => Json::from(*n),
        Value::Int32(n) => Json::from(*n),
        Value::Int64(n) => Json::from(*n),
        Value::Float32(_) | Value::Float64(_) | Value::Decimal(_) => {
            let f = value.as_f64().unwrap_or(f64::NAN);
            Number::from_f64(f)
                .map(Json::Number)
                .ok_or_else(|| format!("non-finite number {} has no JSON form", f))?
        }
        Value::String(s) | Value::Interval(s) => Json::String(s.clone()),
        Value::Bytes(_) => return Err("binary values have no JSON form".to_string()),
        Value::Date(d) => Json::String(d.format(DATE_FORMAT).to_string()),
        Value::DateTime(n) => Json::String(n.and_utc().format(DEFAULT_TIMESTAMP_FORMAT).to_string()),
        Value::DateTimeTz(t) => Json::String(t.format(DEFAULT_TIMESTAMP_FORMAT).to_string()),
        Value::Array(items) => {
            let items = items
                .iter()
                .map(to_json)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Json::Array(items)
        }
        Value::Map(entries) => {
            let mut map = JsonMap::with_capacity(entries.len());
            for (k, v) in entries {
                let key = match k {
                    Value::String(s) => s.clone(),
                    other => match to_json(other)? {
                        Json::String(s) => s,
                        json => json.to_string(),
                    },
                };
                map.insert(key, to_json(v)?);
            }
            Json::Object(map)
        }
        Value::Struct(fields) => {
            let mut map = JsonMap::with_capacity(fields.len());
            for (name, v) in fields {
                map.insert(name.clone(), to_json(v)?);
            }
            Json::Object(map)
        }
        Value::Json(j) => j.clone(),
    })
}

impl ResolvedRule {
    fn conversion_error(&self, value: &Value) -> Error {
        Error::type_conversion(
            &self.column,
            format!(
                "cannot convert {} value to {}",
                value.sql_type(),
                self.value_type
            ),
        )
    }

    /// Render a timestamp with this rule's format and zone
    pub fn format_timestamp(&self, ts: &DateTime<Utc>) -> Result<String> {
        let pattern = self
            .timestamp_format
            .as_deref()
            .unwrap_or(DEFAULT_TIMESTAMP_FORMAT);
        format_in_zone(ts, pattern, self.timezone).ok_or_else(|| {
            Error::type_conversion(
                &self.column,
                format!("cannot format timestamp with '{}'", pattern),
            )
        })
    }

    fn to_timestamp(&self, value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::Date(d) => Some(midnight_utc(d)),
            Value::DateTime(n) => Some(n.and_utc()),
            Value::DateTimeTz(t) => Some(*t),
            Value::String(s) => parse_timestamp(s, self.timezone),
            Value::Int64(secs) => DateTime::from_timestamp(*secs, 0),
            Value::Int32(secs) => DateTime::from_timestamp(i64::from(*secs), 0),
            _ => None,
        }
    }

    fn to_text(&self, value: &Value) -> Result<String> {
        match value {
            Value::String(s) | Value::Interval(s) => Ok(s.clone()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Int8(n) => Ok(n.to_string()),
            Value::Int16(n) => Ok(n.to_string()),
            Value::Int32(n) => Ok(n.to_string()),
            Value::Int64(n) => Ok(n.to_string()),
            Value::Float32(n) => Ok(format!("{:?}", n)),
            Value::Float64(n) => Ok(format_double(*n)),
            Value::Decimal(d) => Ok(d.to_string()),
            Value::Date(d) if self.timestamp_format.is_none() && self.timezone.is_none() => {
                Ok(d.format(DATE_FORMAT).to_string())
            }
            Value::Date(d) => self.format_timestamp(&midnight_utc(d)),
            Value::DateTime(n) => self.format_timestamp(&n.and_utc()),
            Value::DateTimeTz(t) => self.format_timestamp(t),
            Value::Array(_) | Value::Map(_) | Value::Struct(_) | Value::Json(_) => to_json(value)
                .map(|j| j.to_string())
                .map_err(|msg| Error::type_conversion(&self.column, msg)),
            Value::Bytes(_) | Value::Null => Err(self.conversion_error(value)),
        }
    }

    /// Convert an engine value to this rule's portable type.
    ///
    /// NULL stays NULL. Failures name the column; nothing falls back to a
    /// default value.
    pub fn convert(&self, value: &Value) -> Result<PortableValue> {
        if value.is_null() {
            return Ok(PortableValue::Null);
        }
        match self.value_type {
            PortableType::Long => {
                let n = match value {
                    Value::Date(_) | Value::DateTime(_) | Value::DateTimeTz(_) => {
                        self.to_timestamp(value).map(|ts| ts.timestamp())
                    }
                    _ => value.as_i64(),
                };
                n.map(PortableValue::Long)
                    .ok_or_else(|| self.conversion_error(value))
            }
            PortableType::Double => {
                let f = match value {
                    Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
                    _ => value.as_f64(),
                };
                f.map(PortableValue::Double)
                    .ok_or_else(|| self.conversion_error(value))
            }
            PortableType::Boolean => value
                .as_bool()
                .map(PortableValue::Boolean)
                .ok_or_else(|| self.conversion_error(value)),
            PortableType::String => self.to_text(value).map(PortableValue::String),
            PortableType::Timestamp => self
                .to_timestamp(value)
                .map(PortableValue::Timestamp)
                .ok_or_else(|| self.conversion_error(value)),
            PortableType::Json => {
                let json = match value {
                    Value::String(s) => serde_json::from_str::<Json>(s).map_err(|e| {
                        Error::type_conversion(&self.column, format!("invalid JSON text: {}", e))
                    })?,
                    _ => to_json(value).map_err(|msg| Error::type_conversion(&self.column, msg))?,
                };
                Ok(PortableValue::Json(json))
            }
        }
    }

    /// Textual output of an engine value, `None` for NULL
    pub fn render(&self, value: &Value) -> Result<Option<String>> {
        let text = match self.convert(value)? {
            PortableValue::Null => return Ok(None),
            PortableValue::Long(n) => n.to_string(),
            PortableValue::Double(f) => format_double(f),
            PortableValue::Boolean(b) => b.to_string(),
            PortableValue::String(s) => s,
            PortableValue::Timestamp(ts) => self.format_timestamp(&ts)?,
            PortableValue::Json(j) => j.to_string(),
        };
        Ok(Some(text))
    }
}

/// Portable column in output order
#[derive(Debug, Clone, PartialEq)]
pub struct PortableColumn {
    /// 0-based position
    pub index: usize,
    /// Resolved rule, including name and output type
    pub rule: ResolvedRule,
}

impl PortableColumn {
    /// Column name
    pub fn name(&self) -> &str {
        &self.rule.column
    }

    /// Output type
    pub fn value_type(&self) -> PortableType {
        self.rule.value_type
    }
}

/// Portable output schema, one resolved rule per discovered column
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PortableSchema {
    columns: Vec<PortableColumn>,
}

impl PortableSchema {
    /// Resolve every column. Fails on the first unsupported column.
    pub fn build(normalizer: &TypeNormalizer, columns: &[ColumnMetadata]) -> Result<Self> {
        let columns = columns
            .iter()
            .enumerate()
            .map(|(index, c)| {
                normalizer
                    .resolve(&c.type_name, &c.name)
                    .map(|rule| PortableColumn { index, rule })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { columns })
    }

    /// Columns in output order
    pub fn columns(&self) -> &[PortableColumn] {
        &self.columns
    }

    /// Column count
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column by name (case-insensitive)
    pub fn column(&self, name: &str) -> Option<&PortableColumn> {
        self.columns
            .iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }

    fn check_arity(&self, row: &Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::internal(format!(
                "row has {} values, schema has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        Ok(())
    }

    /// Convert a row positionally
    pub fn convert_row(&self, row: &Row) -> Result<Vec<PortableValue>> {
        self.check_arity(row)?;
        self.columns
            .iter()
            .zip(row.values())
            .map(|(c, v)| c.rule.convert(v))
            .collect()
    }

    /// Render a row positionally
    pub fn render_row(&self, row: &Row) -> Result<Vec<Option<String>>> {
        self.check_arity(row)?;
        self.columns
            .iter()
            .zip(row.values())
            .map(|(c, v)| c.rule.render(v))
            .collect()
    }
}
