//! Engine-side values
//!
//! Cells exactly as the driver hands them over, before any portable
//! conversion:
//! - scalars: booleans, integer widths, floats, DECIMAL
//! - DATE, zone-naive TIMESTAMP_NTZ and zoned TIMESTAMP
//! - ARRAY / MAP / STRUCT, kept in source iteration order
//! - INTERVAL literals in their display form

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single cell read from the warehouse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// SQL NULL
    Null,
    /// BOOLEAN
    Bool(bool),
    /// TINYINT
    Int8(i8),
    /// SMALLINT
    Int16(i16),
    /// INT
    Int32(i32),
    /// BIGINT
    Int64(i64),
    /// FLOAT
    Float32(f32),
    /// DOUBLE
    Float64(f64),
    /// DECIMAL(p, s)
    Decimal(Decimal),
    /// STRING / VARCHAR / CHAR
    String(String),
    /// BINARY
    Bytes(Vec<u8>),
    /// DATE
    Date(NaiveDate),
    /// TIMESTAMP_NTZ, no zone attached
    DateTime(NaiveDateTime),
    /// TIMESTAMP, an instant
    DateTimeTz(DateTime<Utc>),
    /// ARRAY
    Array(Vec<Value>),
    /// MAP entries in source iteration order
    Map(Vec<(Value, Value)>),
    /// STRUCT fields in declaration order
    Struct(Vec<(String, Value)>),
    /// INTERVAL display text, e.g. `100-0`
    Interval(String),
    /// JSON document the driver already parsed
    Json(serde_json::Value),
}

impl Value {
    /// Check if value is NULL
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Warehouse type keyword of this value, used in conversion errors
    pub fn sql_type(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "BOOLEAN",
            Self::Int8(_) => "TINYINT",
            Self::Int16(_) => "SMALLINT",
            Self::Int32(_) => "INT",
            Self::Int64(_) => "BIGINT",
            Self::Float32(_) => "FLOAT",
            Self::Float64(_) => "DOUBLE",
            Self::Decimal(_) => "DECIMAL",
            Self::String(_) => "STRING",
            Self::Bytes(_) => "BINARY",
            Self::Date(_) => "DATE",
            Self::DateTime(_) => "TIMESTAMP_NTZ",
            Self::DateTimeTz(_) => "TIMESTAMP",
            Self::Array(_) => "ARRAY",
            Self::Map(_) => "MAP",
            Self::Struct(_) => "STRUCT",
            Self::Interval(_) => "INTERVAL",
            Self::Json(_) => "JSON",
        }
    }

    /// Boolean view. Non-zero integers are true; strings accept
    /// `true`/`false`, `yes`/`no`, `1`/`0` in any case.
    pub fn as_bool(&self) -> Option<bool> {
        const TRUE: [&str; 3] = ["true", "yes", "1"];
        const FALSE: [&str; 3] = ["false", "no", "0"];
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int8(_) | Self::Int16(_) | Self::Int32(_) | Self::Int64(_) => {
                self.as_i64().map(|n| n != 0)
            }
            Self::String(s) => {
                let s = s.trim();
                if TRUE.iter().any(|t| s.eq_ignore_ascii_case(t)) {
                    Some(true)
                } else if FALSE.iter().any(|f| s.eq_ignore_ascii_case(f)) {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Integer view. Floats and DECIMAL truncate toward zero; strings are
    /// parsed after trimming. Values outside the `i64` range have no view.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int8(n) => Some(n.into()),
            Self::Int16(n) => Some(n.into()),
            Self::Int32(n) => Some(n.into()),
            Self::Int64(n) => Some(n),
            Self::Bool(b) => Some(b.into()),
            Self::Float32(f) => float_to_i64(f.into()),
            Self::Float64(f) => float_to_i64(f),
            Self::Decimal(d) => d.trunc().to_i64(),
            Self::String(ref s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Double view.
    ///
    /// DECIMAL is widened to double; digits beyond double precision are lost.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float32(f) => Some(f.into()),
            Self::Float64(f) => Some(f),
            Self::Decimal(d) => d.to_f64(),
            Self::Int64(n) => Some(n as f64),
            Self::Int8(_) | Self::Int16(_) | Self::Int32(_) => self.as_i64().map(|n| n as f64),
            Self::String(ref s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Borrow text of STRING and INTERVAL cells
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Interval(s) => Some(s),
            _ => None,
        }
    }
}

/// Truncate toward zero; NaN, infinities and out-of-range values are `None`
fn float_to_i64(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    const UPPER: f64 = i64::MAX as f64;
    const LOWER: f64 = i64::MIN as f64;
    let t = f.trunc();
    (t >= LOWER && t < UPPER).then_some(t as i64)
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
    Decimal => Decimal,
    String => String,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
    DateTime<Utc> => DateTimeTz,
    serde_json::Value => Json,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

/// One result row; names and values are positionally aligned
#[derive(Debug, Clone)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Row from aligned names and values
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Number of cells
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no cells
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Cells in column order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Cell at a 0-based position
    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Cell by column name; the warehouse matches names case-insensitively
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))?;
        self.values.get(idx)
    }
}

/// A result column discovered by describing a statement
#[derive(Debug, Clone)]
pub struct ColumnMetadata {
    /// Column name
    pub name: String,
    /// Type as reported, parameters included, e.g. `DECIMAL(4,2)`
    pub type_name: String,
    /// NULL allowed
    pub nullable: bool,
    /// Position within the primary key, 1-based
    pub primary_key_ordinal: Option<u32>,
    /// Position within the result, 1-based; 0 when unknown
    pub ordinal: u32,
}

impl ColumnMetadata {
    /// Nullable, non-key column
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable: true,
            primary_key_ordinal: None,
            ordinal: 0,
        }
    }

    /// Set the result position
    pub fn with_ordinal(mut self, ordinal: u32) -> Self {
        self.ordinal = ordinal;
        self
    }

    /// Mark as the `ordinal`-th primary key column
    pub fn with_primary_key(mut self, ordinal: u32) -> Self {
        self.primary_key_ordinal = Some(ordinal);
        self.nullable = false;
        self
    }

    /// Whether the column belongs to the primary key
    pub fn is_primary_key(&self) -> bool {
        self.primary_key_ordinal.is_some()
    }
}
