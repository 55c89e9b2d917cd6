//! SQL value types carried from fixture datasets to database parameters.
//!
//! Dataset readers produce owned [`SqlValue`]s; drivers convert them into their
//! own parameter types at bind time.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A single cell value.
///
/// Fixture formats are mostly untyped, so most values arrive as `Text` and are
/// coerced by the driver once the destination type is known.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL.
    Null,

    /// Boolean value.
    Bool(bool),

    /// 64-bit signed integer. Narrower integer columns are range-checked by drivers.
    I64(i64),

    /// 64-bit floating point.
    F64(f64),

    /// Text data.
    Text(String),

    /// Binary data.
    Bytes(Vec<u8>),

    /// UUID/GUID value.
    Uuid(Uuid),

    /// Decimal value with arbitrary precision.
    Decimal(Decimal),

    /// Timestamp without timezone.
    DateTime(NaiveDateTime),

    /// Timestamp with timezone offset.
    DateTimeOffset(DateTime<FixedOffset>),

    /// Date without time component.
    Date(NaiveDate),

    /// Time without date component.
    Time(NaiveTime),
}

impl SqlValue {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Text form of the value as a database would parse it from a string literal.
    ///
    /// Returns `None` for NULL and for binary data.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            SqlValue::Null | SqlValue::Bytes(_) => None,
            SqlValue::Bool(b) => Some(b.to_string()),
            SqlValue::I64(v) => Some(v.to_string()),
            SqlValue::F64(v) => Some(v.to_string()),
            SqlValue::Text(s) => Some(s.clone()),
            SqlValue::Uuid(u) => Some(u.to_string()),
            SqlValue::Decimal(d) => Some(d.to_string()),
            SqlValue::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            SqlValue::DateTimeOffset(dt) => Some(dt.to_rfc3339()),
            SqlValue::Date(d) => Some(d.to_string()),
            SqlValue::Time(t) => Some(t.to_string()),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::I64(v) => write!(f, "{}", v),
            SqlValue::F64(v) => write!(f, "{}", v),
            SqlValue::Decimal(d) => write!(f, "{}", d),
            SqlValue::Bytes(b) => {
                f.write_str("0x")?;
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            other => {
                let text = other.as_text().unwrap_or_default();
                write!(f, "'{}'", text.replace('\'', "''"))
            }
        }
    }
}

/// Render an argument list for diagnostics: `[1, 'alice', NULL]`.
pub fn format_args_list(args: &[SqlValue]) -> String {
    let parts: Vec<String> = args.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::I64(v as i64)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::I64(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::F64(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

impl From<DateTime<FixedOffset>> for SqlValue {
    fn from(v: DateTime<FixedOffset>) -> Self {
        SqlValue::DateTimeOffset(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<NaiveTime> for SqlValue {
    fn from(v: NaiveTime) -> Self {
        SqlValue::Time(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}
