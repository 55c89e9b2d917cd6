//! Binding dataset values to PostgreSQL parameters.
//!
//! Fixture values are loosely typed (CSV fields are all text, YAML numbers may
//! land in a NUMERIC column). [`PgParam`] encodes each value in the binary
//! format of the parameter type the server inferred for the prepared
//! statement, parsing text where needed.

use std::error::Error;
use std::str::FromStr;

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tokio_postgres::types::{to_sql_checked, IsNull, Kind, ToSql, Type};
use uuid::Uuid;

use crate::core::value::SqlValue;

type BoxError = Box<dyn Error + Sync + Send>;

/// A dataset value bound to a prepared statement parameter.
#[derive(Debug)]
pub struct PgParam<'a>(pub &'a SqlValue);

impl ToSql for PgParam<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        let value = self.0;
        if value.is_null() {
            return Ok(IsNull::Yes);
        }
        match *ty {
            Type::BOOL => to_bool(value)?.to_sql(ty, out),
            Type::INT2 => i16::try_from(to_i64(value)?)?.to_sql(ty, out),
            Type::INT4 => i32::try_from(to_i64(value)?)?.to_sql(ty, out),
            Type::INT8 => to_i64(value)?.to_sql(ty, out),
            Type::FLOAT4 => (to_f64(value)? as f32).to_sql(ty, out),
            Type::FLOAT8 => to_f64(value)?.to_sql(ty, out),
            Type::NUMERIC => to_decimal(value)?.to_sql(ty, out),
            Type::UUID => to_uuid(value)?.to_sql(ty, out),
            Type::DATE => to_date(value)?.to_sql(ty, out),
            Type::TIMESTAMP => to_timestamp(value)?.to_sql(ty, out),
            Type::TIMESTAMPTZ => to_timestamptz(value)?.to_sql(ty, out),
            Type::TIME => to_time(value)?.to_sql(ty, out),
            Type::JSON | Type::JSONB => to_json(value)?.to_sql(ty, out),
            Type::BYTEA => match value {
                SqlValue::Bytes(b) => b.as_slice().to_sql(ty, out),
                other => text_of(other, ty)?.as_bytes().to_sql(ty, out),
            },
            _ if is_textual(ty) => {
                // text-like types share their binary and text encodings
                out.put_slice(text_of(value, ty)?.as_bytes());
                Ok(IsNull::No)
            }
            _ => Err(format!("cannot bind {} to a parameter of type {}", value, ty).into()),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn is_textual(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    ) || matches!(ty.kind(), Kind::Enum(_))
        || ty.name() == "citext"
}

fn text_of(value: &SqlValue, ty: &Type) -> Result<String, BoxError> {
    value
        .as_text()
        .ok_or_else(|| format!("cannot bind {} to a parameter of type {}", value, ty).into())
}

fn mismatch(value: &SqlValue, target: &str) -> BoxError {
    format!("cannot convert {} to {}", value, target).into()
}

fn to_bool(value: &SqlValue) -> Result<bool, BoxError> {
    match value {
        SqlValue::Bool(b) => Ok(*b),
        SqlValue::I64(0) => Ok(false),
        SqlValue::I64(1) => Ok(true),
        SqlValue::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Ok(true),
            "false" | "f" | "no" | "n" | "0" => Ok(false),
            _ => Err(mismatch(value, "boolean")),
        },
        _ => Err(mismatch(value, "boolean")),
    }
}

fn to_i64(value: &SqlValue) -> Result<i64, BoxError> {
    match value {
        SqlValue::I64(i) => Ok(*i),
        SqlValue::Bool(b) => Ok(i64::from(*b)),
        SqlValue::F64(f) if f.fract() == 0.0 && f.is_finite() => Ok(*f as i64),
        SqlValue::Decimal(d) if d.fract().is_zero() => {
            d.to_i64().ok_or_else(|| mismatch(value, "integer"))
        }
        SqlValue::Text(s) => Ok(s.trim().parse::<i64>()?),
        _ => Err(mismatch(value, "integer")),
    }
}

fn to_f64(value: &SqlValue) -> Result<f64, BoxError> {
    match value {
        SqlValue::F64(f) => Ok(*f),
        SqlValue::I64(i) => Ok(*i as f64),
        SqlValue::Decimal(d) => d.to_f64().ok_or_else(|| mismatch(value, "double precision")),
        SqlValue::Text(s) => Ok(s.trim().parse::<f64>()?),
        _ => Err(mismatch(value, "double precision")),
    }
}

fn to_decimal(value: &SqlValue) -> Result<Decimal, BoxError> {
    match value {
        SqlValue::Decimal(d) => Ok(*d),
        SqlValue::I64(i) => Ok(Decimal::from(*i)),
        SqlValue::F64(f) => Ok(Decimal::try_from(*f)?),
        SqlValue::Text(s) => Ok(Decimal::from_str(s.trim())?),
        _ => Err(mismatch(value, "numeric")),
    }
}

fn to_uuid(value: &SqlValue) -> Result<Uuid, BoxError> {
    match value {
        SqlValue::Uuid(u) => Ok(*u),
        SqlValue::Text(s) => Ok(Uuid::parse_str(s.trim())?),
        _ => Err(mismatch(value, "uuid")),
    }
}

fn to_date(value: &SqlValue) -> Result<NaiveDate, BoxError> {
    match value {
        SqlValue::Date(d) => Ok(*d),
        SqlValue::DateTime(dt) => Ok(dt.date()),
        SqlValue::Text(s) => Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?),
        _ => Err(mismatch(value, "date")),
    }
}

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn to_timestamp(value: &SqlValue) -> Result<NaiveDateTime, BoxError> {
    match value {
        SqlValue::DateTime(dt) => Ok(*dt),
        SqlValue::DateTimeOffset(dto) => Ok(dto.naive_utc()),
        SqlValue::Date(d) => d.and_hms_opt(0, 0, 0).ok_or_else(|| mismatch(value, "timestamp")),
        SqlValue::Text(s) => parse_timestamp(s).ok_or_else(|| mismatch(value, "timestamp")),
        _ => Err(mismatch(value, "timestamp")),
    }
}

fn to_timestamptz(value: &SqlValue) -> Result<DateTime<FixedOffset>, BoxError> {
    match value {
        SqlValue::DateTimeOffset(dto) => Ok(*dto),
        SqlValue::Text(s) => {
            let s = s.trim();
            if let Ok(dto) = DateTime::parse_from_rfc3339(s) {
                return Ok(dto);
            }
            if let Ok(dto) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
                return Ok(dto);
            }
            // no offset given: read as UTC
            parse_timestamp(s)
                .map(|naive| naive.and_utc().fixed_offset())
                .ok_or_else(|| mismatch(value, "timestamptz"))
        }
        other => Ok(to_timestamp(other)?.and_utc().fixed_offset()),
    }
}

fn to_time(value: &SqlValue) -> Result<NaiveTime, BoxError> {
    match value {
        SqlValue::Time(t) => Ok(*t),
        SqlValue::DateTime(dt) => Ok(dt.time()),
        SqlValue::Text(s) => Ok(NaiveTime::parse_from_str(s.trim(), "%H:%M:%S%.f")?),
        _ => Err(mismatch(value, "time")),
    }
}

fn to_json(value: &SqlValue) -> Result<serde_json::Value, BoxError> {
    match value {
        SqlValue::Text(s) => Ok(serde_json::from_str(s)?),
        SqlValue::Bool(b) => Ok(serde_json::Value::from(*b)),
        SqlValue::I64(i) => Ok(serde_json::Value::from(*i)),
        SqlValue::F64(f) => Ok(serde_json::Value::from(*f)),
        _ => Err(mismatch(value, "json")),
    }
}
