//! Type conversion between `Value` and PostgreSQL wire values.
//!
//! Result cells are read as raw bytes first (`RawCell` accepts every type),
//! then decoded eagerly when the base type is one the driver understands.
//! Anything else stays as `Value::Bytes` for the dialect to resolve later.

use std::error::Error;

use bytes::BytesMut;
use chrono::{DateTime, NaiveDateTime, Utc};
use postgres::types::{FromSql, IsNull, Kind, ToSql, Type, to_sql_checked};

use crate::db::{ScanType, Value};

type BoxError = Box<dyn Error + Sync + Send>;

/// A cell as it came off the wire.
pub struct RawCell<'a>(pub Option<&'a [u8]>);

impl<'a> FromSql<'a> for RawCell<'a> {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        Ok(RawCell(Some(raw)))
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(RawCell(None))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

/// The type a domain is declared over, or `ty` itself.
pub fn base_type(ty: &Type) -> &Type {
    match ty.kind() {
        Kind::Domain(inner) => base_type(inner),
        _ => ty,
    }
}

/// Scan type a column of `ty` decodes into.
pub fn scan_type(ty: &Type) -> ScanType {
    match *base_type(ty) {
        Type::BOOL => ScanType::Bool,
        Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => ScanType::Int,
        Type::FLOAT4 | Type::FLOAT8 => ScanType::Float,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => ScanType::Text,
        Type::TIMESTAMP | Type::TIMESTAMPTZ => ScanType::Time,
        _ => ScanType::Bytes,
    }
}

/// Decode a raw cell of type `ty`.
///
/// Types without an eager decoding, and cells whose decoding fails, are kept
/// as bytes.
pub fn decode_cell(ty: &Type, cell: RawCell<'_>) -> Value {
    let Some(raw) = cell.0 else {
        return Value::Null;
    };
    let base = base_type(ty);
    decode_known(base, raw).unwrap_or_else(|| Value::Bytes(raw.to_vec()))
}

fn decode_known(ty: &Type, raw: &[u8]) -> Option<Value> {
    let value = match *ty {
        Type::BOOL => Value::Bool(bool::from_sql(ty, raw).ok()?),
        Type::INT2 => Value::Int(i64::from(i16::from_sql(ty, raw).ok()?)),
        Type::INT4 => Value::Int(i64::from(i32::from_sql(ty, raw).ok()?)),
        Type::INT8 => Value::Int(i64::from_sql(ty, raw).ok()?),
        Type::OID => Value::Int(i64::from(u32::from_sql(ty, raw).ok()?)),
        Type::FLOAT4 => Value::Float(f64::from(f32::from_sql(ty, raw).ok()?)),
        Type::FLOAT8 => Value::Float(f64::from_sql(ty, raw).ok()?),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            Value::Str(<&str>::from_sql(ty, raw).ok()?.to_string())
        }
        Type::TIMESTAMP => {
            let naive = NaiveDateTime::from_sql(ty, raw).ok()?;
            Value::Time(naive.and_utc().fixed_offset())
        }
        Type::TIMESTAMPTZ => Value::Time(DateTime::<Utc>::from_sql(ty, raw).ok()?.fixed_offset()),
        _ => return None,
    };
    Some(value)
}

impl ToSql for Value {
    /// Encode for the server-declared parameter type.
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => b.to_sql(ty, out),
            Value::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                Type::OID => u32::try_from(*i)?.to_sql(ty, out),
                Type::FLOAT4 => (*i as f32).to_sql(ty, out),
                Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
                    i.to_string().to_sql(ty, out)
                }
                _ => i.to_sql(ty, out),
            },
            Value::Float(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                Type::TEXT | Type::VARCHAR => f.to_string().to_sql(ty, out),
                _ => f.to_sql(ty, out),
            },
            Value::Str(s) => match *ty {
                Type::JSON | Type::JSONB => {
                    serde_json::from_str::<serde_json::Value>(s)?.to_sql(ty, out)
                }
                _ => s.as_str().to_sql(ty, out),
            },
            Value::Bytes(b) => b.as_slice().to_sql(ty, out),
            Value::Time(t) => match *ty {
                Type::TIMESTAMP => t.naive_utc().to_sql(ty, out),
                _ => t.to_sql(ty, out),
            },
            Value::Json(j) => j.to_sql(ty, out),
            Value::List(_) => Err(format!("list values cannot be bound to {}", ty.name()).into()),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}
