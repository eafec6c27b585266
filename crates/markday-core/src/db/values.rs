//! Conversions between nullable columns and libSQL values

use libsql::{Row, Value};

use crate::error::{Error, Result};

pub fn text_or_null(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

pub fn real_or_null(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::Real)
}

pub fn optional_text(row: &Row, idx: i32) -> Result<Option<String>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Text(text) => Ok(Some(text)),
        other => Err(Error::Database(format!(
            "expected TEXT in column {idx}, found {other:?}"
        ))),
    }
}

#[allow(clippy::cast_precision_loss)] // SQLite may hand back whole REAL values as INTEGER
pub fn optional_real(row: &Row, idx: i32) -> Result<Option<f64>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Real(value) => Ok(Some(value)),
        Value::Integer(value) => Ok(Some(value as f64)),
        other => Err(Error::Database(format!(
            "expected REAL in column {idx}, found {other:?}"
        ))),
    }
}
