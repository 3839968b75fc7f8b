use sqlx::postgres::{PgArguments, PgRow, PgTypeInfo};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row, TypeInfo};

use tabula_core::{Error, Result, Value};

/// Postgres type declared for a bound parameter.
///
/// NULL has no type of its own; INT8 lets the server cast it into any column.
pub(crate) fn parameter_type(value: &Value) -> PgTypeInfo {
    match value {
        Value::Null | Value::Integer(_) => PgTypeInfo::with_name("INT8"),
        Value::Float(_) => PgTypeInfo::with_name("FLOAT8"),
        Value::Text(_) => PgTypeInfo::with_name("TEXT"),
    }
}

pub(crate) fn bind_all<'q>(
    query: Query<'q, Postgres, PgArguments>,
    params: &[Value],
) -> Query<'q, Postgres, PgArguments> {
    params.iter().fold(query, |query, value| match value {
        Value::Null => query.bind(Option::<i64>::None),
        Value::Integer(number) => query.bind(*number),
        Value::Float(number) => query.bind(*number),
        Value::Text(text) => query.bind(text.clone()),
    })
}

pub(crate) fn decode_row(row: &PgRow) -> Result<Vec<Value>> {
    (0..row.len()).map(|index| decode_value(row, index)).collect()
}

fn decode_value(row: &PgRow, index: usize) -> Result<Value> {
    let column = row.column(index);
    let decoded = match column.type_info().name() {
        "INT2" => row
            .try_get::<Option<i16>, _>(index)
            .map(|value| value.map(|n| Value::Integer(n.into()))),
        "INT4" => row
            .try_get::<Option<i32>, _>(index)
            .map(|value| value.map(|n| Value::Integer(n.into()))),
        "INT8" => row
            .try_get::<Option<i64>, _>(index)
            .map(|value| value.map(Value::Integer)),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)
            .map(|value| value.map(|n| Value::Float(n.into()))),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(index)
            .map(|value| value.map(Value::Float)),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => row
            .try_get::<Option<String>, _>(index)
            .map(|value| value.map(Value::Text)),
        other => {
            return Err(Error::Statement(format!(
                "column `{}` has unsupported type {other}",
                column.name()
            )));
        }
    };

    decoded
        .map(|value| value.unwrap_or(Value::Null))
        .map_err(|err| Error::Statement(err.to_string()))
}
