use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use db::dtos::ConnectionParams;
use sqlx::postgres::{PgConnectOptions, PgRow};
use sqlx::{Column, Connection, PgConnection, Row as _, TypeInfo};
use tracing::warn;
use uuid::Uuid;

use super::SourceError;
use crate::value::{Row, Value};

const DEFAULT_PORT: u16 = 5432;

pub(super) async fn fetch_rows(
    params: &ConnectionParams,
    query: &str,
) -> Result<Vec<Row>, SourceError> {
    let mut options = PgConnectOptions::new()
        .host(&params.host)
        .port(params.port.unwrap_or(DEFAULT_PORT))
        .username(&params.user)
        .database(&params.database);

    if let Some(password) = &params.password {
        options = options.password(password);
    }

    let mut connection = PgConnection::connect_with(&options).await?;
    let rows = sqlx::query(query).fetch_all(&mut connection).await;

    if let Err(error) = connection.close().await {
        warn!("Failed to close source connection: {error:?}");
    }

    Ok(rows?.iter().map(decode_row).collect())
}

fn decode_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .map(|column| {
            let value = decode_column(row, column.ordinal(), column.type_info().name());
            (column.name().to_string(), value)
        })
        .collect()
}

/// How a PostgreSQL column is read, keyed by the server's type name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Decoder {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    Text,
    Date,
    Timestamp,
    TimestampTz,
    Uuid,
    Json,
}

fn decoder_for(type_name: &str) -> Option<Decoder> {
    let decoder = match type_name {
        "BOOL" => Decoder::Bool,
        "INT2" => Decoder::Int2,
        "INT4" => Decoder::Int4,
        "INT8" => Decoder::Int8,
        "FLOAT4" => Decoder::Float4,
        "FLOAT8" => Decoder::Float8,
        "NUMERIC" => Decoder::Numeric,
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" | "\"CHAR\"" | "CITEXT" => Decoder::Text,
        "DATE" => Decoder::Date,
        "TIMESTAMP" => Decoder::Timestamp,
        "TIMESTAMPTZ" => Decoder::TimestampTz,
        "UUID" => Decoder::Uuid,
        "JSON" | "JSONB" => Decoder::Json,
        _ => return None,
    };

    Some(decoder)
}

fn decode_column(row: &PgRow, index: usize, type_name: &str) -> Value {
    let Some(decoder) = decoder_for(type_name) else {
        warn!("Unsupported PostgreSQL column type {type_name}, reading as NULL");
        return Value::Null;
    };

    let decoded = match decoder {
        Decoder::Bool => row.try_get::<Option<bool>, _>(index).map(Value::from),
        Decoder::Int2 => row
            .try_get::<Option<i16>, _>(index)
            .map(|int| Value::from(int.map(i64::from))),
        Decoder::Int4 => row
            .try_get::<Option<i32>, _>(index)
            .map(|int| Value::from(int.map(i64::from))),
        Decoder::Int8 => row.try_get::<Option<i64>, _>(index).map(Value::from),
        Decoder::Float4 => row
            .try_get::<Option<f32>, _>(index)
            .map(|float| Value::from(float.map(f64::from))),
        Decoder::Float8 => row.try_get::<Option<f64>, _>(index).map(Value::from),
        Decoder::Numeric => row.try_get::<Option<BigDecimal>, _>(index).map(Value::from),
        Decoder::Text => row.try_get::<Option<String>, _>(index).map(Value::from),
        Decoder::Date => row.try_get::<Option<NaiveDate>, _>(index).map(Value::from),
        Decoder::Timestamp => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .map(Value::from),
        Decoder::TimestampTz => row
            .try_get::<Option<DateTime<Utc>>, _>(index)
            .map(|datetime| datetime.map_or(Value::Null, |dt| Value::DateTimeTz(dt.fixed_offset()))),
        Decoder::Uuid => row
            .try_get::<Option<Uuid>, _>(index)
            .map(|uuid| Value::from(uuid.map(|uuid| uuid.to_string()))),
        Decoder::Json => row
            .try_get::<Option<serde_json::Value>, _>(index)
            .map(|json| Value::from(json.map(|json| json.to_string()))),
    };

    decoded.unwrap_or_else(|error| {
        warn!("Failed to decode {type_name} column {index}: {error:?}");
        Value::Null
    })
}
