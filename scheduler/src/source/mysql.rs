use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use db::dtos::ConnectionParams;
use sqlx::mysql::{MySqlConnectOptions, MySqlRow};
use sqlx::{Column, Connection, MySqlConnection, Row as _, TypeInfo};
use tracing::warn;

use super::SourceError;
use crate::value::{Row, Value};

const DEFAULT_PORT: u16 = 3306;

pub(super) async fn fetch_rows(
    params: &ConnectionParams,
    query: &str,
) -> Result<Vec<Row>, SourceError> {
    let mut options = MySqlConnectOptions::new()
        .host(&params.host)
        .port(params.port.unwrap_or(DEFAULT_PORT))
        .username(&params.user)
        .database(&params.database);

    if let Some(password) = &params.password {
        options = options.password(password);
    }

    let mut connection = MySqlConnection::connect_with(&options).await?;
    let rows = sqlx::query(query).fetch_all(&mut connection).await;

    if let Err(error) = connection.close().await {
        warn!("Failed to close source connection: {error:?}");
    }

    Ok(rows?.iter().map(decode_row).collect())
}

fn decode_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .map(|column| {
            let value = decode_column(row, column.ordinal(), column.type_info().name());
            (column.name().to_string(), value)
        })
        .collect()
}

fn decode_column(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    let decoded = match type_name {
        "BOOLEAN" => row.try_get::<Option<bool>, _>(index).map(Value::from),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<Option<i64>, _>(index).map(Value::from)
        }
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row.try_get::<Option<u64>, _>(index).map(|int| match int {
            Some(int) => i64::try_from(int).map_or_else(|_| Value::Text(int.to_string()), Value::Int),
            None => Value::Null,
        }),
        "FLOAT" => row
            .try_get::<Option<f32>, _>(index)
            .map(|float| Value::from(float.map(f64::from))),
        "DOUBLE" => row.try_get::<Option<f64>, _>(index).map(Value::from),
        "DECIMAL" => row.try_get::<Option<BigDecimal>, _>(index).map(Value::from),
        "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET" => {
            row.try_get::<Option<String>, _>(index).map(Value::from)
        }
        "DATE" => row.try_get::<Option<NaiveDate>, _>(index).map(Value::from),
        "DATETIME" => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .map(Value::from),
        "TIMESTAMP" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)
            .map(|datetime| datetime.map_or(Value::Null, |dt| Value::DateTimeTz(dt.fixed_offset()))),
        "JSON" => row
            .try_get::<Option<serde_json::Value>, _>(index)
            .map(|json| Value::from(json.map(|json| json.to_string()))),
        other => {
            warn!("Unsupported MySQL column type {other}, reading as NULL");
            return Value::Null;
        }
    };

    decoded.unwrap_or_else(|error| {
        warn!("Failed to decode {type_name} column {index}: {error:?}");
        Value::Null
    })
}
