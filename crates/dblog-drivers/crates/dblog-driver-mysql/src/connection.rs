//! MySQL connection implementation

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use dblog_core::{ColumnMeta, Connection, DblogError, QueryResult, Result, Row, StatementResult, Value};
use mysql_async::consts::ColumnType;
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, Row as MySqlRow};
use tokio::sync::Mutex;

use crate::literal::bind_params;

/// A single MySQL session
///
/// Pooling is done by the caller, so this wraps exactly one server
/// connection rather than a `mysql_async` pool.
pub struct MySqlConnection {
    conn: Mutex<Option<Conn>>,
    closed: AtomicBool,
    database: String,
}

impl MySqlConnection {
    /// Open a session with the given options
    pub async fn connect(opts: Opts, database: &str) -> Result<Self> {
        tracing::debug!(host = %opts.ip_or_hostname(), port = opts.tcp_port(), database, "connecting to MySQL database");

        let conn = Conn::new(opts)
            .await
            .map_err(|e| DblogError::Connection(format!("Failed to connect to MySQL: {}", e)))?;

        tracing::info!(connection_id = conn.id(), database, "MySQL connection established");
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            closed: AtomicBool::new(false),
            database: database.to_string(),
        })
    }

    /// Database selected at connect time
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Record a failure that leaves the session unusable so the pool
    /// reopens it on the next acquire.
    fn query_error(&self, context: &str, err: mysql_async::Error) -> DblogError {
        if matches!(err, mysql_async::Error::Io(_) | mysql_async::Error::Driver(_)) {
            tracing::warn!(error = %err, "MySQL session lost");
            self.closed.store(true, Ordering::SeqCst);
            return DblogError::Connection(format!("{}: {}", context, err));
        }
        DblogError::Query(format!("{}: {}", context, err))
    }
}

/// Convert a mysql_async value, using the column type to interpret byte
/// strings from the text protocol.
fn mysql_value_to_value(val: mysql_async::Value, col_type: ColumnType) -> Value {
    match val {
        mysql_async::Value::NULL => Value::Null,
        mysql_async::Value::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(s) => match col_type {
                ColumnType::MYSQL_TYPE_TINY
                | ColumnType::MYSQL_TYPE_SHORT
                | ColumnType::MYSQL_TYPE_LONG
                | ColumnType::MYSQL_TYPE_LONGLONG
                | ColumnType::MYSQL_TYPE_INT24
                | ColumnType::MYSQL_TYPE_YEAR => {
                    s.parse::<i64>().map(Value::Int64).unwrap_or(Value::String(s))
                }
                ColumnType::MYSQL_TYPE_FLOAT | ColumnType::MYSQL_TYPE_DOUBLE => {
                    s.parse::<f64>().map(Value::Float64).unwrap_or(Value::String(s))
                }
                ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => {
                    Value::Decimal(s)
                }
                _ => Value::String(s),
            },
            Err(e) => Value::Bytes(e.into_bytes()),
        },
        mysql_async::Value::Int(i) => Value::Int64(i),
        mysql_async::Value::UInt(u) => i64::try_from(u)
            .map(Value::Int64)
            .unwrap_or_else(|_| Value::Decimal(u.to_string())),
        mysql_async::Value::Float(f) => Value::Float64(f as f64),
        mysql_async::Value::Double(d) => Value::Float64(d),
        mysql_async::Value::Date(year, month, day, hour, min, sec, micro) => {
            let date = chrono::NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32);
            if hour == 0 && min == 0 && sec == 0 && micro == 0 {
                date.map(Value::Date).unwrap_or_else(|| {
                    Value::String(format!("{:04}-{:02}-{:02}", year, month, day))
                })
            } else {
                date.and_then(|d| d.and_hms_micro_opt(hour as u32, min as u32, sec as u32, micro))
                    .map(Value::DateTime)
                    .unwrap_or_else(|| {
                        Value::String(format!(
                            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                            year, month, day, hour, min, sec
                        ))
                    })
            }
        }
        mysql_async::Value::Time(negative, days, hours, mins, secs, micros) => {
            let time = (!negative && days == 0)
                .then(|| {
                    chrono::NaiveTime::from_hms_micro_opt(
                        hours as u32,
                        mins as u32,
                        secs as u32,
                        micros,
                    )
                })
                .flatten();
            time.map(Value::Time).unwrap_or_else(|| {
                let total_hours = days * 24 + hours as u32;
                let sign = if negative { "-" } else { "" };
                Value::String(format!(
                    "{}{:02}:{:02}:{:02}.{:06}",
                    sign, total_hours, mins, secs, micros
                ))
            })
        }
    }
}

#[async_trait]
impl Connection for MySqlConnection {
    fn driver_name(&self) -> &str {
        "mysql"
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        let final_sql = bind_params(sql, params)?;

        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| DblogError::Connection("MySQL connection is closed".into()))?;

        conn.query_drop(final_sql.as_str())
            .await
            .map_err(|e| self.query_error("Failed to execute statement", e))?;

        let result = StatementResult {
            affected_rows: conn.affected_rows(),
            last_insert_id: conn.last_insert_id(),
        };
        tracing::debug!(affected_rows = result.affected_rows, "statement executed");
        Ok(result)
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let final_sql = bind_params(sql, params)?;
        let start_time = Instant::now();

        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| DblogError::Connection("MySQL connection is closed".into()))?;

        let mysql_rows: Vec<MySqlRow> = conn
            .query(final_sql.as_str())
            .await
            .map_err(|e| self.query_error("Failed to execute query", e))?;
        drop(guard);

        let mut columns = Vec::new();
        let mut column_names = Vec::new();
        let mut column_types = Vec::new();
        if let Some(first_row) = mysql_rows.first() {
            for (idx, col) in first_row.columns_ref().iter().enumerate() {
                let name = col.name_str().to_string();
                column_names.push(name.clone());
                column_types.push(col.column_type());
                columns.push(ColumnMeta {
                    name,
                    data_type: format!("{:?}", col.column_type()),
                    ordinal: idx,
                });
            }
        }

        let rows: Vec<Row> = mysql_rows
            .into_iter()
            .map(|mysql_row| {
                let values = column_types
                    .iter()
                    .enumerate()
                    .map(|(idx, col_type)| {
                        let val: mysql_async::Value =
                            mysql_row.get(idx).unwrap_or(mysql_async::Value::NULL);
                        mysql_value_to_value(val, *col_type)
                    })
                    .collect();
                Row::new(column_names.clone(), values)
            })
            .collect();

        let execution_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::debug!(
            row_count = rows.len(),
            execution_time_ms,
            "query executed successfully"
        );

        Ok(QueryResult {
            columns,
            rows,
            affected_rows: 0,
            execution_time_ms,
        })
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        let conn = self.conn.lock().await.take();
        if let Some(conn) = conn {
            tracing::debug!(connection_id = conn.id(), "closing MySQL connection");
            conn.disconnect().await.map_err(|e| {
                DblogError::Connection(format!("Failed to close MySQL connection: {}", e))
            })?;
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_protocol_conversion() {
        let bytes = |s: &str| mysql_async::Value::Bytes(s.as_bytes().to_vec());

        assert_eq!(
            mysql_value_to_value(bytes("42"), ColumnType::MYSQL_TYPE_LONG),
            Value::Int64(42)
        );
        assert_eq!(
            mysql_value_to_value(bytes("1.50"), ColumnType::MYSQL_TYPE_NEWDECIMAL),
            Value::Decimal("1.50".into())
        );
        assert_eq!(
            mysql_value_to_value(bytes("Warning"), ColumnType::MYSQL_TYPE_VAR_STRING),
            Value::String("Warning".into())
        );
        assert_eq!(
            mysql_value_to_value(
                mysql_async::Value::Bytes(vec![0xff, 0xfe]),
                ColumnType::MYSQL_TYPE_BLOB
            ),
            Value::Bytes(vec![0xff, 0xfe])
        );
    }

    #[test]
    fn test_binary_protocol_conversion() {
        assert_eq!(
            mysql_value_to_value(mysql_async::Value::UInt(u64::MAX), ColumnType::MYSQL_TYPE_LONGLONG),
            Value::Decimal(u64::MAX.to_string())
        );
        assert_eq!(
            mysql_value_to_value(
                mysql_async::Value::Date(2024, 3, 9, 0, 0, 0, 0),
                ColumnType::MYSQL_TYPE_DATE
            ),
            Value::Date(chrono::NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())
        );
        assert!(matches!(
            mysql_value_to_value(
                mysql_async::Value::Date(2024, 3, 9, 13, 5, 1, 0),
                ColumnType::MYSQL_TYPE_DATETIME
            ),
            Value::DateTime(_)
        ));
        assert_eq!(
            mysql_value_to_value(
                mysql_async::Value::Time(true, 1, 2, 3, 4, 0),
                ColumnType::MYSQL_TYPE_TIME
            ),
            Value::String("-26:03:04.000000".into())
        );
    }
}
