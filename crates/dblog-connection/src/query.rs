//! Convenience queries on top of [`Connection`]
//!
//! Thin helpers that run one statement and reduce the result to the shape a
//! caller asked for. Parameters go to the driver untouched.

use async_trait::async_trait;
use dblog_core::{Connection, DblogError, QueryResult, Result, Row, Value};

/// Scalar, row and table reads for any connection, pooled or not
#[async_trait]
pub trait QueryExt: Connection {
    /// Run a statement and return the number of affected rows
    async fn execute_query(&self, sql: &str, params: &[Value]) -> Result<u64> {
        Ok(self.execute(sql, params).await?.affected_rows)
    }

    /// Run a query and return every row
    async fn read_table(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        self.query(sql, params).await
    }

    /// First row of the result, if there is one
    async fn read_row(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        Ok(self.query(sql, params).await?.rows.into_iter().next())
    }

    /// First column of the first row as a string
    async fn read_string(&self, sql: &str, params: &[Value]) -> Result<String> {
        let value = first_value(self.read_row(sql, params).await?, sql)?;
        match value {
            Value::Null => Err(DblogError::Query(format!("`{}` returned NULL", sql))),
            Value::String(s) => Ok(s),
            other => Ok(other.to_string()),
        }
    }

    /// First column of the first row as an `i32`
    async fn read_i32(&self, sql: &str, params: &[Value]) -> Result<i32> {
        let value = first_value(self.read_row(sql, params).await?, sql)?;
        value
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| {
                DblogError::Query(format!("`{}` returned a non-integer value: {}", sql, value))
            })
    }
}

impl<T: Connection + ?Sized> QueryExt for T {}

fn first_value(row: Option<Row>, sql: &str) -> Result<Value> {
    row.and_then(|row| row.values.into_iter().next())
        .ok_or_else(|| DblogError::Query(format!("`{}` returned no rows", sql)))
}
