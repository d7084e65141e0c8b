// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Oracle Query Adapter
//!
//! Concrete implementation of `QueryPort` backed by the `oracle` crate.
//!
//! Every column is converted to text according to its Oracle type:
//! timestamps as `YYYY-MM-DD HH:MM:SS.ffffff`, RAW/BLOB as Base64 and all
//! other types through the driver's own string conversion. `NULL` stays `None`.

use crate::domain::entities::Row;
use crate::domain::errors::{ExportError, Result};
use crate::ports::query_port::{QueryPort, RowCursor};
use base64::{engine::general_purpose, Engine as _};
use log::{debug, info};
use oracle::sql_type::{OracleType, Timestamp};
use oracle::{Connection, ResultSet};

/// Rows fetched per round trip when not configured.
pub const DEFAULT_PREFETCH_ROWS: u32 = 5000;

/// An open Oracle connection owned by one export.
pub struct OracleQueryAdapter {
    conn: Connection,
    prefetch_rows: u32,
}

impl OracleQueryAdapter {
    /// Connects to `uri` as `user`.
    pub fn connect(uri: &str, user: &str, password: &str, prefetch_rows: u32) -> Result<Self> {
        let connect_string = normalize_connect_string(uri);
        info!("Connecting to {} as {}", connect_string, user);
        let conn = Connection::connect(user, password, connect_string)
            .map_err(|e| ExportError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn,
            prefetch_rows,
        })
    }
}

impl QueryPort for OracleQueryAdapter {
    fn prepare(&mut self, query: &str) -> Result<Box<dyn RowCursor + '_>> {
        let stmt = self
            .conn
            .statement(query)
            .prefetch_rows(self.prefetch_rows)
            .build()
            .map_err(|e| ExportError::QueryError(e.to_string()))?;

        let rows = stmt
            .into_result_set::<oracle::Row>(&[])
            .map_err(|e| ExportError::QueryError(e.to_string()))?;
        let col_types: Vec<OracleType> = rows
            .column_info()
            .iter()
            .map(|c| c.oracle_type().clone())
            .collect();
        debug!("Query columns: {:?}", col_types);

        Ok(Box::new(OracleCursor { rows, col_types }))
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.conn
            .close()
            .map_err(|e| ExportError::CloseError(e.to_string()))
    }
}

struct OracleCursor<'a> {
    rows: ResultSet<'a, oracle::Row>,
    col_types: Vec<OracleType>,
}

impl RowCursor for OracleCursor<'_> {
    fn column_count(&self) -> usize {
        self.col_types.len()
    }

    fn next_row(&mut self) -> Option<Result<Row>> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(ExportError::QueryError(e.to_string()))),
        };
        let fields = self
            .col_types
            .iter()
            .enumerate()
            .map(|(i, otype)| format_value(&row, i, otype))
            .collect::<Result<Vec<_>>>();
        Some(fields.map(Row::new))
    }
}

/// Accepts `oracle://host:port/service`, `jdbc:oracle:thin:@...` or a plain
/// Easy Connect string.
pub fn normalize_connect_string(uri: &str) -> &str {
    if let Some(rest) = uri.strip_prefix("jdbc:oracle:thin:@") {
        return rest;
    }
    if let Some(rest) = uri.strip_prefix("oracle:") {
        return rest;
    }
    uri
}

fn format_value(row: &oracle::Row, i: usize, otype: &OracleType) -> Result<Option<String>> {
    let query_err = |e: oracle::Error| ExportError::QueryError(e.to_string());
    match otype {
        OracleType::Date
        | OracleType::Timestamp(_)
        | OracleType::TimestampTZ(_)
        | OracleType::TimestampLTZ(_) => {
            let v: Option<Timestamp> = row.get(i).map_err(query_err)?;
            Ok(v.map(|ts| format_timestamp(&ts)))
        }
        OracleType::Raw(_) | OracleType::BLOB => {
            let v: Option<Vec<u8>> = row.get(i).map_err(query_err)?;
            Ok(v.map(|b| general_purpose::STANDARD.encode(b)))
        }
        _ => row.get::<usize, Option<String>>(i).map_err(query_err),
    }
}

fn format_timestamp(ts: &Timestamp) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}",
        ts.year(),
        ts.month(),
        ts.day(),
        ts.hour(),
        ts.minute(),
        ts.second(),
        ts.nanosecond() / 1000
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_connect_string() {
        assert_eq!(normalize_connect_string("oracle://db:1521/ORCL"), "//db:1521/ORCL");
        assert_eq!(
            normalize_connect_string("jdbc:oracle:thin:@//db:1521/ORCL"),
            "//db:1521/ORCL"
        );
        assert_eq!(normalize_connect_string("db:1521/ORCL"), "db:1521/ORCL");
    }

    #[test]
    fn test_format_timestamp() {
        let ts = Timestamp::new(2023, 10, 27, 14, 30, 45, 123456000).unwrap();
        assert_eq!(format_timestamp(&ts), "2023-10-27 14:30:45.123456");

        let ts2 = Timestamp::new(2023, 1, 1, 0, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(&ts2), "2023-01-01 00:00:00.000000");
    }
}
