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

//! # MySQL Query Adapter
//!
//! `QueryPort` backed by the synchronous `mysql` crate. Rows are streamed
//! from the server over the text protocol, one at a time.
//!
//! Binary columns (BLOB, BINARY, VARBINARY) are Base64 encoded, dates and
//! times use `YYYY-MM-DD HH:MM:SS.ffffff`, everything else is the server's
//! text rendering. `NULL` stays `None`.

use crate::domain::entities::Row;
use crate::domain::errors::{ExportError, Result};
use crate::ports::query_port::{QueryPort, RowCursor};
use base64::{engine::general_purpose, Engine as _};
use log::{debug, info};
use mysql::consts::ColumnType;
use mysql::prelude::Queryable;
use mysql::{Conn, Opts, OptsBuilder, QueryResult, Text, Value};

/// Character set id MySQL reports for binary data.
const BINARY_CHARSET: u16 = 63;

/// An open MySQL connection owned by one export.
pub struct MysqlQueryAdapter {
    conn: Conn,
}

impl MysqlQueryAdapter {
    /// Connects to a `mysql://host:port/db` or `jdbc:mysql://...` URI as `user`.
    pub fn connect(uri: &str, user: &str, password: &str) -> Result<Self> {
        let url = normalize_url(uri);
        let opts = Opts::from_url(url)
            .map_err(|e| ExportError::ConnectionError(format!("invalid MySQL URL: {}", e)))?;
        info!("Connecting to {} as {}", url, user);
        let opts = OptsBuilder::from_opts(opts)
            .user(Some(user))
            .pass(Some(password));
        let conn = Conn::new(opts).map_err(|e| ExportError::ConnectionError(e.to_string()))?;
        Ok(Self { conn })
    }
}

impl QueryPort for MysqlQueryAdapter {
    fn prepare(&mut self, query: &str) -> Result<Box<dyn RowCursor + '_>> {
        let result = self
            .conn
            .query_iter(query)
            .map_err(|e| ExportError::QueryError(e.to_string()))?;
        let binary: Vec<bool> = result
            .columns()
            .as_ref()
            .iter()
            .map(|c| is_binary(c.column_type(), c.character_set()))
            .collect();
        debug!("Query returned {} columns", binary.len());

        Ok(Box::new(MysqlCursor { result, binary }))
    }

    /// The connection says goodbye to the server when dropped.
    fn close(self: Box<Self>) -> Result<()> {
        drop(self.conn);
        Ok(())
    }
}

struct MysqlCursor<'a> {
    result: QueryResult<'a, 'a, 'a, Text>,
    binary: Vec<bool>,
}

impl RowCursor for MysqlCursor<'_> {
    fn column_count(&self) -> usize {
        self.binary.len()
    }

    fn next_row(&mut self) -> Option<Result<Row>> {
        let row = match self.result.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(ExportError::QueryError(e.to_string()))),
        };
        let fields = (0..row.len())
            .map(|i| {
                let binary = self.binary.get(i).copied().unwrap_or(false);
                row.as_ref(i).and_then(|v| format_value(v, binary))
            })
            .collect();
        Some(Ok(Row::new(fields)))
    }
}

/// Drops the `jdbc:` prefix and any JDBC-only query parameters.
pub fn normalize_url(uri: &str) -> &str {
    match uri.strip_prefix("jdbc:") {
        Some(rest) => rest.split('?').next().unwrap_or(rest),
        None => uri,
    }
}

fn is_binary(column_type: ColumnType, charset: u16) -> bool {
    charset == BINARY_CHARSET
        && matches!(
            column_type,
            ColumnType::MYSQL_TYPE_TINY_BLOB
                | ColumnType::MYSQL_TYPE_MEDIUM_BLOB
                | ColumnType::MYSQL_TYPE_LONG_BLOB
                | ColumnType::MYSQL_TYPE_BLOB
                | ColumnType::MYSQL_TYPE_VAR_STRING
                | ColumnType::MYSQL_TYPE_VARCHAR
                | ColumnType::MYSQL_TYPE_STRING
        )
}

fn format_value(value: &Value, binary: bool) -> Option<String> {
    match value {
        Value::NULL => None,
        Value::Bytes(bytes) if binary => Some(general_purpose::STANDARD.encode(bytes)),
        Value::Bytes(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Value::Int(v) => Some(v.to_string()),
        Value::UInt(v) => Some(v.to_string()),
        Value::Float(v) => Some(v.to_string()),
        Value::Double(v) => Some(v.to_string()),
        Value::Date(year, month, day, hour, minute, second, micros) => Some(format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}",
            year, month, day, hour, minute, second, micros
        )),
        Value::Time(negative, days, hours, minutes, seconds, micros) => Some(format!(
            "{}{:02}:{:02}:{:02}.{:06}",
            if *negative { "-" } else { "" },
            u32::from(*hours) + days * 24,
            minutes,
            seconds,
            micros
        )),
    }
}
