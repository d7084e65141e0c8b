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

//! # Row Source
//!
//! `RowSource` executes the export query and hands out rows one at a time.
//! It is a plain `Iterator`: the coordinator pulls the next row only after
//! the previous one has been written, so at most one row is in memory.
//!
//! The stream is finite and not restartable. After the last row, or after
//! the first error, it keeps returning `None`.

use crate::domain::entities::Row;
use crate::domain::errors::{ExportError, Result};
use crate::ports::query_port::{QueryPort, RowCursor};
use log::{debug, info, warn};

pub struct RowSource<'conn> {
    cursor: Box<dyn RowCursor + 'conn>,
    column_count: usize,
    rows_read: u64,
    finished: bool,
}

impl<'conn> RowSource<'conn> {
    /// Executes `query` on `connection`.
    pub fn open(connection: &'conn mut dyn QueryPort, query: &str) -> Result<Self> {
        debug!("Executing query: {}", query);
        let cursor = connection.prepare(query)?;
        let column_count = cursor.column_count();
        info!("Started reading ({} columns)", column_count);

        Ok(Self {
            cursor,
            column_count,
            rows_read: 0,
            finished: false,
        })
    }

    /// Rows produced so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

impl Iterator for RowSource<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.cursor.next_row() {
            None => {
                self.finish();
                info!("Done reading ({} rows)", self.rows_read);
                None
            }
            Some(Ok(row)) if row.field_count() != self.column_count => {
                self.finish();
                warn!(
                    "Row {} has {} fields, query reported {} columns",
                    self.rows_read + 1,
                    row.field_count(),
                    self.column_count
                );
                Some(Err(ExportError::QueryError(format!(
                    "row {} has {} fields, expected {}",
                    self.rows_read + 1,
                    row.field_count(),
                    self.column_count
                ))))
            }
            Some(Ok(row)) => {
                self.rows_read += 1;
                Some(Ok(row))
            }
            Some(Err(e)) => {
                self.finish();
                warn!("Exception while reading: {}", e);
                Some(Err(into_query_error(e)))
            }
        }
    }
}

/// Fetch failures always surface as `QueryError`.
fn into_query_error(e: ExportError) -> ExportError {
    match e {
        ExportError::QueryError(_) => e,
        other => ExportError::QueryError(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_doubles::{row, MockConnection};

    #[test]
    fn test_reads_rows_in_cursor_order() {
        let mut conn = MockConnection::with_rows(
            2,
            vec![row(&[Some("1"), Some("a")]), row(&[Some("2"), None])],
        );
        let source = RowSource::open(&mut conn, "SELECT id, name FROM t").unwrap();
        assert_eq!(source.column_count, 2);

        let rows: Vec<Row> = source.map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fields[0].as_deref(), Some("1"));
        assert_eq!(rows[1].fields[1], None);
        assert_eq!(conn.queries(), vec!["SELECT id, name FROM t".to_string()]);
    }

    #[test]
    fn test_prepare_failure_is_query_error() {
        let mut conn = MockConnection::failing_prepare("ORA-00942: table or view does not exist");
        let err = RowSource::open(&mut conn, "SELECT * FROM missing").err().unwrap();
        assert!(matches!(err, ExportError::QueryError(_)));
    }

    #[test]
    fn test_stream_stops_after_fetch_error() {
        let mut conn = MockConnection::with_rows(1, vec![row(&[Some("1")]), row(&[Some("2")])])
            .fail_after(1);
        let mut source = RowSource::open(&mut conn, "SELECT id FROM t").unwrap();

        assert!(source.next().unwrap().is_ok());
        let err = source.next().unwrap().unwrap_err();
        assert!(matches!(err, ExportError::QueryError(_)));
        assert!(source.finished);
        assert!(source.next().is_none());
        assert_eq!(source.rows_read(), 1);
    }

    #[test]
    fn test_not_restartable() {
        let mut conn = MockConnection::with_rows(1, vec![row(&[Some("only")])]);
        let mut source = RowSource::open(&mut conn, "SELECT x FROM t").unwrap();

        assert!(source.next().is_some());
        assert!(source.next().is_none());
        assert!(source.next().is_none());
        assert_eq!(source.rows_read(), 1);
    }

    #[test]
    fn test_field_count_mismatch_ends_stream() {
        let mut conn = MockConnection::with_rows(2, vec![row(&[Some("1")])]);
        let mut source = RowSource::open(&mut conn, "SELECT a, b FROM t").unwrap();

        assert!(matches!(source.next(), Some(Err(ExportError::QueryError(_)))));
        assert!(source.next().is_none());
        assert_eq!(source.rows_read(), 0);
    }

    #[test]
    fn test_empty_result() {
        let mut conn = MockConnection::with_rows(3, vec![]);
        let mut source = RowSource::open(&mut conn, "SELECT a, b, c FROM t").unwrap();
        assert!(source.next().is_none());
        assert!(source.finished);
    }
}
