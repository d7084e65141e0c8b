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

//! # Query Port
//!
//! This Port defines what it means to "run a query" against a database. It
//! doesn't care IF the database is Oracle or a Mock for testing: anything
//! that implements `QueryPort` can feed the pipeline.

use crate::domain::entities::Row;
use crate::domain::errors::Result;

/// An open, read-only database connection.
pub trait QueryPort {
    /// Prepares and executes `query`, returning a cursor over its rows.
    ///
    /// Fails with `ExportError::QueryError` when the statement cannot be
    /// prepared or executed.
    fn prepare(&mut self, query: &str) -> Result<Box<dyn RowCursor + '_>>;

    /// Closes the connection. Every cursor must be dropped first.
    fn close(self: Box<Self>) -> Result<()>;
}

/// A forward-only cursor over a result set.
pub trait RowCursor {
    /// Number of columns reported by the query.
    fn column_count(&self) -> usize;

    /// Fetches the next row; `None` at the end of the result set.
    fn next_row(&mut self) -> Option<Result<Row>>;
}
