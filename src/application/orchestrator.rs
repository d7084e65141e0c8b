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

//! # Export Pipeline
//!
//! The coordinator that wires `RowSource` -> `row_to_line` -> `RowSink` and
//! drives the loop until the result set is exhausted or the query fails.
//!
//! ## Lifecycle
//! `Idle` -> `Running` -> `Completed` | `Failed`
//!
//! The connection and the sink are owned by a `Resources` guard. Both are
//! closed exactly once, sink first, whichever way the run ends. If the guard
//! is dropped without an explicit release (a panic inside the loop), `Drop`
//! closes whatever is still open.

use crate::domain::entities::{AccessPolicy, PipelineState, RunSummary};
use crate::domain::errors::{ExportError, Result};
use crate::domain::mapping::row_to_line;
use crate::domain::run_stats::RunStats;
use crate::application::row_sink::{Accepted, RowSink};
use crate::application::row_source::RowSource;
use crate::ports::query_port::QueryPort;
use crate::ports::storage_port::StoragePort;
use log::{debug, error, info, warn};
use std::sync::Arc;

/// Everything the pipeline needs to know about one export.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub query: String,
    pub bucket: String,
    pub path: String,
    pub separator: String,
    pub access_policy: AccessPolicy,
}

/// Single-use coordinator for one query, one destination, one pass.
pub struct ExportPipeline {
    settings: PipelineSettings,
    connection: Option<Box<dyn QueryPort>>,
    storage: Arc<dyn StoragePort>,
    state: PipelineState,
}

impl ExportPipeline {
    pub fn new(
        settings: PipelineSettings,
        connection: Box<dyn QueryPort>,
        storage: Arc<dyn StoragePort>,
    ) -> Self {
        Self {
            settings,
            connection: Some(connection),
            storage,
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Runs the export.
    ///
    /// Returns the summary on `Completed`. A query failure returns the
    /// `QueryError` after cleanup; a failure to close the sink or the
    /// connection after a complete stream returns `CloseError`.
    pub fn run(&mut self) -> Result<RunSummary> {
        let connection = match (self.state, self.connection.take()) {
            (PipelineState::Idle, Some(connection)) => connection,
            (state, _) => {
                return Err(ExportError::PipelineError(format!(
                    "pipeline is single-use and already {}",
                    state
                )))
            }
        };

        let stats = Arc::new(RunStats::new());
        stats.mark_started();
        self.state = PipelineState::Running;

        let mut resources = Resources::new(connection);
        match RowSink::open(
            self.storage.as_ref(),
            &self.settings.bucket,
            &self.settings.path,
            self.settings.access_policy,
            Arc::clone(&stats),
        ) {
            Ok(sink) => resources.sink = Some(sink),
            Err(e) => {
                error!("Exception during initiation, operation aborted: {}", e);
                self.state = PipelineState::Failed;
                resources.release_after_failure();
                return Err(e);
            }
        }

        let streamed = match (resources.connection.as_deref_mut(), resources.sink.as_mut()) {
            (Some(connection), Some(sink)) => drive(connection, sink, &self.settings),
            _ => Err(ExportError::PipelineError("resources released early".into())),
        };

        match streamed {
            Ok(rows_read) => self.complete(resources, rows_read),
            Err(e) => {
                self.state = PipelineState::Failed;
                resources.release_after_failure();
                Err(e)
            }
        }
    }

    fn complete(&mut self, mut resources: Resources, rows_read: u64) -> Result<RunSummary> {
        let summary = match resources.release() {
            Ok(Some(summary)) => summary,
            Ok(None) => {
                self.state = PipelineState::Failed;
                return Err(ExportError::PipelineError("sink was never opened".into()));
            }
            Err(e) => {
                self.state = PipelineState::Failed;
                error!(
                    "Exception while closing connections/channels (possible loss of data): {}",
                    e
                );
                return Err(e);
            }
        };

        log_summary(&summary);
        if summary.lines_accepted() != rows_read {
            warn!(
                "Read {} rows but the sink accounted for {}",
                rows_read,
                summary.lines_accepted()
            );
        }
        if summary.write_errors > 0 {
            warn!("Encountered {} errors while writing.", summary.write_errors);
        } else {
            info!("Run has been successfully completed.");
        }

        self.state = PipelineState::Completed;
        Ok(summary)
    }
}

/// Pulls rows until the source is exhausted; returns the number of rows read.
fn drive(
    connection: &mut dyn QueryPort,
    sink: &mut RowSink,
    settings: &PipelineSettings,
) -> Result<u64> {
    let mut source = RowSource::open(connection, &settings.query)?;
    while let Some(row) = source.next() {
        let row = row?;
        if sink.accept(row_to_line(&row, &settings.separator)) == Accepted::Failed {
            debug!("Dropped line {} after a failed write", source.rows_read());
        }
    }
    Ok(source.rows_read())
}

/// Elapsed time and throughput of a finished run.
fn log_summary(summary: &RunSummary) {
    info!("Job took {} seconds.", summary.elapsed_secs as u64);
    match summary.lines_per_second {
        Some(speed) => info!(
            "Wrote {} lines at {} lines/second.",
            summary.lines_written, speed
        ),
        None => info!("Wrote {} lines.", summary.lines_written),
    }
}

/// Scoped owner of the connection and the sink.
struct Resources {
    sink: Option<RowSink>,
    connection: Option<Box<dyn QueryPort>>,
}

impl Resources {
    fn new(connection: Box<dyn QueryPort>) -> Self {
        Self {
            sink: None,
            connection: Some(connection),
        }
    }

    /// Closes the sink, then the connection. Both are attempted even if the
    /// first one fails; the first error wins.
    fn release(&mut self) -> Result<Option<RunSummary>> {
        let summary = self.sink.take().map(RowSink::close).transpose();
        let closed = match self.connection.take() {
            Some(connection) => connection.close().map_err(|e| match e {
                ExportError::CloseError(_) => e,
                other => ExportError::CloseError(other.to_string()),
            }),
            None => Ok(()),
        };

        let summary = summary?;
        closed?;
        Ok(summary)
    }

    /// Best-effort cleanup on the failure path: errors are logged, not returned.
    fn release_after_failure(&mut self) {
        match self.release() {
            Ok(Some(summary)) => {
                log_summary(&summary);
                info!(
                    "Partial output kept: {} lines written, {} errors",
                    summary.lines_written, summary.write_errors
                );
            }
            Ok(None) => {}
            Err(e) => error!("Cleanup after failure did not complete: {}", e),
        }
    }
}

impl Drop for Resources {
    fn drop(&mut self) {
        if self.sink.is_some() || self.connection.is_some() {
            warn!("Releasing pipeline resources on unwind");
            self.release_after_failure();
        }
    }
}
