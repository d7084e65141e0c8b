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

//! # Row Sink
//!
//! `RowSink` owns the write channel to the destination object. Every line
//! handed to `accept` is either written (and counted) or dropped (and
//! counted as an error). A failed write never stops the export: failures
//! are reported in aggregate when the sink is closed.

use crate::domain::entities::{AccessPolicy, Line, ObjectRef, RunSummary};
use crate::domain::errors::{ExportError, Result};
use crate::domain::run_stats::RunStats;
use crate::ports::storage_port::{ObjectWriter, StoragePort};
use log::{info, warn};
use std::sync::Arc;

/// Result of handing one line to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepted {
    Written,
    Failed,
}

pub struct RowSink {
    writer: Box<dyn ObjectWriter>,
    stats: Arc<RunStats>,
    destination: String,
}

impl RowSink {
    /// Opens a write channel to `bucket`/`path`, creating the object with
    /// `policy` when it does not exist yet.
    pub fn open(
        storage: &dyn StoragePort,
        bucket: &str,
        path: &str,
        policy: AccessPolicy,
        stats: Arc<RunStats>,
    ) -> Result<Self> {
        let object = match storage.resolve(bucket, path)? {
            Some(existing) => {
                info!("Overwriting existing object {}", existing.url());
                existing
            }
            None => {
                info!("Creating {} ({:?})", ObjectRef::new(bucket, path).url(), policy);
                storage.create(bucket, path, policy)?
            }
        };
        let writer = storage.open_writer(&object)?;

        Ok(Self {
            writer,
            stats,
            destination: object.url(),
        })
    }

    /// Writes one line. Transport failures are logged and counted, not returned.
    pub fn accept(&mut self, line: Line) -> Accepted {
        match self.writer.write(line.as_bytes()) {
            Ok(()) => {
                self.stats.record_written();
                Accepted::Written
            }
            Err(e) => {
                warn!("{}", e);
                self.stats.record_error();
                Accepted::Failed
            }
        }
    }

    /// Flushes and closes the channel, then takes the final statistics.
    ///
    /// Only computes the summary; the caller logs it.
    pub fn close(self) -> Result<RunSummary> {
        self.writer.close().map_err(|e| match e {
            ExportError::CloseError(_) => e,
            other => ExportError::CloseError(other.to_string()),
        })?;
        Ok(self.stats.summarize(&self.destination))
    }
}
