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

//! Core error definitions for the SQL to Cloud Storage exporter.
//!
//! This module provides a centralized `ExportError` enum and a `Result` type
//! used throughout the application. The variants mirror how each failure is
//! treated by the pipeline:
//! - `QueryError` ends the stream and fails the run.
//! - `WriteError` is counted by the sink and never stops the run.
//! - `CloseError` happens after the stream completed and aborts the process.

use thiserror::Error;

/// Exit code used for every failure that is not a close failure.
pub const EXIT_FAILURE: i32 = 1;

/// Default exit code when the output channel or connection fails to close.
pub const EXIT_CLOSE_FAILURE: i32 = 2;

/// Error types encountered during the export process.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query failed: {0}")]
    QueryError(String),

    #[error("Write failed: {0}")]
    WriteError(String),

    #[error("Close failed (possible loss of data): {0}")]
    CloseError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Pipeline error: {0}")]
    PipelineError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ExportError {
    /// Returns true for failures that must abort the process after the stream completed.
    pub fn is_close_failure(&self) -> bool {
        matches!(self, ExportError::CloseError(_))
    }

    /// Process exit code for this error, given the configured close-failure code.
    pub fn exit_code(&self, close_failure_exit_code: i32) -> i32 {
        if self.is_close_failure() {
            close_failure_exit_code
        } else {
            EXIT_FAILURE
        }
    }
}

/// A specialized Result type for the exporter.
pub type Result<T> = std::result::Result<T, ExportError>;
