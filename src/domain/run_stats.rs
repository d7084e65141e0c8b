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

//! # Run Statistics
//!
//! `RunStats` is the only state shared between the pipeline coordinator and
//! the sink. Counters are atomics so they can be bumped from whichever thread
//! drives the sink; the start instant sits behind a `Mutex` because it is
//! reset once, when the pipeline starts running.

use crate::domain::entities::RunSummary;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct RunStats {
    lines_written: AtomicU64,
    write_errors: AtomicU64,
    started_at: Mutex<Instant>,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            lines_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            started_at: Mutex::new(Instant::now()),
        }
    }

    /// Resets the start timestamp to now.
    pub fn mark_started(&self) {
        let mut started = self.started_at.lock().unwrap_or_else(|e| e.into_inner());
        *started = Instant::now();
    }

    pub fn record_written(&self) {
        self.lines_written.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_error(&self) {
        self.write_errors.fetch_add(1, Ordering::SeqCst);
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written.load(Ordering::SeqCst)
    }

    pub fn write_errors(&self) -> u64 {
        self.write_errors.load(Ordering::SeqCst)
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .elapsed()
    }

    /// Takes the final snapshot for `destination`.
    pub fn summarize(&self, destination: &str) -> RunSummary {
        let elapsed = self.elapsed();
        let lines_written = self.lines_written();
        RunSummary {
            destination: destination.to_string(),
            lines_written,
            write_errors: self.write_errors(),
            elapsed_secs: elapsed.as_secs_f64(),
            lines_per_second: throughput(lines_written, elapsed),
        }
    }
}

/// Lines per second rounded to the nearest integer, `None` for a zero duration.
pub fn throughput(lines: u64, elapsed: Duration) -> Option<u64> {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return None;
    }
    Some((lines as f64 / secs).round() as u64)
}
