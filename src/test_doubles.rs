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

//! Hand-written mock ports shared by the unit tests.

use crate::domain::entities::{AccessPolicy, ObjectRef, Row};
use crate::domain::errors::{ExportError, Result};
use crate::ports::query_port::{QueryPort, RowCursor};
use crate::ports::storage_port::{ObjectWriter, StoragePort};
use log::{LevelFilter, Log, Metadata, Record};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

thread_local! {
    static CAPTURED: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Records log messages per test thread.
struct CapturingLogger;

static LOGGER: CapturingLogger = CapturingLogger;

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        CAPTURED.with(|c| {
            c.borrow_mut()
                .push(format!("{} {}", record.level(), record.args()))
        });
    }

    fn flush(&self) {}
}

/// Installs the capturing logger and clears this thread's messages.
pub fn capture_logs() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
    CAPTURED.with(|c| c.borrow_mut().clear());
}

pub fn captured_logs() -> Vec<String> {
    CAPTURED.with(|c| c.borrow().clone())
}

pub fn row(fields: &[Option<&str>]) -> Row {
    Row::new(fields.iter().map(|f| f.map(str::to_string)).collect())
}

/// In-memory connection returning a fixed result set.
pub struct MockConnection {
    column_count: usize,
    rows: Vec<Row>,
    prepare_error: Option<String>,
    fail_after: Option<usize>,
    close_error: Option<String>,
    queries: Mutex<Vec<String>>,
    closes: Arc<AtomicUsize>,
}

impl MockConnection {
    pub fn with_rows(column_count: usize, rows: Vec<Row>) -> Self {
        Self {
            column_count,
            rows,
            prepare_error: None,
            fail_after: None,
            close_error: None,
            queries: Mutex::new(Vec::new()),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_prepare(msg: &str) -> Self {
        let mut conn = Self::with_rows(0, vec![]);
        conn.prepare_error = Some(msg.to_string());
        conn
    }

    /// Fetch fails once `n` rows have been delivered.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn failing_close(mut self, msg: &str) -> Self {
        self.close_error = Some(msg.to_string());
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    /// Counter of `close` calls that survives the connection being consumed.
    pub fn close_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }
}

impl QueryPort for MockConnection {
    fn prepare(&mut self, query: &str) -> Result<Box<dyn RowCursor + '_>> {
        self.queries.lock().unwrap().push(query.to_string());
        if let Some(msg) = &self.prepare_error {
            return Err(ExportError::QueryError(msg.clone()));
        }
        Ok(Box::new(MockCursor {
            column_count: self.column_count,
            rows: self.rows.iter(),
            delivered: 0,
            fail_after: self.fail_after,
        }))
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        match &self.close_error {
            Some(msg) => Err(ExportError::CloseError(msg.clone())),
            None => Ok(()),
        }
    }
}

struct MockCursor<'a> {
    column_count: usize,
    rows: std::slice::Iter<'a, Row>,
    delivered: usize,
    fail_after: Option<usize>,
}

impl RowCursor for MockCursor<'_> {
    fn column_count(&self) -> usize {
        self.column_count
    }

    fn next_row(&mut self) -> Option<Result<Row>> {
        if self.fail_after == Some(self.delivered) {
            return Some(Err(ExportError::QueryError(
                "ORA-03113: end-of-file on communication channel".into(),
            )));
        }
        let row = self.rows.next()?.clone();
        self.delivered += 1;
        Some(Ok(row))
    }
}

#[derive(Default)]
struct StorageState {
    objects: HashMap<(String, String), Vec<u8>>,
    created: Vec<(String, String, AccessPolicy)>,
    lines_seen: usize,
}

/// In-memory object store with injectable failures.
#[derive(Clone, Default)]
pub struct MockStorage {
    state: Arc<Mutex<StorageState>>,
    fail_writes: Arc<Vec<usize>>,
    panic_on_write: Option<usize>,
    fail_close: bool,
    fail_open: bool,
    writer_closes: Arc<AtomicUsize>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// The n-th write calls (1-based, across all writers) fail.
    pub fn failing_writes(mut self, calls: &[usize]) -> Self {
        self.fail_writes = Arc::new(calls.to_vec());
        self
    }

    /// The n-th write call panics.
    pub fn panicking_write(mut self, call: usize) -> Self {
        self.panic_on_write = Some(call);
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn with_object(self, bucket: &str, path: &str, content: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert((bucket.into(), path.into()), content.as_bytes().to_vec());
        self
    }

    pub fn content(&self, bucket: &str, path: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(&(bucket.to_string(), path.to_string()))
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    pub fn created(&self) -> Vec<(String, String, AccessPolicy)> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn writer_closes(&self) -> usize {
        self.writer_closes.load(Ordering::SeqCst)
    }
}

impl StoragePort for MockStorage {
    fn resolve(&self, bucket: &str, path: &str) -> Result<Option<ObjectRef>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .objects
            .contains_key(&(bucket.to_string(), path.to_string()))
            .then(|| ObjectRef::new(bucket, path)))
    }

    fn create(&self, bucket: &str, path: &str, policy: AccessPolicy) -> Result<ObjectRef> {
        let mut state = self.state.lock().unwrap();
        state
            .objects
            .insert((bucket.to_string(), path.to_string()), Vec::new());
        state
            .created
            .push((bucket.to_string(), path.to_string(), policy));
        let mut object = ObjectRef::new(bucket, path);
        object.created_with = Some(policy);
        Ok(object)
    }

    fn open_writer(&self, object: &ObjectRef) -> Result<Box<dyn ObjectWriter>> {
        if self.fail_open {
            return Err(ExportError::StorageError("403 Forbidden".into()));
        }
        let key = (object.bucket.clone(), object.path.clone());
        self.state.lock().unwrap().objects.insert(key.clone(), Vec::new());
        Ok(Box::new(MockWriter {
            storage: self.clone(),
            key,
        }))
    }
}

struct MockWriter {
    storage: MockStorage,
    key: (String, String),
}

impl ObjectWriter for MockWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let seen = {
            let mut state = self.storage.state.lock().unwrap();
            state.lines_seen += 1;
            state.lines_seen
        };
        // Lock is released first so a panic does not poison the shared state.
        if self.storage.panic_on_write == Some(seen) {
            panic!("writer crashed on call {}", seen);
        }
        if self.storage.fail_writes.contains(&seen) {
            return Err(ExportError::WriteError("connection reset".into()));
        }
        let mut state = self.storage.state.lock().unwrap();
        state
            .objects
            .entry(self.key.clone())
            .or_default()
            .extend_from_slice(bytes);
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.storage.writer_closes.fetch_add(1, Ordering::SeqCst);
        if self.storage.fail_close {
            return Err(ExportError::CloseError("upload did not finalize".into()));
        }
        Ok(())
    }
}
