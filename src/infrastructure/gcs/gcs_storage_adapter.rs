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

//! # Cloud Storage Adapter
//!
//! Concrete implementation of `StoragePort` on top of the `gcloud storage`
//! CLI. Lookups use `gcloud storage ls`; writes stream into a long-running
//! `gcloud storage cp - gs://...` process through its stdin, so the export
//! never stages the whole file locally.
//!
//! The upload is only final once stdin is closed and `gcloud` exits
//! successfully, which is why `close` can fail after every write succeeded.

use crate::domain::entities::{AccessPolicy, ObjectRef};
use crate::domain::errors::{ExportError, Result};
use crate::ports::storage_port::{ObjectWriter, StoragePort};
use log::{debug, info};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::process::{Child, ChildStdin, Command, Stdio};

pub struct GcsStorageAdapter {
    gcloud_bin: String,
}

impl Default for GcsStorageAdapter {
    fn default() -> Self {
        Self::new("gcloud")
    }
}

impl GcsStorageAdapter {
    pub fn new(gcloud_bin: &str) -> Self {
        Self {
            gcloud_bin: gcloud_bin.to_string(),
        }
    }

    /// Checks that the CLI is installed and runnable.
    pub fn is_available(&self) -> bool {
        Command::new(&self.gcloud_bin)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl StoragePort for GcsStorageAdapter {
    fn resolve(&self, bucket: &str, path: &str) -> Result<Option<ObjectRef>> {
        let object = ObjectRef::new(bucket, path);
        let url = object.url();
        let output = Command::new(&self.gcloud_bin)
            .args(["storage", "ls", url.as_str()])
            .output()
            .map_err(|e| ExportError::StorageError(format!("failed to run gcloud: {}", e)))?;

        if output.status.success() {
            if listing_contains(&String::from_utf8_lossy(&output.stdout), &url) {
                debug!("Found existing object {}", url);
                return Ok(Some(object));
            }
            // A prefix lists its children, not itself.
            return Ok(None);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_not_found(&stderr) {
            Ok(None)
        } else {
            Err(ExportError::StorageError(format!(
                "Listing failed for {}: {}",
                url,
                stderr.trim()
            )))
        }
    }

    fn create(&self, bucket: &str, path: &str, policy: AccessPolicy) -> Result<ObjectRef> {
        let mut object = ObjectRef::new(bucket, path);
        object.created_with = Some(policy);

        let output = Command::new(&self.gcloud_bin)
            .args(cp_args(&object))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ExportError::StorageError(format!("failed to run gcloud: {}", e)))?;
        if !output.status.success() {
            return Err(ExportError::StorageError(format!(
                "Failed to create {}: {}",
                object.url(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        info!("Created {}", object.url());
        Ok(object)
    }

    fn open_writer(&self, object: &ObjectRef) -> Result<Box<dyn ObjectWriter>> {
        // stderr goes to a file: a full pipe would stall gcloud while we write stdin.
        let stderr_log = tempfile::tempfile()?;
        let mut child = Command::new(&self.gcloud_bin)
            .args(cp_args(object))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr_log.try_clone()?))
            .spawn()
            .map_err(|e| ExportError::StorageError(format!("failed to start upload: {}", e)))?;

        let stdin = match child.stdin.take() {
            Some(stdin) => stdin,
            None => {
                let _ = child.kill();
                return Err(ExportError::StorageError(
                    "upload process has no stdin".to_string(),
                ));
            }
        };

        debug!("Streaming upload to {} started", object.url());
        Ok(Box::new(GcsObjectWriter {
            url: object.url(),
            child,
            stdin,
            stderr_log,
        }))
    }
}

struct GcsObjectWriter {
    url: String,
    child: Child,
    stdin: ChildStdin,
    stderr_log: File,
}

impl ObjectWriter for GcsObjectWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.stdin
            .write_all(bytes)
            .map_err(|e| ExportError::WriteError(format!("{}: {}", self.url, e)))
    }

    fn close(self: Box<Self>) -> Result<()> {
        let GcsObjectWriter {
            url,
            mut child,
            mut stdin,
            mut stderr_log,
        } = *self;

        let flushed = stdin.flush();
        // Closing stdin tells gcloud the stream is complete.
        drop(stdin);
        let status = child
            .wait()
            .map_err(|e| ExportError::CloseError(format!("{}: {}", url, e)))?;
        flushed.map_err(|e| ExportError::CloseError(format!("{}: {}", url, e)))?;

        if status.success() {
            return Ok(());
        }
        let mut stderr = String::new();
        stderr_log.seek(SeekFrom::Start(0))?;
        stderr_log.read_to_string(&mut stderr)?;
        Err(ExportError::CloseError(format!(
            "upload to {} exited with {}: {}",
            url,
            status,
            stderr.trim()
        )))
    }
}

/// Arguments for a streaming `gcloud storage cp` from stdin.
fn cp_args(object: &ObjectRef) -> Vec<String> {
    let mut args = vec![
        "storage".to_string(),
        "cp".to_string(),
        "-".to_string(),
        object.url(),
    ];
    if let Some(acl) = object.created_with.and_then(|p| p.predefined_acl()) {
        args.push(format!("--predefined-acl={}", acl));
    }
    args
}

/// `ls` output lists the object itself only when the URL names an object.
fn listing_contains(stdout: &str, url: &str) -> bool {
    stdout.lines().any(|line| line.trim() == url)
}

fn is_not_found(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("matched no objects") || lower.contains("not found")
}
