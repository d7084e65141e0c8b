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

//! Infrastructure adapter for writing the export to the local filesystem.
//!
//! A bucket is a directory under `root` and the object path is relative to
//! it, so `gs://bucket/dir/out.txt` lands in `<root>/bucket/dir/out.txt`.
//! Useful for dry runs and for exercising the pipeline without Cloud Storage.

use crate::domain::entities::{AccessPolicy, ObjectRef};
use crate::domain::errors::{ExportError, Result};
use crate::ports::storage_port::{ObjectWriter, StoragePort};
use log::debug;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

pub struct LocalStorageAdapter {
    root: PathBuf,
}

impl LocalStorageAdapter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps bucket+path to a file below the root, refusing paths that escape it.
    fn object_path(&self, bucket: &str, path: &str) -> Result<PathBuf> {
        let relative = Path::new(bucket).join(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || bucket.is_empty() || path.is_empty() {
            return Err(ExportError::StorageError(format!(
                "invalid object location {}/{}",
                bucket, path
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl StoragePort for LocalStorageAdapter {
    fn resolve(&self, bucket: &str, path: &str) -> Result<Option<ObjectRef>> {
        let file = self.object_path(bucket, path)?;
        Ok(file.is_file().then(|| ObjectRef::new(bucket, path)))
    }

    fn create(&self, bucket: &str, path: &str, policy: AccessPolicy) -> Result<ObjectRef> {
        let file = self.object_path(bucket, path)?;
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        File::create(&file)?;
        debug!(
            "Created {} (access policy {:?} has no local equivalent)",
            file.display(),
            policy
        );

        let mut object = ObjectRef::new(bucket, path);
        object.created_with = Some(policy);
        Ok(object)
    }

    fn open_writer(&self, object: &ObjectRef) -> Result<Box<dyn ObjectWriter>> {
        let file = self.object_path(&object.bucket, &object.path)?;
        let handle = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&file)
            .map_err(|e| ExportError::StorageError(format!("{}: {}", file.display(), e)))?;

        Ok(Box::new(LocalObjectWriter {
            writer: BufWriter::with_capacity(128 * 1024, handle),
        }))
    }
}

struct LocalObjectWriter {
    writer: BufWriter<File>,
}

impl ObjectWriter for LocalObjectWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer
            .write_all(bytes)
            .map_err(|e| ExportError::WriteError(e.to_string()))
    }

    fn close(self: Box<Self>) -> Result<()> {
        let file = self
            .writer
            .into_inner()
            .map_err(|e| ExportError::CloseError(e.error().to_string()))?;
        file.sync_all()
            .map_err(|e| ExportError::CloseError(e.to_string()))
    }
}
