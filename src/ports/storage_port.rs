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

//! # Storage Port
//!
//! This Port is the contract for the object store the export is written to.
//! An object is addressed by bucket and path; writing goes through an
//! `ObjectWriter`, a plain byte sink that must be closed to make the data
//! durable.

use crate::domain::entities::{AccessPolicy, ObjectRef};
use crate::domain::errors::Result;

pub trait StoragePort: Send + Sync {
    /// Looks up an existing object.
    fn resolve(&self, bucket: &str, path: &str) -> Result<Option<ObjectRef>>;

    /// Creates a new, empty object with the given access policy.
    fn create(&self, bucket: &str, path: &str, policy: AccessPolicy) -> Result<ObjectRef>;

    /// Opens a write channel that replaces the object's content.
    fn open_writer(&self, object: &ObjectRef) -> Result<Box<dyn ObjectWriter>>;
}

/// Byte sink for a single object.
pub trait ObjectWriter: Send {
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Flushes and closes the channel. Taking `self` makes a second close impossible.
    fn close(self: Box<Self>) -> Result<()>;
}
