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

//! # Domain Entities
//!
//! Entities are the "Nouns" of the exporter: the rows coming out of the
//! database, the lines going into the output object, the destination object
//! itself and the summary of a finished run.
//!
//! We use the `serde` crate (Serialize/Deserialize) for the types that appear
//! in configuration files or in the JSON run report.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default column separator.
pub const DEFAULT_SEPARATOR: &str = "~~";

/// One record returned by the query.
///
/// Fields are in column order. `None` is a SQL `NULL`, which is different
/// from an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub fields: Vec<Option<String>>,
}

impl Row {
    pub fn new(fields: Vec<Option<String>>) -> Self {
        Self { fields }
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// The newline-terminated text serialization of one `Row`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line(String);

impl Line {
    /// Wraps already-joined text, appending the terminating newline.
    pub(crate) fn terminated(mut text: String) -> Self {
        text.push('\n');
        Line(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// UTF-8 bytes as they are written to the output object.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `AccessPolicy` controls the ACL applied when the output object has to be created.
///
/// The names follow the predefined ACLs of Cloud Storage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum AccessPolicy {
    /// No explicit ACL: the bucket's default object ACL applies.
    #[default]
    BucketDefault,
    Private,
    ProjectPrivate,
    PublicRead,
    AuthenticatedRead,
    BucketOwnerRead,
    BucketOwnerFullControl,
}

impl AccessPolicy {
    /// The predefined ACL name understood by Cloud Storage, if any.
    pub fn predefined_acl(&self) -> Option<&'static str> {
        match self {
            AccessPolicy::BucketDefault => None,
            AccessPolicy::Private => Some("private"),
            AccessPolicy::ProjectPrivate => Some("projectPrivate"),
            AccessPolicy::PublicRead => Some("publicRead"),
            AccessPolicy::AuthenticatedRead => Some("authenticatedRead"),
            AccessPolicy::BucketOwnerRead => Some("bucketOwnerRead"),
            AccessPolicy::BucketOwnerFullControl => Some("bucketOwnerFullControl"),
        }
    }

    /// Parses a policy name as given on the command line.
    pub fn parse(name: &str) -> Option<Self> {
        let policy = match name {
            "bucketDefault" | "default" => AccessPolicy::BucketDefault,
            "private" => AccessPolicy::Private,
            "projectPrivate" => AccessPolicy::ProjectPrivate,
            "publicRead" => AccessPolicy::PublicRead,
            "authenticatedRead" => AccessPolicy::AuthenticatedRead,
            "bucketOwnerRead" => AccessPolicy::BucketOwnerRead,
            "bucketOwnerFullControl" => AccessPolicy::BucketOwnerFullControl,
            _ => return None,
        };
        Some(policy)
    }
}

/// `ObjectRef` points at an object in a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub path: String,
    /// Policy the object was created with; `None` for objects that already existed.
    pub created_with: Option<AccessPolicy>,
}

impl ObjectRef {
    pub fn new(bucket: &str, path: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            path: path.to_string(),
            created_with: None,
        }
    }

    /// The `gs://bucket/path` form of this object.
    pub fn url(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.path)
    }
}

/// The lifecycle of a single pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "IDLE"),
            PipelineState::Running => write!(f, "RUNNING"),
            PipelineState::Completed => write!(f, "COMPLETED"),
            PipelineState::Failed => write!(f, "FAILED"),
        }
    }
}

/// `RunSummary` is the "Report Card" of a run, computed when the sink is closed.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunSummary {
    pub destination: String,
    /// Lines that reached the output channel.
    pub lines_written: u64,
    /// Lines whose write failed and were dropped.
    pub write_errors: u64,
    pub elapsed_secs: f64,
    /// `None` when no measurable time elapsed.
    pub lines_per_second: Option<u64>,
}

impl RunSummary {
    /// Total number of lines handed to the sink.
    pub fn lines_accepted(&self) -> u64 {
        self.lines_written + self.write_errors
    }
}
