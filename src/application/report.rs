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

//! Optional JSON report of a finished run, for operators and schedulers.

use crate::domain::entities::RunSummary;
use crate::domain::errors::{ExportError, Result};
use log::info;
use serde_json::json;
use std::fs::File;
use std::path::Path;

/// Writes `summary` as pretty-printed JSON to `path`.
pub fn write_report(summary: &RunSummary, query: &str, path: &Path) -> Result<()> {
    let report = json!({
        "summary": summary,
        "query": query,
        "finished_at": chrono::Utc::now().to_rfc3339(),
    });

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path).map_err(ExportError::IoError)?;
    serde_json::to_writer_pretty(file, &report)
        .map_err(|e| ExportError::IoError(e.into()))?;

    info!("Run report written to {}", path.display());
    Ok(())
}
