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

//! # sql2gcs
//!
//! Exports the result of a single SQL query to a delimited text file in
//! Google Cloud Storage, one line per row.
//!
//! This application follows the **Hexagonal Architecture** (Ports and Adapters):
//! the pipeline in `application` only talks to the `ports` traits, and the
//! Oracle and Cloud Storage specifics live in `infrastructure`.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ports;

#[cfg(test)]
mod test_doubles;

use crate::application::orchestrator::ExportPipeline;
use crate::application::report::write_report;
use crate::config::{AppConfig, CliArgs, ResolvedConfig};
use crate::domain::entities::RunSummary;
use crate::domain::errors::{Result, EXIT_FAILURE};
use crate::ports::query_port::QueryPort;
use crate::ports::storage_port::StoragePort;
use clap::Parser;
use log::{error, info, warn};
use std::process;
use std::sync::Arc;

fn main() {
    // 1. Initialize Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 2. Parse Arguments
    let args = CliArgs::parse();

    // 3. Load Config
    let mut config = match &args.config {
        Some(config_path) => match AppConfig::from_file(config_path) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to load config: {}", e);
                process::exit(EXIT_FAILURE);
            }
        },
        None => AppConfig::default(),
    };

    // Merge CLI overrides
    if let Err(e) = config.merge_cli(&args) {
        error!("{}", e);
        process::exit(EXIT_FAILURE);
    }
    config.merge_env();

    let config = match config.resolve() {
        Ok(c) => c,
        Err(errors) => {
            eprintln!("Configuration errors detected:");
            for e in &errors {
                eprintln!("  {}", e);
            }
            eprintln!("Operation aborted.");
            eprintln!("\nRun without command line arguments to display help.");
            process::exit(EXIT_FAILURE);
        }
    };

    // 4. Initialize Hexagonal Components
    let connection = match infrastructure::connect(&config) {
        Ok(c) => c,
        Err(e) => {
            error!("Exception during initiation, operation aborted: {}", e);
            process::exit(EXIT_FAILURE);
        }
    };
    let storage = infrastructure::storage_for(&config);

    // 5. Run Pipeline
    if let Err(e) = export(&config, connection, storage) {
        error!("Export failed: {}", e);
        process::exit(e.exit_code(config.close_failure_exit_code));
    }
}

/// Runs one export and writes the optional report.
fn export(
    config: &ResolvedConfig,
    connection: Box<dyn QueryPort>,
    storage: Arc<dyn StoragePort>,
) -> Result<RunSummary> {
    info!(
        "Exporting to gs://{}/{} (separator {:?})",
        config.bucket, config.file, config.separator
    );
    let mut pipeline = ExportPipeline::new(config.pipeline_settings(), connection, storage);
    let summary = pipeline.run()?;

    if let Some(path) = &config.report {
        if let Err(e) = write_report(&summary, &config.query, path) {
            warn!("Could not write run report: {}", e);
        }
    }
    Ok(summary)
}
