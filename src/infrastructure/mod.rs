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

//! # Infrastructure
//!
//! Concrete adapters for the ports, and the functions that pick the right
//! adapter for a resolved configuration.

pub mod gcs;
pub mod local_storage;
#[cfg(feature = "mysql")]
pub mod mysql;
pub mod oracle;

use crate::config::{Driver, ResolvedConfig, StorageTarget};
use crate::domain::errors::Result;
use crate::ports::query_port::QueryPort;
use crate::ports::storage_port::StoragePort;
use self::gcs::gcs_storage_adapter::GcsStorageAdapter;
use self::local_storage::local_storage_adapter::LocalStorageAdapter;
use log::warn;
use self::oracle::oracle_query_adapter::OracleQueryAdapter;
use std::sync::Arc;

/// Opens the database connection for the configured driver.
pub fn connect(config: &ResolvedConfig) -> Result<Box<dyn QueryPort>> {
    match config.driver {
        Driver::Oracle => Ok(Box::new(OracleQueryAdapter::connect(
            &config.database,
            &config.user,
            &config.password,
            config.prefetch_rows,
        )?)),
        Driver::Mysql => connect_mysql(config),
    }
}

#[cfg(feature = "mysql")]
fn connect_mysql(config: &ResolvedConfig) -> Result<Box<dyn QueryPort>> {
    Ok(Box::new(self::mysql::mysql_query_adapter::MysqlQueryAdapter::connect(
        &config.database,
        &config.user,
        &config.password,
    )?))
}

#[cfg(not(feature = "mysql"))]
fn connect_mysql(_config: &ResolvedConfig) -> Result<Box<dyn QueryPort>> {
    Err(crate::domain::errors::ExportError::ConnectionError(
        "MySQL support is not compiled in; rebuild with `--features mysql`".to_string(),
    ))
}

/// Builds the storage adapter for the configured target.
pub fn storage_for(config: &ResolvedConfig) -> Arc<dyn StoragePort> {
    match &config.storage {
        StorageTarget::Gcs => {
            let adapter = GcsStorageAdapter::default();
            if !adapter.is_available() {
                warn!("gcloud CLI not found on PATH; uploads will fail");
            }
            Arc::new(adapter)
        }
        StorageTarget::Local(root) => Arc::new(LocalStorageAdapter::new(root.clone())),
    }
}
