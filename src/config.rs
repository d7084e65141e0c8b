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

//! # Configuration
//!
//! Settings come from two places, in increasing priority:
//! 1. An optional config file (JSON if the name ends in `.json`, YAML otherwise).
//! 2. Command line arguments.
//!
//! `AppConfig` is the raw, possibly incomplete input. `resolve` checks it and
//! produces a `ResolvedConfig` in which every required value is present, or
//! the full list of problems so they can be reported at once.

use crate::application::orchestrator::PipelineSettings;
use crate::domain::entities::{AccessPolicy, DEFAULT_SEPARATOR};
use crate::domain::errors::{ExportError, Result, EXIT_CLOSE_FAILURE};
use crate::infrastructure::oracle::oracle_query_adapter::DEFAULT_PREFETCH_ROWS;
use clap::Parser;
use log::info;
use regex::Regex;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::sync::OnceLock;

const MISSING_PARAM: &str = "either include it in the config or pass it as a parameter";

/// Environment variable consulted when no password is configured.
pub const PASSWORD_ENV: &str = "DB_PASSWORD";

const GCS_URL: &str = r"^gs://(?P<bucket>[a-z0-9\-_.]{3,63})/(?P<file>\S+)$";

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Database driver: `oracle` or `mysql`. Inferred from the database URI when unset.
    pub driver: Option<String>,
    /// Connection URI, e.g. `oracle://db-host:1521/ORCLPDB1`.
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub bucket: Option<String>,
    /// Object path inside the bucket.
    pub file: Option<String>,
    pub separator: Option<String>,
    pub query: Option<String>,
    /// ACL applied when the output object is created.
    pub acl: Option<AccessPolicy>,
    pub prefetch_rows: Option<u32>,
    /// Exit code used when the output or the connection fails to close.
    pub close_failure_exit_code: Option<i32>,
    /// Write below this directory instead of Cloud Storage.
    pub local_root: Option<String>,
    /// Path of a JSON run report.
    pub report: Option<String>,
}

#[derive(Parser, Debug, Default)]
#[command(
    author,
    version,
    about = "Export the result of a SQL query to a delimited text file in Cloud Storage",
    long_about = None,
    arg_required_else_help = true
)]
pub struct CliArgs {
    /// Path to configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Connection URI of the database
    #[arg(short = 'd', long)]
    pub database: Option<String>,

    #[arg(short, long)]
    pub user: Option<String>,

    #[arg(short, long)]
    pub password: Option<String>,

    /// Column separator (default '~~')
    #[arg(short, long, allow_hyphen_values = true)]
    pub separator: Option<String>,

    #[arg(long)]
    pub driver: Option<String>,

    /// Predefined ACL for a newly created object (e.g. publicRead)
    #[arg(long, value_parser = parse_access_policy)]
    pub acl: Option<AccessPolicy>,

    #[arg(long)]
    pub prefetch_rows: Option<u32>,

    /// Write to <LOCAL_ROOT>/<bucket>/<file> instead of Cloud Storage
    #[arg(long)]
    pub local_root: Option<String>,

    /// Write a JSON run report to this path
    #[arg(long)]
    pub report: Option<String>,

    /// Destination as gs://<bucket>/<file>
    pub destination: Option<String>,

    /// The query, e.g. SELECT * FROM foo
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub query: Vec<String>,
}

fn parse_access_policy(s: &str) -> std::result::Result<AccessPolicy, String> {
    AccessPolicy::parse(s).ok_or_else(|| format!("unknown access policy '{}'", s))
}

/// Supported database drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Oracle,
    Mysql,
}

impl Driver {
    /// Accepts short names and JDBC driver class names. Without a name the
    /// driver follows the database URI scheme, defaulting to Oracle.
    fn parse(name: Option<&str>, database: Option<&str>) -> Option<Self> {
        match name.map(str::to_lowercase).as_deref() {
            Some("oracle" | "oracle.jdbc.oracledriver" | "oracle.jdbc.driver.oracledriver") => {
                Some(Driver::Oracle)
            }
            Some("mysql" | "com.mysql.jdbc.driver" | "com.mysql.cj.jdbc.driver") => {
                Some(Driver::Mysql)
            }
            Some(_) => None,
            None => match database {
                Some(uri) if uri.starts_with("mysql:") || uri.starts_with("jdbc:mysql:") => {
                    Some(Driver::Mysql)
                }
                _ => Some(Driver::Oracle),
            },
        }
    }
}

/// Where the output object lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    Gcs,
    Local(PathBuf),
}

/// Fully validated configuration consumed by the exporter.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub driver: Driver,
    pub database: String,
    pub user: String,
    pub password: String,
    pub bucket: String,
    pub file: String,
    pub separator: String,
    pub query: String,
    pub acl: AccessPolicy,
    pub prefetch_rows: u32,
    pub close_failure_exit_code: i32,
    pub storage: StorageTarget,
    pub report: Option<PathBuf>,
}

impl ResolvedConfig {
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            query: self.query.clone(),
            bucket: self.bucket.clone(),
            path: self.file.clone(),
            separator: self.separator.clone(),
            access_policy: self.acl,
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: AppConfig = if path.ends_with(".json") {
            serde_json::from_str(&contents)
                .map_err(|e| ExportError::ConfigError(format!("{}: {}", path, e)))?
        } else {
            serde_yaml::from_str(&contents)
                .map_err(|e| ExportError::ConfigError(format!("{}: {}", path, e)))?
        };

        Ok(config)
    }

    /// Applies command line values on top of the file values.
    pub fn merge_cli(&mut self, args: &CliArgs) -> Result<()> {
        if let Some(d) = &args.driver { self.driver = Some(d.clone()); }
        if let Some(d) = &args.database { self.database = Some(d.clone()); }
        if let Some(u) = &args.user { self.user = Some(u.clone()); }
        if let Some(p) = &args.password { self.password = Some(p.clone()); }
        if let Some(s) = &args.separator { self.separator = Some(s.clone()); }
        if let Some(a) = args.acl { self.acl = Some(a); }
        if let Some(n) = args.prefetch_rows { self.prefetch_rows = Some(n); }
        if let Some(r) = &args.local_root { self.local_root = Some(r.clone()); }
        if let Some(r) = &args.report { self.report = Some(r.clone()); }

        let mut query_words: Vec<&str> = args.query.iter().map(String::as_str).collect();
        if let Some(dest) = &args.destination {
            if dest.starts_with("gs://") {
                let (bucket, file) = parse_gcs_url(dest)?;
                self.bucket = Some(bucket);
                self.file = Some(file);
            } else {
                // No destination given: the first positional is part of the query.
                query_words.insert(0, dest);
            }
        }
        if !query_words.is_empty() {
            self.query = Some(query_words.join(" "));
        }
        Ok(())
    }

    /// Fills in the password from the environment when none was given.
    pub fn merge_env(&mut self) {
        if self.password.is_none() {
            self.password = std::env::var(PASSWORD_ENV).ok();
        }
    }

    /// Checks that every required value is present and well formed.
    pub fn resolve(self) -> std::result::Result<ResolvedConfig, Vec<String>> {
        let mut errors = Vec::new();

        let driver = Driver::parse(self.driver.as_deref(), self.database.as_deref());
        if driver.is_none() {
            errors.push(format!(
                "Unsupported driver '{}'; supported: oracle, mysql",
                self.driver.as_deref().unwrap_or_default()
            ));
        }

        let database = required(self.database, "database", &mut errors);
        let user = required(self.user, "user", &mut errors);
        let password = required(self.password, "password", &mut errors);
        let bucket = required(self.bucket, "bucket", &mut errors);
        let file = required(self.file, "file", &mut errors);

        let separator = self.separator.unwrap_or_else(|| DEFAULT_SEPARATOR.to_string());
        if separator.is_empty() {
            info!("Column separator is empty");
        }

        let query = required(self.query, "query", &mut errors);
        if let Some(q) = &query {
            if !q.trim_start().to_uppercase().starts_with("SELECT") {
                errors.push("Query must start with 'SELECT'".to_string());
            }
        }

        let close_failure_exit_code = self.close_failure_exit_code.unwrap_or(EXIT_CLOSE_FAILURE);
        if close_failure_exit_code == 0 {
            errors.push("close_failure_exit_code must be non-zero".to_string());
        }

        let prefetch_rows = self.prefetch_rows.unwrap_or(DEFAULT_PREFETCH_ROWS);
        if prefetch_rows == 0 {
            errors.push("prefetch_rows must be at least 1".to_string());
        }

        match (driver, database, user, password, bucket, file, query) {
            (Some(driver), Some(database), Some(user), Some(password), Some(bucket), Some(file), Some(query))
                if errors.is_empty() =>
            {
                Ok(ResolvedConfig {
                    driver,
                    database,
                    user,
                    password,
                    bucket,
                    file,
                    separator,
                    query,
                    acl: self.acl.unwrap_or_default(),
                    prefetch_rows,
                    close_failure_exit_code,
                    storage: match self.local_root {
                        Some(root) => StorageTarget::Local(PathBuf::from(root)),
                        None => StorageTarget::Gcs,
                    },
                    report: self.report.map(PathBuf::from),
                })
            }
            _ => Err(errors),
        }
    }
}

fn required(value: Option<String>, name: &str, errors: &mut Vec<String>) -> Option<String> {
    if value.is_none() {
        errors.push(format!("No {} specified; {}", name, MISSING_PARAM));
    }
    value
}

fn gcs_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(GCS_URL).expect("GCS_URL is a valid pattern"))
}

/// Splits `gs://bucket/path/to/file` into bucket and object path.
pub fn parse_gcs_url(url: &str) -> Result<(String, String)> {
    let caps = gcs_url_pattern()
        .captures(url)
        .ok_or_else(|| ExportError::ConfigError(format!("Invalid destination URL: {}", url)))?;
    Ok((caps["bucket"].to_string(), caps["file"].to_string()))
}
