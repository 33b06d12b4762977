//! Scheduled fold of every operator's central store into the master store.
//!
//! The master is rebuilt in a private local temp file and only copied over
//! the published path once the build committed, so readers never observe a
//! half-built master. Source stores are likewise copied to a local temp
//! before reading; a read-only open over a shared location is avoided.
//! Deduplication is first-writer-wins per application key: sources are
//! processed in sorted filename order and later records for a key already
//! present are dropped, not merged.

use crate::core::cancel::CancelToken;
use crate::core::config::ConsoleConfig;
use crate::core::db;
use crate::core::error::ConsoleError;
use crate::core::schemas;
use crate::core::time;
use crate::sync::record::{MasterRecord, PackageRecord};
use regex::Regex;
use rusqlite::{Connection, OpenFlags, params};
use serde::Serialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateReport {
    /// False when the daily gate skipped the run.
    pub ran: bool,
    pub sources_merged: usize,
    pub records_inserted: usize,
    pub duplicates_dropped: usize,
    /// Central files that could not be read, by file name.
    pub sources_skipped: Vec<String>,
}

/// Run the master merge.
///
/// Skipped unless `force` is set or the last successful run was on an
/// earlier calendar day. A single unreadable source is skipped with a
/// warning; the run still completes and still records its timestamp. A
/// cancelled run leaves the published master and the timestamp untouched.
pub fn aggregate(
    config: &ConsoleConfig,
    force: bool,
    cancel: &CancelToken,
) -> Result<AggregateReport, ConsoleError> {
    if !force && merged_today(config) {
        println!("Master merge skipped (already done today).");
        return Ok(AggregateReport::default());
    }

    fs::create_dir_all(config.central_metadata_dir()).map_err(ConsoleError::IoError)?;

    let temp_master = env::temp_dir().join(format!("master_{}.db", time::new_event_id()));
    let outcome = build_and_publish(config, &temp_master, cancel);
    if temp_master.exists() {
        let _ = fs::remove_file(&temp_master);
    }
    outcome
}

fn build_and_publish(
    config: &ConsoleConfig,
    temp_master: &Path,
    cancel: &CancelToken,
) -> Result<AggregateReport, ConsoleError> {
    let mut report = AggregateReport {
        ran: true,
        ..AggregateReport::default()
    };

    let mut conn = db::db_connect(&temp_master.to_string_lossy())?;
    conn.execute(schemas::MASTER_DB_SCHEMA, [])?;

    let tx = conn.transaction()?;
    for source in central_source_files(config)? {
        if cancel.is_cancelled() {
            return Err(ConsoleError::Cancelled(
                "aggregation stopped before processing all central stores".to_string(),
            ));
        }

        let label = source
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        match read_central_file(&source) {
            Ok(records) => {
                for r in records {
                    let changed = tx.execute(
                        "INSERT INTO master_packages(key, name, version, vendor, installer_type, submitted_by, submitted_on, descriptor_text)
                         VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                         ON CONFLICT(key) DO NOTHING",
                        params![
                            r.key,
                            r.name,
                            r.version,
                            r.vendor,
                            r.installer_type,
                            r.submitted_by,
                            r.submitted_on,
                            r.descriptor_text
                        ],
                    )?;
                    if changed == 0 {
                        report.duplicates_dropped += 1;
                    } else {
                        report.records_inserted += 1;
                    }
                }
                report.sources_merged += 1;
            }
            Err(e) => {
                eprintln!("Warning: skipping central store '{}': {}", label, e);
                report.sources_skipped.push(label);
            }
        }
    }
    tx.commit()?;
    drop(conn);

    fs::copy(temp_master, config.master_db_path()).map_err(ConsoleError::IoError)?;
    fs::write(config.last_merged_path(), time::now_stamp()).map_err(ConsoleError::IoError)?;

    println!(
        "Master merge completed: {} source(s), {} record(s) inserted, {} duplicate key(s) dropped.",
        report.sources_merged, report.records_inserted, report.duplicates_dropped
    );
    Ok(report)
}

/// The stamp of the last successful merge, `None` when absent or unparsable.
pub fn last_merged(config: &ConsoleConfig) -> Option<String> {
    let text = fs::read_to_string(config.last_merged_path()).ok()?;
    let stamp = text.trim().to_string();
    time::date_of_stamp(&stamp).map(|_| stamp)
}

fn merged_today(config: &ConsoleConfig) -> bool {
    last_merged(config)
        .and_then(|stamp| time::date_of_stamp(&stamp))
        .is_some_and(|date| date == time::today())
}

/// Central files matching the `<operator>_packages.db` convention, sorted
/// for deterministic first-writer-wins, master excluded by name.
fn central_source_files(config: &ConsoleConfig) -> Result<Vec<PathBuf>, ConsoleError> {
    let dir = config.central_metadata_dir();
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let pattern = Regex::new(r"^.+_packages\.db$").unwrap();
    let mut files = Vec::new();
    for entry in fs::read_dir(&dir).map_err(ConsoleError::IoError)? {
        let entry = entry.map_err(ConsoleError::IoError)?;
        let name = entry.file_name().to_string_lossy().to_string();
        if pattern.is_match(&name) && !name.eq_ignore_ascii_case(schemas::MASTER_DB_NAME) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Operator ids derived from the central-tier file names.
pub fn discover_operators(config: &ConsoleConfig) -> Result<Vec<String>, ConsoleError> {
    let mut operators = Vec::new();
    for path in central_source_files(config)? {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        if let Some(op) = name.strip_suffix(schemas::CENTRAL_DB_SUFFIX) {
            operators.push(op.to_string());
        }
    }
    Ok(operators)
}

/// Read one operator's central store, always through a local temp copy.
pub fn read_central_file(path: &Path) -> Result<Vec<PackageRecord>, ConsoleError> {
    if !path.exists() {
        return Err(ConsoleError::NotFound(format!(
            "central store '{}'",
            path.display()
        )));
    }
    let tmp = copy_to_temp(path, "pkg")?;
    let result = read_packages(&tmp);
    let _ = fs::remove_file(&tmp);
    result
}

/// Read the published master store, always through a local temp copy.
pub fn read_master(config: &ConsoleConfig) -> Result<Vec<MasterRecord>, ConsoleError> {
    let master = config.master_db_path();
    if !master.exists() {
        return Err(ConsoleError::NotFound(format!(
            "master store '{}'",
            master.display()
        )));
    }
    let tmp = copy_to_temp(&master, "master")?;
    let result = read_master_rows(&tmp);
    let _ = fs::remove_file(&tmp);
    result
}

fn copy_to_temp(path: &Path, tag: &str) -> Result<PathBuf, ConsoleError> {
    let tmp = env::temp_dir().join(format!("{}_{}.db", tag, time::new_event_id()));
    fs::copy(path, &tmp).map_err(ConsoleError::IoError)?;
    Ok(tmp)
}

fn read_packages(path: &Path) -> Result<Vec<PackageRecord>, ConsoleError> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let mut stmt = conn.prepare(
        "SELECT key, name, version, vendor, installer_type, installer_file, submitted_by, submitted_on, descriptor_text
         FROM packages ORDER BY datetime(submitted_on) DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(PackageRecord {
            key: row.get(0)?,
            name: row.get(1)?,
            version: row.get(2)?,
            vendor: row.get(3)?,
            installer_type: row.get(4)?,
            installer_file: row.get(5)?,
            submitted_by: row.get(6)?,
            submitted_on: row.get(7)?,
            descriptor_text: row.get(8)?,
        })
    })?;

    let mut records = Vec::new();
    for r in rows {
        records.push(r?);
    }
    Ok(records)
}

fn read_master_rows(path: &Path) -> Result<Vec<MasterRecord>, ConsoleError> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let mut stmt = conn.prepare(
        "SELECT key, name, version, vendor, installer_type, submitted_by, submitted_on, descriptor_text
         FROM master_packages ORDER BY datetime(submitted_on) DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(MasterRecord {
            key: row.get(0)?,
            name: row.get(1)?,
            version: row.get(2)?,
            vendor: row.get(3)?,
            installer_type: row.get(4)?,
            submitted_by: row.get(5)?,
            submitted_on: row.get(6)?,
            descriptor_text: row.get(7)?,
        })
    })?;

    let mut records = Vec::new();
    for r in rows {
        records.push(r?);
    }
    Ok(records)
}
