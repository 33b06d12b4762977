//! Local metadata store: a single-writer embedded database holding one row
//! per application key, upserted on every save or submission.

use crate::core::broker::DbBroker;
use crate::core::config::ConsoleConfig;
use crate::core::error::ConsoleError;
use crate::core::schemas;
use crate::sync::record::PackageRecord;
use rusqlite::params;
use std::fs;

pub fn initialize_local_db(config: &ConsoleConfig) -> Result<(), ConsoleError> {
    let dir = config.metadata_dir();
    fs::create_dir_all(&dir).map_err(ConsoleError::IoError)?;
    let broker = DbBroker::new(&dir);
    broker.with_conn(
        &config.local_db_path(),
        &config.operator,
        "packages.init",
        |conn| {
            conn.execute(schemas::METADATA_DB_SCHEMA, [])?;
            Ok(())
        },
    )?;
    Ok(())
}

/// Idempotent per-key upsert: repeated calls with the same key keep exactly
/// one row reflecting the latest call's values.
pub fn upsert_local(config: &ConsoleConfig, record: &PackageRecord) -> Result<(), ConsoleError> {
    let dir = config.metadata_dir();
    fs::create_dir_all(&dir).map_err(ConsoleError::IoError)?;
    let broker = DbBroker::new(&dir);
    broker.with_conn(
        &config.local_db_path(),
        &config.operator,
        "packages.upsert",
        |conn| {
            conn.execute(schemas::METADATA_DB_SCHEMA, [])?;
            conn.execute(
                "INSERT INTO packages(key, name, version, vendor, installer_type, installer_file, submitted_by, submitted_on, descriptor_text)
                 VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(key) DO UPDATE SET
                    name = excluded.name,
                    version = excluded.version,
                    vendor = excluded.vendor,
                    installer_type = excluded.installer_type,
                    installer_file = excluded.installer_file,
                    submitted_by = excluded.submitted_by,
                    submitted_on = excluded.submitted_on,
                    descriptor_text = excluded.descriptor_text",
                params![
                    record.key,
                    record.name,
                    record.version,
                    record.vendor,
                    record.installer_type,
                    record.installer_file,
                    record.submitted_by,
                    record.submitted_on,
                    record.descriptor_text
                ],
            )?;
            Ok(())
        },
    )
}

/// All local rows, newest submission first. An absent store reads as empty.
pub fn list_local(config: &ConsoleConfig) -> Result<Vec<PackageRecord>, ConsoleError> {
    let db_path = config.local_db_path();
    if !db_path.exists() {
        return Ok(Vec::new());
    }
    let broker = DbBroker::new(&config.metadata_dir());
    broker.with_conn(&db_path, &config.operator, "packages.list", |conn| {
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
    })
}
