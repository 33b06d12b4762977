use crate::core::db;
use crate::core::error;
use crate::core::time;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The DB broker is the single entry point for store mutations: an
/// in-process serialized request layer that also appends an audit event
/// per operation.
pub struct DbBroker {
    audit_log_path: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BrokerEvent {
    pub ts: String,
    pub event_id: String,
    pub operator: String,
    pub op: String,
    pub db_id: String,
    pub status: String,
}

impl DbBroker {
    pub fn new(metadata_dir: &Path) -> Self {
        Self {
            audit_log_path: metadata_dir.join("broker.events.jsonl"),
        }
    }

    /// Execute a closure with a serialized connection to the specified DB.
    pub fn with_conn<F, R>(
        &self,
        db_path: &Path,
        operator: &str,
        op_name: &str,
        f: F,
    ) -> Result<R, error::ConsoleError>
    where
        F: FnOnce(&mut Connection) -> Result<R, error::ConsoleError>,
    {
        // One write at a time per process; cross-process contention is
        // handled by the connection's busy_timeout.
        static DB_LOCK: Mutex<()> = Mutex::new(());
        let _lock = DB_LOCK.lock().unwrap();

        let db_id = db_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let mut conn = db::db_connect(&db_path.to_string_lossy())?;

        let result = f(&mut conn);

        let status = if result.is_ok() { "success" } else { "error" };
        self.log_event(operator, op_name, &db_id, status)?;

        result
    }

    fn log_event(
        &self,
        operator: &str,
        op: &str,
        db_id: &str,
        status: &str,
    ) -> Result<(), error::ConsoleError> {
        use std::fs::OpenOptions;
        use std::io::Write;

        let ev = BrokerEvent {
            ts: time::now_stamp(),
            event_id: time::new_event_id(),
            operator: operator.to_string(),
            op: op.to_string(),
            db_id: db_id.to_string(),
            status: status.to_string(),
        };

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log_path)
            .map_err(error::ConsoleError::IoError)?;

        writeln!(f, "{}", serde_json::to_string(&ev).unwrap()).map_err(error::ConsoleError::IoError)?;
        Ok(())
    }
}
