//! Best-effort mirror of the local store to the operator's central file.
//!
//! Two attempts: a direct whole-file copy with overwrite, then an online
//! consistent backup into a private local temp file that is copied and
//! deleted. Failures never propagate past this boundary; the caller gets a
//! success/failure outcome and the local store stays authoritative.

use crate::core::config::ConsoleConfig;
use crate::core::error::ConsoleError;
use crate::core::time;
use rusqlite::Connection;
use rusqlite::backup::Backup;
use std::env;
use std::fs;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MirrorOutcome {
    pub ok: bool,
    pub detail: Option<String>,
}

pub fn mirror_to_central(config: &ConsoleConfig) -> MirrorOutcome {
    match try_mirror(config) {
        Ok(how) => {
            println!(
                "Local store mirrored to '{}' ({}).",
                config.central_db_path().display(),
                how
            );
            MirrorOutcome {
                ok: true,
                detail: None,
            }
        }
        Err(e) => {
            let detail = format!(
                "{} (central path: {})",
                e,
                config.central_db_path().display()
            );
            eprintln!("Warning: mirror to central failed: {}", detail);
            MirrorOutcome {
                ok: false,
                detail: Some(detail),
            }
        }
    }
}

fn try_mirror(config: &ConsoleConfig) -> Result<&'static str, ConsoleError> {
    let local = config.local_db_path();
    if !local.exists() {
        return Err(ConsoleError::NotFound(format!(
            "local store '{}'",
            local.display()
        )));
    }

    fs::create_dir_all(config.central_metadata_dir()).map_err(ConsoleError::IoError)?;
    let central = config.central_db_path();

    match fs::copy(&local, &central) {
        Ok(_) => return Ok("direct overwrite"),
        Err(e) => {
            eprintln!(
                "Warning: direct copy to central failed ({}); attempting snapshot fallback.",
                e
            );
        }
    }

    // A live WAL database may not be copyable as a plain file; take an
    // online snapshot locally and ship that instead.
    let snapshot = env::temp_dir().join(format!("packages_backup_{}.db", time::new_event_id()));
    let result = (|| -> Result<(), ConsoleError> {
        let src = Connection::open(&local)?;
        let mut dst = Connection::open(&snapshot)?;
        let backup = Backup::new(&src, &mut dst)?;
        backup.run_to_completion(64, Duration::from_millis(50), None)?;
        drop(backup);
        drop(dst);
        fs::copy(&snapshot, &central).map_err(ConsoleError::IoError)?;
        Ok(())
    })();

    if snapshot.exists() {
        let _ = fs::remove_file(&snapshot);
    }

    result.map(|_| "online backup snapshot")
}
