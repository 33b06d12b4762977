//! Centralized store definitions for the three metadata tiers.
//!
//! Pkgconsole keeps one SQLite database per tier:
//! 1. Local:   `<local root>/metadata/packages.db` — single operator, single machine.
//! 2. Central: `<central root>/metadata/<operator>_packages.db` — one file per operator.
//! 3. Master:  `<central root>/metadata/master.db` — rebuilt by aggregation, never edited.

/// Per-operator store file name (local tier; central files prepend the operator id).
pub const METADATA_DB_NAME: &str = "packages.db";

/// Central-tier naming convention: `<operator>_packages.db`.
pub const CENTRAL_DB_SUFFIX: &str = "_packages.db";

/// Aggregated master store, excluded from source discovery by name.
pub const MASTER_DB_NAME: &str = "master.db";

/// Flag file recording the last successful aggregation stamp.
pub const LAST_MERGED_NAME: &str = "last_merged.txt";

pub const METADATA_DB_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS packages (
        key TEXT PRIMARY KEY,
        name TEXT,
        version TEXT,
        vendor TEXT,
        installer_type TEXT,
        installer_file TEXT,
        submitted_by TEXT,
        submitted_on TEXT,
        descriptor_text TEXT
    )
";

pub const MASTER_DB_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS master_packages (
        key TEXT PRIMARY KEY,
        name TEXT,
        version TEXT,
        vendor TEXT,
        installer_type TEXT,
        submitted_by TEXT,
        submitted_on TEXT,
        descriptor_text TEXT
    )
";
