//! Explicit runtime configuration, loaded once and passed by reference.
//!
//! All paths and policy knobs live in `pkgconsole.toml` next to the working
//! tree. There is no process-wide configuration cache; components receive a
//! `&ConsoleConfig`.

use crate::core::error::ConsoleError;
use crate::core::schemas;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "pkgconsole.toml";

/// Policy for folding an auxiliary descriptor into a primary one.
///
/// The exclusion marker is configurable on purpose: the upstream data
/// carries a literal `TYPE=MSI\MSP\EXE` in sections that must never be
/// merged, and sites differ on which installer types they suppress.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergePolicy {
    /// Section-name prefix eligible for renumbered insertion.
    pub mergeable_prefix: String,
    /// Renumbered sections are inserted immediately before this section;
    /// appended when the primary has no such section.
    pub anchor_section: String,
    /// Entry key inspected for the exclusion marker.
    pub marker_key: String,
    /// Marker values (compared case-insensitively) that exclude a section
    /// from the merge entirely.
    pub excluded_types: Vec<String>,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            mergeable_prefix: "UPGRADE".to_string(),
            anchor_section: "UNINSTALL1".to_string(),
            marker_key: "TYPE".to_string(),
            excluded_types: vec!["MSI\\MSP\\EXE".to_string()],
        }
    }
}

impl MergePolicy {
    pub fn is_mergeable(&self, section_name: &str) -> bool {
        section_name
            .trim()
            .to_ascii_uppercase()
            .starts_with(&self.mergeable_prefix.to_ascii_uppercase())
    }

    pub fn excludes_value(&self, marker_value: &str) -> bool {
        self.excluded_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(marker_value.trim()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Operator identity: names the central-tier file and stamps `submitted_by`.
    pub operator: String,
    /// Root of the operator's working tree (descriptor + local store).
    pub local_root: PathBuf,
    /// Shared location holding every operator's central store and the master.
    pub central_root: PathBuf,
    /// Primary descriptor file name inside `local_root`.
    pub descriptor_file: String,
    /// Auxiliary descriptor produced asynchronously, merged then deleted.
    pub aux_descriptor_file: String,
    pub merge: MergePolicy,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            operator: default_operator(),
            local_root: PathBuf::from("."),
            central_root: PathBuf::from("central"),
            descriptor_file: "Package.ini".to_string(),
            aux_descriptor_file: "tmpPackage.ini".to_string(),
            merge: MergePolicy::default(),
        }
    }
}

fn default_operator() -> String {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .unwrap_or_else(|_| "operator".to_string())
}

impl ConsoleConfig {
    pub fn load(path: &Path) -> Result<Self, ConsoleError> {
        let content = fs::read_to_string(path).map_err(ConsoleError::IoError)?;
        let mut config: Self = toml::from_str(&content)
            .map_err(|e| ConsoleError::ValidationError(format!("{}: {}", path.display(), e)))?;
        if let Some(base) = path.parent() {
            config.anchor_paths(base);
        }
        Ok(config)
    }

    /// Walk up from `start_dir` looking for `pkgconsole.toml`.
    pub fn discover(start_dir: &Path) -> Result<Self, ConsoleError> {
        let mut current = start_dir.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Self::load(&candidate);
            }
            if !current.pop() {
                return Err(ConsoleError::NotFound(format!(
                    "'{}' not found in current or parent directories. Run `pkgconsole init` first.",
                    CONFIG_FILE_NAME
                )));
            }
        }
    }

    /// Write a default config into `dir`, returning its path.
    pub fn write_default(dir: &Path) -> Result<PathBuf, ConsoleError> {
        let path = dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| ConsoleError::ValidationError(e.to_string()))?;
        fs::write(&path, content).map_err(ConsoleError::IoError)?;
        Ok(path)
    }

    /// Re-anchor relative roots at the directory the config was loaded from.
    fn anchor_paths(&mut self, base: &Path) {
        if self.local_root.is_relative() {
            self.local_root = base.join(&self.local_root);
        }
        if self.central_root.is_relative() {
            self.central_root = base.join(&self.central_root);
        }
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.local_root.join("metadata")
    }

    pub fn local_db_path(&self) -> PathBuf {
        self.metadata_dir().join(schemas::METADATA_DB_NAME)
    }

    pub fn central_metadata_dir(&self) -> PathBuf {
        self.central_root.join("metadata")
    }

    pub fn central_db_path(&self) -> PathBuf {
        self.central_metadata_dir()
            .join(format!("{}{}", self.operator, schemas::CENTRAL_DB_SUFFIX))
    }

    pub fn master_db_path(&self) -> PathBuf {
        self.central_metadata_dir().join(schemas::MASTER_DB_NAME)
    }

    pub fn last_merged_path(&self) -> PathBuf {
        self.central_metadata_dir().join(schemas::LAST_MERGED_NAME)
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.local_root.join(&self.descriptor_file)
    }

    pub fn aux_descriptor_path(&self) -> PathBuf {
        self.local_root.join(&self.aux_descriptor_file)
    }
}
