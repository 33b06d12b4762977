//! Metadata records exchanged between the three store tiers.

use crate::core::error::ConsoleError;
use crate::descriptor::parse;
use serde::{Deserialize, Serialize};

/// One row per application key in the local and central tiers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageRecord {
    pub key: String,
    pub name: String,
    pub version: String,
    pub vendor: String,
    pub installer_type: String,
    pub installer_file: String,
    pub submitted_by: String,
    pub submitted_on: String,
    pub descriptor_text: String,
}

/// The narrower master-tier projection produced by aggregation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MasterRecord {
    pub key: String,
    pub name: String,
    pub version: String,
    pub vendor: String,
    pub installer_type: String,
    pub submitted_by: String,
    pub submitted_on: String,
    pub descriptor_text: String,
}

/// Build a submission record from descriptor text.
///
/// `PRODUCT INFO` supplies identity (`APPKEYID` is mandatory); the first
/// install-step section supplies installer type and file. The full
/// descriptor text is embedded so the record is self-contained for
/// cross-operator browsing.
pub fn record_from_descriptor(
    text: &str,
    operator: &str,
    submitted_on: &str,
) -> Result<PackageRecord, ConsoleError> {
    let parsed = parse::parse(text);
    let descriptor = &parsed.descriptor;

    let product = descriptor.section("PRODUCT INFO").ok_or_else(|| {
        ConsoleError::NotFound("section 'PRODUCT INFO' in descriptor".to_string())
    })?;

    let key = product
        .get("APPKEYID")
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            ConsoleError::NotFound("key 'APPKEYID' in section 'PRODUCT INFO'".to_string())
        })?
        .to_string();

    let install = descriptor.section("INSTALL1").or_else(|| {
        descriptor
            .sections()
            .iter()
            .find(|s| s.name().to_ascii_uppercase().starts_with("INSTALL"))
    });

    let field = |name: &str| product.get(name).unwrap_or("").to_string();

    Ok(PackageRecord {
        key,
        name: field("APPNAME"),
        version: field("APPVER"),
        vendor: field("APPVENDOR"),
        installer_type: install
            .and_then(|s| s.get("TYPE"))
            .unwrap_or("")
            .to_string(),
        installer_file: install
            .and_then(|s| s.get("MSI").or_else(|| s.get("EXE")))
            .unwrap_or("")
            .to_string(),
        submitted_by: operator.to_string(),
        submitted_on: submitted_on.to_string(),
        descriptor_text: text.to_string(),
    })
}
