//! Rule-based merge of an auxiliary descriptor into a primary one.
//!
//! Mergeable-prefixed sections are renumbered with the primary's canonical
//! renumbering rule and inserted immediately before the anchor section
//! (appended when no anchor exists). Every other section merges key-by-key
//! into a same-named primary section, or is appended when the primary has
//! no counterpart. Sections carrying the policy's exclusion marker are
//! dropped entirely.

use crate::core::config::MergePolicy;
use crate::descriptor::model::{Descriptor, Section};

#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    /// Renumbered sections inserted before the anchor, by their new names.
    pub inserted: Vec<String>,
    /// Sections merged key-by-key into an existing primary section.
    pub updated: Vec<String>,
    /// Sections appended because the primary had no counterpart.
    pub appended: Vec<String>,
    /// Sections dropped by the exclusion marker, by their original names.
    pub excluded: Vec<String>,
}

impl MergeReport {
    pub fn total_applied(&self) -> usize {
        self.inserted.len() + self.updated.len() + self.appended.len()
    }
}

pub fn merge_descriptor(
    primary: &mut Descriptor,
    aux: &Descriptor,
    policy: &MergePolicy,
) -> MergeReport {
    let mut report = MergeReport::default();

    let mut mergeable: Vec<&Section> = Vec::new();
    let mut plain: Vec<&Section> = Vec::new();

    for section in aux.sections() {
        if is_excluded(section, policy) {
            report.excluded.push(section.name().to_string());
        } else if policy.is_mergeable(section.name()) {
            mergeable.push(section);
        } else {
            plain.push(section);
        }
    }

    // Insert in ascending suffix order so renumbering keeps the auxiliary's
    // own step ordering.
    mergeable.sort_by_key(|s| mergeable_suffix(s.name(), &policy.mergeable_prefix));

    let mut insert_at = primary.position_of(&policy.anchor_section);
    for section in mergeable {
        let new_name = primary.next_section_name(&policy.mergeable_prefix);
        let renamed = copy_as(section, &new_name);
        match insert_at {
            Some(idx) => {
                primary.insert_section_at(idx, renamed);
                insert_at = Some(idx + 1);
            }
            None => primary.push_section(renamed),
        }
        report.inserted.push(new_name);
    }

    for section in plain {
        if primary.has_section(section.name()) {
            // merge_entries cannot fail here: the section was just found.
            let _ = primary.merge_entries(section.name(), &section.pairs());
            report.updated.push(section.name().to_string());
        } else {
            primary.push_section(copy_as(section, section.name()));
            report.appended.push(section.name().to_string());
        }
    }

    report
}

fn is_excluded(section: &Section, policy: &MergePolicy) -> bool {
    section
        .entries()
        .iter()
        .find(|e| e.key.eq_ignore_ascii_case(&policy.marker_key))
        .is_some_and(|e| policy.excludes_value(&e.value))
}

fn copy_as(section: &Section, name: &str) -> Section {
    let mut copy = Section::new(name);
    for entry in section.entries() {
        copy.set(&entry.key, &entry.value);
    }
    copy
}

fn mergeable_suffix(name: &str, prefix: &str) -> u32 {
    name.trim()
        .get(prefix.len()..)
        .and_then(|rest| rest.parse::<u32>().ok())
        .unwrap_or(u32::MAX)
}
