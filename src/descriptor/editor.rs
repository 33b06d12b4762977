//! The editable descriptor session.
//!
//! One open descriptor file, its parsed model, the load-time raw lines, and
//! bounded undo/redo history. Every mutating call runs snapshot → mutate →
//! durable save, so the on-disk file and the in-memory model are consistent
//! before the call returns. Callers serialize access; the editor is a plain
//! owned value with no internal locking.

use crate::core::config::MergePolicy;
use crate::core::error::ConsoleError;
use crate::descriptor::history::History;
use crate::descriptor::merge::{self, MergeReport};
use crate::descriptor::model::Descriptor;
use crate::descriptor::parse::{self, Parsed, SkippedLine};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct DescriptorEditor {
    path: PathBuf,
    descriptor: Descriptor,
    raw: Vec<String>,
    skipped: Vec<SkippedLine>,
    history: History,
}

impl DescriptorEditor {
    pub fn open(path: &Path) -> Result<Self, ConsoleError> {
        if !path.exists() {
            return Err(ConsoleError::NotFound(format!(
                "descriptor file '{}'",
                path.display()
            )));
        }
        let text = fs::read_to_string(path).map_err(ConsoleError::IoError)?;
        let Parsed {
            descriptor,
            raw,
            skipped,
        } = parse::parse(&text);
        Ok(Self {
            path: path.to_path_buf(),
            descriptor,
            raw,
            skipped,
            history: History::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Lines the parser could not classify at load time.
    pub fn parse_warnings(&self) -> &[SkippedLine] {
        &self.skipped
    }

    pub fn section_names(&self) -> Vec<String> {
        self.descriptor.section_names()
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.descriptor.has_section(name)
    }

    pub fn entries(&self, name: &str) -> Option<Vec<(String, String)>> {
        self.descriptor.entries(name)
    }

    pub fn next_section_name(&self, base: &str) -> String {
        self.descriptor.next_section_name(base)
    }

    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.history.redo_depth()
    }

    /// Persist the current model. Whole-file replace; values verbatim.
    pub fn save(&self) -> Result<(), ConsoleError> {
        fs::write(&self.path, parse::serialize(&self.descriptor)).map_err(ConsoleError::IoError)
    }

    /// Re-render the current in-memory state for display.
    pub fn refresh(&self) -> String {
        parse::serialize(&self.descriptor)
    }

    fn commit(&mut self, before: Descriptor) -> Result<(), ConsoleError> {
        self.history.record(before);
        self.save()
    }

    /// Wholesale replacement of a section's entries; creates the section
    /// when absent.
    pub fn replace_section(
        &mut self,
        name: &str,
        pairs: &[(String, String)],
    ) -> Result<(), ConsoleError> {
        if name.trim().is_empty() {
            return Err(ConsoleError::FormatError(
                "section name must not be blank".to_string(),
            ));
        }
        let before = self.descriptor.clone();
        self.descriptor.replace_entries(name, pairs);
        self.commit(before)
    }

    /// Replace the entire section list in the given order.
    pub fn replace_all(
        &mut self,
        sections: Vec<(String, Vec<(String, String)>)>,
    ) -> Result<(), ConsoleError> {
        let before = self.descriptor.clone();
        self.descriptor.replace_all(sections);
        self.commit(before)
    }

    /// Copy an existing section under a new name, inserted immediately
    /// after the source. Errors leave model and file untouched.
    pub fn create_section_from(
        &mut self,
        source: &str,
        new_name: &str,
    ) -> Result<(), ConsoleError> {
        let before = self.descriptor.clone();
        self.descriptor.create_from(source, new_name)?;
        self.commit(before)
    }

    /// Add the next numbered section for `prefix`, cloning the
    /// highest-numbered sibling when one exists. Returns the new name.
    pub fn add_section_for_prefix(&mut self, prefix: &str) -> Result<String, ConsoleError> {
        let new_name = self.descriptor.next_section_name(prefix);
        let source = self
            .descriptor
            .latest_for_prefix(prefix)
            .map(|s| s.name().to_string());
        let before = self.descriptor.clone();
        match source {
            Some(source) => self.descriptor.create_from(&source, &new_name)?,
            None => self.descriptor.replace_entries(&new_name, &[]),
        }
        self.commit(before)?;
        Ok(new_name)
    }

    /// Upsert entries into an existing section.
    pub fn merge_entries(
        &mut self,
        section: &str,
        pairs: &[(String, String)],
    ) -> Result<(), ConsoleError> {
        let before = self.descriptor.clone();
        self.descriptor.merge_entries(section, pairs)?;
        self.commit(before)
    }

    pub fn remove_section(&mut self, name: &str) -> Result<(), ConsoleError> {
        let before = self.descriptor.clone();
        self.descriptor.remove_section(name)?;
        self.commit(before)
    }

    pub fn remove_key(&mut self, section: &str, key: &str) -> Result<(), ConsoleError> {
        let before = self.descriptor.clone();
        self.descriptor.remove_key(section, key)?;
        self.commit(before)
    }

    pub fn undo(&mut self) -> Result<(), ConsoleError> {
        match self.history.undo(&self.descriptor) {
            Some(previous) => {
                self.descriptor = previous;
                self.save()
            }
            None => Err(ConsoleError::StaleHistory(
                "undo history is empty".to_string(),
            )),
        }
    }

    pub fn redo(&mut self) -> Result<(), ConsoleError> {
        match self.history.redo(&self.descriptor) {
            Some(next) => {
                self.descriptor = next;
                self.save()
            }
            None => Err(ConsoleError::StaleHistory(
                "redo history is empty".to_string(),
            )),
        }
    }

    /// Fold an auxiliary descriptor into this one and delete the source.
    ///
    /// The whole merge is one undo step. Deleting the auxiliary after a
    /// successful merge is best-effort: the merge result is already
    /// durable, so a leftover file only means the next merge re-applies.
    pub fn merge_auxiliary(
        &mut self,
        aux_path: &Path,
        policy: &MergePolicy,
    ) -> Result<MergeReport, ConsoleError> {
        if !aux_path.exists() {
            return Err(ConsoleError::NotFound(format!(
                "auxiliary descriptor '{}'",
                aux_path.display()
            )));
        }
        let text = fs::read_to_string(aux_path).map_err(ConsoleError::IoError)?;
        let aux = parse::parse(&text);
        for skip in &aux.skipped {
            eprintln!("Warning: {} in '{}'", skip.describe(), aux_path.display());
        }

        let before = self.descriptor.clone();
        let report = merge::merge_descriptor(&mut self.descriptor, &aux.descriptor, policy);
        self.commit(before)?;

        if let Err(e) = fs::remove_file(aux_path) {
            eprintln!(
                "Warning: could not delete '{}' after merge: {}",
                aux_path.display(),
                e
            );
        }
        Ok(report)
    }

    /// Auto-merge entry point: no-op when the auxiliary file is absent.
    pub fn merge_auxiliary_if_present(
        &mut self,
        aux_path: &Path,
        policy: &MergePolicy,
    ) -> Result<Option<MergeReport>, ConsoleError> {
        if !aux_path.exists() {
            return Ok(None);
        }
        self.merge_auxiliary(aux_path, policy).map(Some)
    }

    /// Rewrite `path` keeping the load-time layout: comments, blanks and
    /// unrecognized lines verbatim, recognized keys updated in place.
    pub fn write_preserving_layout(&self, path: &Path) -> Result<(), ConsoleError> {
        fs::write(path, parse::render_preserving(&self.raw, &self.descriptor))
            .map_err(ConsoleError::IoError)
    }
}
