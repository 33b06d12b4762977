//! In-memory descriptor model: an ordered list of sections, each an ordered
//! list of key/value entries.
//!
//! Section order is semantically significant (it determines merge insertion
//! points and render order), so the model is Vec-backed rather than
//! map-backed. Section names are unique case-insensitively; entry keys are
//! unique case-sensitively within their section.

use crate::core::error::ConsoleError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    entries: Vec<Entry>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Case-sensitive key lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    /// Upsert: an existing key keeps its position, a new key appends.
    pub fn set(&mut self, key: &str, value: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
            entry.value = value.to_string();
        } else {
            self.entries.push(Entry {
                key: key.to_string(),
                value: value.to_string(),
            });
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.key != key);
        self.entries.len() != before
    }

    pub fn pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|e| (e.key.clone(), e.value.clone()))
            .collect()
    }

    pub fn replace_entries(&mut self, pairs: &[(String, String)]) {
        self.entries.clear();
        for (key, value) in pairs {
            self.set(key, value);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptor {
    sections: Vec<Section>,
}

impl Descriptor {
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        self.sections
            .iter()
            .position(|s| s.name.trim().eq_ignore_ascii_case(wanted))
    }

    /// Index of a section in render order, for ordered insertion.
    pub(crate) fn position_of(&self, name: &str) -> Option<usize> {
        self.position(name)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.position(name).map(|idx| &self.sections[idx])
    }

    pub fn section_names(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.name.clone()).collect()
    }

    pub fn entries(&self, name: &str) -> Option<Vec<(String, String)>> {
        self.section(name).map(Section::pairs)
    }

    /// Find-or-append a section for the parser and merge paths.
    pub(crate) fn open_section(&mut self, name: &str) -> &mut Section {
        if let Some(idx) = self.position(name) {
            return &mut self.sections[idx];
        }
        self.sections.push(Section::new(name.trim()));
        self.sections.last_mut().expect("just pushed")
    }

    pub(crate) fn push_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    pub(crate) fn insert_section_at(&mut self, idx: usize, section: Section) {
        let idx = idx.min(self.sections.len());
        self.sections.insert(idx, section);
    }

    /// Wholesale entry replacement; creates the section (appended at the
    /// end) when it does not exist yet.
    pub fn replace_entries(&mut self, name: &str, pairs: &[(String, String)]) {
        self.open_section(name).replace_entries(pairs);
    }

    /// Replace the entire section list, preserving the given order.
    pub fn replace_all(&mut self, sections: Vec<(String, Vec<(String, String)>)>) {
        self.sections.clear();
        for (name, pairs) in sections {
            self.open_section(&name).replace_entries(&pairs);
        }
    }

    pub fn remove_section(&mut self, name: &str) -> Result<(), ConsoleError> {
        match self.position(name) {
            Some(idx) => {
                self.sections.remove(idx);
                Ok(())
            }
            None => Err(ConsoleError::NotFound(format!("section '{}'", name))),
        }
    }

    pub fn remove_key(&mut self, section: &str, key: &str) -> Result<(), ConsoleError> {
        let idx = self
            .position(section)
            .ok_or_else(|| ConsoleError::NotFound(format!("section '{}'", section)))?;
        if self.sections[idx].remove(key) {
            Ok(())
        } else {
            Err(ConsoleError::NotFound(format!(
                "key '{}' in section '{}'",
                key, section
            )))
        }
    }

    /// Upsert `pairs` into an existing section; the section must exist.
    pub fn merge_entries(
        &mut self,
        section: &str,
        pairs: &[(String, String)],
    ) -> Result<(), ConsoleError> {
        let idx = self
            .position(section)
            .ok_or_else(|| ConsoleError::NotFound(format!("section '{}'", section)))?;
        for (key, value) in pairs {
            self.sections[idx].set(key, value);
        }
        Ok(())
    }

    /// Copy all entries of `source` into a new section named `new_name`,
    /// inserted immediately after `source`.
    pub fn create_from(&mut self, source: &str, new_name: &str) -> Result<(), ConsoleError> {
        if self.has_section(new_name) {
            return Err(ConsoleError::Conflict(format!("section '{}'", new_name)));
        }
        let idx = self
            .position(source)
            .ok_or_else(|| ConsoleError::NotFound(format!("section '{}'", source)))?;
        let mut copy = Section::new(new_name.trim());
        copy.entries = self.sections[idx].entries.clone();
        self.insert_section_at(idx + 1, copy);
        Ok(())
    }

    /// Canonical renumbering rule for repeatable sections: take the
    /// alphabetic prefix of `base` and return `prefix{max suffix + 1}`,
    /// defaulting to `prefix1` when no numbered section exists.
    pub fn next_section_name(&self, base: &str) -> String {
        let prefix = alpha_prefix(base);
        let max = self
            .sections
            .iter()
            .filter_map(|s| suffix_number(s.name.trim(), &prefix))
            .max()
            .unwrap_or(0);
        format!("{}{}", prefix, max + 1)
    }

    /// The highest-numbered section sharing `prefix`, if any.
    pub fn latest_for_prefix(&self, prefix: &str) -> Option<&Section> {
        let prefix = alpha_prefix(prefix);
        self.sections
            .iter()
            .filter(|s| suffix_number(s.name.trim(), &prefix).is_some())
            .max_by_key(|s| suffix_number(s.name.trim(), &prefix))
    }
}

fn alpha_prefix(base: &str) -> String {
    base.trim()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect()
}

fn suffix_number(name: &str, prefix: &str) -> Option<u32> {
    if prefix.is_empty() {
        return None;
    }
    let head = name.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    name[prefix.len()..].parse::<u32>().ok()
}
