//! Line-oriented descriptor parsing and rendering.
//!
//! Parsing is best-effort by design: lines that cannot be classified are
//! recorded and skipped so one stray line never makes a whole descriptor
//! unreadable. The raw line list is kept alongside the structured model for
//! verbatim display and for the layout-preserving save path.

use crate::descriptor::model::Descriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A `key=value` line before any section header.
    OutsideSection,
    /// Neither a section header nor a `key=value` pair.
    Malformed,
    /// `=value` with nothing before the separator.
    EmptyKey,
}

#[derive(Debug, Clone)]
pub struct SkippedLine {
    pub line_no: usize,
    pub content: String,
    pub reason: SkipReason,
}

impl SkippedLine {
    pub fn describe(&self) -> String {
        let what = match self.reason {
            SkipReason::OutsideSection => "entry outside any section",
            SkipReason::Malformed => "unrecognized line",
            SkipReason::EmptyKey => "missing key before '='",
        };
        format!("line {}: {} ({})", self.line_no, what, self.content.trim())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Parsed {
    pub descriptor: Descriptor,
    /// Every input line verbatim, for raw display and layout-preserving saves.
    pub raw: Vec<String>,
    pub skipped: Vec<SkippedLine>,
}

/// Best-effort parse. Duplicate section headers reopen the existing
/// section; duplicate keys within a section overwrite in place.
pub fn parse(text: &str) -> Parsed {
    let mut parsed = Parsed::default();
    let mut in_section = false;
    let mut current = String::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        parsed.raw.push(line.to_string());

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(name) = header_name(trimmed) {
            if name.is_empty() {
                parsed.skipped.push(SkippedLine {
                    line_no,
                    content: line.to_string(),
                    reason: SkipReason::Malformed,
                });
                continue;
            }
            parsed.descriptor.open_section(name);
            current = name.to_string();
            in_section = true;
        } else if let Some((key, value)) = trimmed.split_once('=') {
            if !in_section {
                parsed.skipped.push(SkippedLine {
                    line_no,
                    content: line.to_string(),
                    reason: SkipReason::OutsideSection,
                });
                continue;
            }
            let key = key.trim();
            if key.is_empty() {
                parsed.skipped.push(SkippedLine {
                    line_no,
                    content: line.to_string(),
                    reason: SkipReason::EmptyKey,
                });
                continue;
            }
            parsed
                .descriptor
                .open_section(&current)
                .set(key, value.trim());
        } else {
            parsed.skipped.push(SkippedLine {
                line_no,
                content: line.to_string(),
                reason: SkipReason::Malformed,
            });
        }
    }

    parsed
}

fn header_name(trimmed: &str) -> Option<&str> {
    if trimmed.len() >= 2 && trimmed.starts_with('[') && trimmed.ends_with(']') {
        Some(trimmed[1..trimmed.len() - 1].trim())
    } else {
        None
    }
}

/// Render the structured model: one blank line between sections, entries in
/// current order, values verbatim (no quoting, no escaping).
pub fn serialize(descriptor: &Descriptor) -> String {
    let blocks: Vec<String> = descriptor
        .sections()
        .iter()
        .map(|section| {
            let mut block = format!("[{}]\n", section.name());
            for entry in section.entries() {
                block.push_str(&entry.key);
                block.push('=');
                block.push_str(&entry.value);
                block.push('\n');
            }
            block
        })
        .collect();
    blocks.join("\n")
}

/// Render against the original raw lines: comments, blanks, and unknown
/// lines pass through verbatim; recognized `key=value` lines whose section
/// and key still exist in the model are rewritten with the current value.
/// Sections or keys added after parsing do not appear here.
pub fn render_preserving(raw: &[String], descriptor: &Descriptor) -> String {
    let mut out = String::new();
    let mut current: Option<String> = None;

    for line in raw {
        let trimmed = line.trim();
        if trimmed.starts_with(';') || trimmed.is_empty() {
            out.push_str(line);
            out.push('\n');
            continue;
        }
        if let Some(name) = header_name(trimmed) {
            current = Some(name.to_string());
            out.push_str(line);
            out.push('\n');
            continue;
        }
        let rewritten = trimmed.split_once('=').and_then(|(key, _)| {
            let section = descriptor.section(current.as_deref()?)?;
            let value = section.get(key.trim())?;
            Some(format!("{}={}", key.trim(), value))
        });
        match rewritten {
            Some(updated) => out.push_str(&updated),
            None => out.push_str(line),
        }
        out.push('\n');
    }

    out
}
