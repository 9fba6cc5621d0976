//! Minimal sectioned key-value text document.
//!
//! The persisted format is a classic `.ini` shape: `[section]` headers,
//! `key=value` scalar entries, and free-form lines (the rule pairs are whole
//! lines, not key/value entries). Blank lines and `;`/`#` comments are
//! dropped on parse.

use std::fs;
use std::io;
use std::path::Path;

/// An in-memory sectioned document, preserving section and line order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDoc {
    sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    lines: Vec<String>,
}

impl IniDoc {
    pub fn new() -> Self {
        IniDoc::default()
    }

    /// Parses the document text. Lines before the first section header are
    /// ignored, as are blanks and comment lines.
    pub fn parse(text: &str) -> Self {
        let mut doc = IniDoc::new();
        let mut current: Option<usize> = None;

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current = Some(doc.section_index(name.trim()));
                continue;
            }
            if let Some(index) = current {
                doc.sections[index].lines.push(raw.to_string());
            }
        }

        doc
    }

    /// Renders the document back to text, newline-terminated.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push('[');
            out.push_str(&section.name);
            out.push_str("]\n");
            for line in &section.lines {
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        Ok(IniDoc::parse(&fs::read_to_string(path)?))
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.render())
    }

    /// Returns the value of `key=value` in `section`, trimmed.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        let section = self.sections.iter().find(|s| s.name == section)?;
        section.lines.iter().find_map(|line| {
            let (k, v) = line.split_once('=')?;
            (k.trim() == key).then(|| v.trim())
        })
    }

    /// Sets `key=value` in `section`, replacing an existing entry in place
    /// and creating the section if needed.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        let index = self.section_index(section);
        let lines = &mut self.sections[index].lines;
        let entry = format!("{key}={value}");

        for line in lines.iter_mut() {
            if line.split_once('=').is_some_and(|(k, _)| k.trim() == key) {
                *line = entry;
                return;
            }
        }
        lines.push(entry);
    }

    /// Raw lines of `section`, in document order.
    pub fn lines(&self, section: &str) -> &[String] {
        self.sections
            .iter()
            .find(|s| s.name == section)
            .map(|s| s.lines.as_slice())
            .unwrap_or(&[])
    }

    /// Replaces all lines of `section` with `lines`, preserving the
    /// section's position and creating it if needed.
    pub fn replace_lines(&mut self, section: &str, lines: Vec<String>) {
        let index = self.section_index(section);
        self.sections[index].lines = lines;
    }

    fn section_index(&mut self, name: &str) -> usize {
        if let Some(index) = self.sections.iter().position(|s| s.name == name) {
            return index;
        }
        self.sections.push(Section {
            name: name.to_string(),
            lines: Vec::new(),
        });
        self.sections.len() - 1
    }
}
