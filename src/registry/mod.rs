mod table;


pub use table::{TECHNOLOGIES, TechnologyEntry};

use std::collections::HashMap;

/// Fallback content type for a technology with no MIME entry
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Lookup table from technology key to its allowed extensions and MIME type
///
/// Built once from the constant [`TECHNOLOGIES`] table and never mutated.
/// Every method is a pure query: unknown input yields `false` or an empty
/// answer, never an error.
#[derive(Debug, Clone)]
pub struct TechnologyRegistry {
    map: HashMap<&'static str, &'static TechnologyEntry>,
}

impl TechnologyRegistry {
    /// Create a registry over the built-in technology table
    pub fn new() -> Self {
        Self::from_entries(TECHNOLOGIES)
    }

    /// Create a registry over an explicit table
    pub fn from_entries(entries: &'static [TechnologyEntry]) -> Self {
        Self {
            map: entries.iter().map(|entry| (entry.key, entry)).collect(),
        }
    }

    /// Look up a technology, case-insensitively
    pub fn lookup(&self, key: &str) -> Option<&'static TechnologyEntry> {
        self.map.get(key.to_lowercase().as_str()).copied()
    }

    /// True iff `key.to_lowercase()` names a registered technology
    pub fn is_allowed_technology(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// True iff the filename's extension is allowed for the technology
    ///
    /// A filename without a `.` has the empty extension, which no
    /// technology allows.
    pub fn is_allowed_extension(&self, key: &str, filename: &str) -> bool {
        let ext = extension_of(filename);
        self.lookup(key)
            .map(|entry| entry.extensions.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    /// Allowed extensions for a technology, empty if unknown
    pub fn extensions_for(&self, key: &str) -> &'static [&'static str] {
        self.lookup(key).map(|entry| entry.extensions).unwrap_or(&[])
    }

    /// MIME type served for a technology's payloads
    pub fn content_type_for(&self, key: &str) -> &'static str {
        self.lookup(key)
            .map(|entry| entry.content_type)
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    /// All registered technology keys, sorted
    pub fn technologies(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self.map.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// All registered entries, sorted by key
    pub fn entries(&self) -> Vec<&'static TechnologyEntry> {
        let mut entries: Vec<_> = self.map.values().copied().collect();
        entries.sort_unstable_by_key(|entry| entry.key);
        entries
    }

    /// Number of registered technologies
    pub fn technology_count(&self) -> usize {
        self.map.len()
    }
}

impl Default for TechnologyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Extension of a filename: everything from the last `.`, lower-cased
///
/// Returns an empty string when the filename has no `.`.
pub fn extension_of(filename: &str) -> String {
    filename
        .rfind('.')
        .map(|idx| filename[idx..].to_lowercase())
        .unwrap_or_default()
}
