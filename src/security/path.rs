use std::path::{Component, Path};

/// Substrings that may never appear in a lower-cased filename
///
/// Order matters: the first match is the one reported.
pub const FORBIDDEN_PATTERNS: &[&str] = &["..", "/", "\\", "\0", "%2e", "%2f", "%5c", "%00"];

pub struct PathSanitizer;

impl PathSanitizer {
    /// Scan a filename for traversal and injection sequences:
    /// - Parent directory tokens (`..`)
    /// - Path separators (`/` and `\`)
    /// - Null bytes
    /// - Residual percent-encodings of any of the above
    ///
    /// The scan runs on the lower-cased filename so `%2E` and `%2e` are the
    /// same. Returns the first forbidden pattern found.
    pub fn forbidden_pattern(filename: &str) -> Option<&'static str> {
        let lowered = filename.to_lowercase();
        FORBIDDEN_PATTERNS
            .iter()
            .copied()
            .find(|pattern| lowered.contains(pattern))
    }

    /// Dot-files, including `.` itself
    pub fn is_hidden(filename: &str) -> bool {
        filename.starts_with('.')
    }

    /// True iff the filename is exactly one normal path component
    ///
    /// Rejects absolute paths, prefixes, `.` and `..` components, and
    /// anything the platform splits into more than one component.
    pub fn is_single_component(filename: &str) -> bool {
        if filename.is_empty() {
            return false;
        }

        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => part == filename,
            _ => false,
        }
    }
}
