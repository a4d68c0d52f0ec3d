use super::RejectionReason;
use crate::registry::TechnologyRegistry;
use crate::security::PathSanitizer;

/// The raw request segments, as seen by every lexical stage
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub technology: &'a str,
    pub filename: &'a str,
}

impl<'a> Candidate<'a> {
    pub fn new(technology: &'a str, filename: &'a str) -> Self {
        Self {
            technology,
            filename,
        }
    }
}

/// A pattern-based check run before any path is built
///
/// Each stage closes one attack class and assumes every earlier stage has
/// passed. The containment proof that follows them lives in
/// [`PathResolver`](super::PathResolver) since it is the only step that
/// touches the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Technology key is present and registered
    Technology,
    /// Filename is non-empty
    FilenamePresent,
    /// No traversal, separator, null byte, or their encodings
    ForbiddenPattern,
    /// Not a dot-file
    NotHidden,
    /// Extension is allowed for the technology
    Extension,
}

impl Stage {
    /// Lexical stages in required order
    pub const PIPELINE: [Stage; 5] = [
        Stage::Technology,
        Stage::FilenamePresent,
        Stage::ForbiddenPattern,
        Stage::NotHidden,
        Stage::Extension,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Technology => "technology",
            Stage::FilenamePresent => "filename_present",
            Stage::ForbiddenPattern => "forbidden_pattern",
            Stage::NotHidden => "not_hidden",
            Stage::Extension => "extension",
        }
    }

    /// Run this stage alone
    pub fn check(
        &self,
        registry: &TechnologyRegistry,
        candidate: &Candidate<'_>,
    ) -> Result<(), RejectionReason> {
        match self {
            Stage::Technology => {
                if candidate.technology.is_empty()
                    || !registry.is_allowed_technology(candidate.technology)
                {
                    return Err(RejectionReason::UnknownTechnology);
                }
            }
            Stage::FilenamePresent => {
                if candidate.filename.is_empty() {
                    return Err(RejectionReason::MissingFilename);
                }
            }
            Stage::ForbiddenPattern => {
                if let Some(pattern) = PathSanitizer::forbidden_pattern(candidate.filename) {
                    return Err(RejectionReason::ForbiddenPattern { pattern });
                }
            }
            Stage::NotHidden => {
                if PathSanitizer::is_hidden(candidate.filename) {
                    return Err(RejectionReason::HiddenFile);
                }
            }
            Stage::Extension => {
                if !registry.is_allowed_extension(candidate.technology, candidate.filename) {
                    return Err(RejectionReason::ExtensionMismatch);
                }
            }
        }

        Ok(())
    }
}
