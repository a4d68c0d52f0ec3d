use thiserror::Error;

/// Why a `(technology, filename)` pair was refused
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    #[error("unknown technology")]
    UnknownTechnology,

    #[error("missing filename")]
    MissingFilename,

    #[error("forbidden pattern {pattern:?} in filename")]
    ForbiddenPattern { pattern: &'static str },

    #[error("hidden file")]
    HiddenFile,

    #[error("extension does not match technology")]
    ExtensionMismatch,

    #[error("resolved path escapes the sandbox root")]
    ContainmentFailure,
}

impl RejectionReason {
    /// Stable snake_case name for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownTechnology => "unknown_technology",
            Self::MissingFilename => "missing_filename",
            Self::ForbiddenPattern { .. } => "forbidden_pattern",
            Self::HiddenFile => "hidden_file",
            Self::ExtensionMismatch => "extension_mismatch",
            Self::ContainmentFailure => "containment_failure",
        }
    }

    /// The pattern that triggered a `ForbiddenPattern` rejection
    pub fn pattern(&self) -> Option<&'static str> {
        match self {
            Self::ForbiddenPattern { pattern } => Some(pattern),
            _ => None,
        }
    }
}
