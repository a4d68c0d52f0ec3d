use serde::Serialize;

/// A technology served by the sandbox, keyed by its directory name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TechnologyEntry {
    /// Lower-case key, also the subdirectory name under the sandbox root
    pub key: &'static str,
    /// Allowed extensions, lower-case with a leading dot
    pub extensions: &'static [&'static str],
    /// MIME type sent with payloads of this technology
    pub content_type: &'static str,
}

/// Built-in technology table
pub static TECHNOLOGIES: &[TechnologyEntry] = &[
    TechnologyEntry {
        key: "php",
        extensions: &[".php"],
        content_type: "text/x-php",
    },
    TechnologyEntry {
        key: "asp",
        extensions: &[".asp", ".aspx"],
        content_type: "text/x-asp",
    },
    TechnologyEntry {
        key: "jsp",
        extensions: &[".jsp"],
        content_type: "text/x-jsp",
    },
    TechnologyEntry {
        key: "python",
        extensions: &[".py"],
        content_type: "text/x-python",
    },
    TechnologyEntry {
        key: "perl",
        extensions: &[".pl", ".cgi"],
        content_type: "text/x-perl",
    },
    TechnologyEntry {
        key: "coldfusion",
        extensions: &[".cfm"],
        content_type: "text/x-coldfusion",
    },
    TechnologyEntry {
        key: "shell",
        extensions: &[".sh"],
        content_type: "text/x-shellscript",
    },
];
