use tokio::fs::File;

/// An opened payload, ready to be streamed
#[derive(Debug)]
pub struct PayloadFile {
    /// Lower-case technology key
    pub technology: &'static str,
    /// Filename as requested
    pub filename: String,
    /// MIME type for the technology
    pub content_type: &'static str,
    /// Size in bytes at open time
    pub length: u64,
    /// Open handle positioned at the start
    pub file: File,
}
