mod audit;
mod entry;
mod error;


pub use audit::{CorpusReport, audit};
pub use entry::PayloadFile;
pub use error::CorpusError;

use crate::resolver::ResolvedPath;
use std::io::ErrorKind;

/// True iff the resolved path names a regular file
///
/// Only meaningful after resolution succeeded. Any I/O error counts as
/// "does not exist".
pub fn file_exists(resolved: &ResolvedPath) -> bool {
    std::fs::metadata(resolved.path())
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// Open a resolved payload for streaming
///
/// # Errors
/// `NotFound` if the file vanished or is not a regular file, `Stream` for
/// any other I/O failure.
pub async fn open(
    resolved: &ResolvedPath,
    content_type: &'static str,
) -> Result<PayloadFile, CorpusError> {
    let not_found = || CorpusError::NotFound {
        technology: resolved.technology(),
        filename: resolved.filename().to_string(),
    };

    let file = match tokio::fs::File::open(resolved.path()).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(CorpusError::Stream(e)),
    };

    let metadata = file.metadata().await?;
    if !metadata.is_file() {
        return Err(not_found());
    }

    Ok(PayloadFile {
        technology: resolved.technology(),
        filename: resolved.filename().to_string(),
        content_type,
        length: metadata.len(),
        file,
    })
}
