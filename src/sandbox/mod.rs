mod error;


pub use error::SandboxError;

use std::ffi::OsString;
use std::io;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

/// Canonical directory that every served payload descends from
///
/// Resolved once at startup. Holds one subdirectory per technology key.
#[derive(Debug, Clone)]
pub struct SandboxRoot {
    /// Canonical absolute path of the root
    path: PathBuf,
    /// Root rendered as a string with a trailing separator
    prefix: String,
}

impl SandboxRoot {
    /// Canonicalize and validate the sandbox root
    ///
    /// The directory must exist and its canonical path must be UTF-8, since
    /// containment is proven by a string-prefix test.
    pub fn open(raw_path: impl AsRef<Path>) -> Result<Self, SandboxError> {
        let raw_path = raw_path.as_ref();
        let path = std::fs::canonicalize(raw_path).map_err(|source| {
            SandboxError::RootUnavailable {
                path: raw_path.to_path_buf(),
                source,
            }
        })?;

        if !path.is_dir() {
            return Err(SandboxError::NotADirectory(path));
        }

        let root = path
            .to_str()
            .ok_or_else(|| SandboxError::NonUtf8Root(path.clone()))?;
        let prefix = if root.ends_with(MAIN_SEPARATOR) {
            root.to_string()
        } else {
            format!("{}{}", root, MAIN_SEPARATOR)
        };

        Ok(Self { path, prefix })
    }

    /// Canonical root path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding a technology's payloads
    pub fn technology_dir(&self, technology: &str) -> PathBuf {
        self.path.join(technology)
    }

    /// Join a technology and filename under the root, without any checks
    pub fn candidate(&self, technology: &str, filename: &str) -> PathBuf {
        self.technology_dir(technology).join(filename)
    }

    /// Strict-descendant test on the string form of a path
    ///
    /// The path must begin with the root followed immediately by a
    /// separator, and name something below it.
    pub fn contains(&self, path: &Path) -> bool {
        path.to_str()
            .map(|s| s.starts_with(&self.prefix) && s.len() > self.prefix.len())
            .unwrap_or(false)
    }

    /// Resolve a candidate to its canonical absolute form
    ///
    /// Symlinks are followed for every part of the path that exists. The
    /// part that does not exist yet is appended to the deepest existing
    /// ancestor and normalized lexically. A dangling symlink is an error.
    pub fn canonicalize(&self, candidate: &Path) -> io::Result<PathBuf> {
        canonicalize_lenient(candidate)
    }
}

fn canonicalize_lenient(path: &Path) -> io::Result<PathBuf> {
    let mut missing: Vec<OsString> = Vec::new();
    let mut cursor = path;

    loop {
        match std::fs::canonicalize(cursor) {
            Ok(base) => {
                let mut resolved = base;
                resolved.extend(missing.iter().rev());
                return Ok(path_clean::clean(&resolved));
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                // A dangling symlink exists but has no target to verify
                if std::fs::symlink_metadata(cursor).is_ok() {
                    return Err(err);
                }
                let (Some(name), Some(parent)) = (cursor.file_name(), cursor.parent()) else {
                    return Err(err);
                };
                missing.push(name.to_os_string());
                cursor = parent;
            }
            Err(err) => return Err(err),
        }
    }
}
