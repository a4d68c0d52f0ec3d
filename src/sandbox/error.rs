use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Sandbox root {path} could not be resolved: {source}")]
    RootUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Sandbox root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Sandbox root is not valid UTF-8: {0}")]
    NonUtf8Root(PathBuf),
}
