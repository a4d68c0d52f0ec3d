//! Technology-scoped path resolution under the sandbox root.
//!
//! [`PathResolver::resolve`] is the only way a request-supplied
//! `(technology, filename)` pair becomes a filesystem path. It runs the
//! lexical [`Stage::PIPELINE`] in order, then builds the candidate path and
//! proves it lies inside the [`SandboxRoot`] after canonicalization.
//!
//! Resolution is stateless and never cached: every call re-validates from
//! scratch. The final stage may block on filesystem metadata, so async
//! callers should run it on a blocking thread.

mod rejection;
mod stage;

#[cfg(test)]
mod proptests;

pub use rejection::RejectionReason;
pub use stage::{Candidate, Stage};

use crate::registry::TechnologyRegistry;
use crate::sandbox::SandboxRoot;
use crate::security::PathSanitizer;
use std::path::{Path, PathBuf};

/// A path proven to be `SandboxRoot/<technology>/<file>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    absolute_path: PathBuf,
    technology: &'static str,
    filename: String,
}

impl ResolvedPath {
    /// Canonical absolute path of the payload
    pub fn path(&self) -> &Path {
        &self.absolute_path
    }

    /// Lower-case technology key
    pub fn technology(&self) -> &'static str {
        self.technology
    }

    /// Filename as requested
    pub fn filename(&self) -> &str {
        &self.filename
    }
}

/// Decides whether a `(technology, filename)` pair may be served
#[derive(Debug, Clone)]
pub struct PathResolver {
    registry: TechnologyRegistry,
    root: SandboxRoot,
}

impl PathResolver {
    pub fn new(registry: TechnologyRegistry, root: SandboxRoot) -> Self {
        Self { registry, root }
    }

    pub fn registry(&self) -> &TechnologyRegistry {
        &self.registry
    }

    pub fn root(&self) -> &SandboxRoot {
        &self.root
    }

    /// Validate both segments and build the payload path
    ///
    /// # Errors
    /// Returns the reason of the first stage that refuses the input.
    pub fn resolve(
        &self,
        technology: &str,
        filename: &str,
    ) -> Result<ResolvedPath, RejectionReason> {
        let candidate = Candidate::new(technology, filename);
        for stage in Stage::PIPELINE {
            stage.check(&self.registry, &candidate)?;
        }

        let entry = self
            .registry
            .lookup(technology)
            .ok_or(RejectionReason::UnknownTechnology)?;
        let absolute_path = self.contain(entry.key, filename)?;

        Ok(ResolvedPath {
            absolute_path,
            technology: entry.key,
            filename: filename.to_string(),
        })
    }

    /// Build the candidate and prove it canonically lies in its technology
    /// directory under the root
    ///
    /// Runs even when every lexical stage passed. Canonicalization errors
    /// fail closed.
    fn contain(&self, technology: &str, filename: &str) -> Result<PathBuf, RejectionReason> {
        if !PathSanitizer::is_single_component(filename) {
            return Err(RejectionReason::ContainmentFailure);
        }

        let candidate = self.root.candidate(technology, filename);
        let canonical = self
            .root
            .canonicalize(&candidate)
            .map_err(|_| RejectionReason::ContainmentFailure)?;

        if !self.root.contains(&canonical) {
            return Err(RejectionReason::ContainmentFailure);
        }

        // Symlinks may only stay within the technology's own directory
        let expected_dir = self.root.technology_dir(technology);
        if canonical.parent() != Some(expected_dir.as_path()) {
            return Err(RejectionReason::ContainmentFailure);
        }

        Ok(canonical)
    }
}
