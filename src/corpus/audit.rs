use crate::registry::TechnologyRegistry;
use crate::sandbox::SandboxRoot;
use crate::security::PathSanitizer;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Summary of the payload corpus found at startup
#[derive(Debug, Default, Clone, Serialize)]
pub struct CorpusReport {
    /// Servable payload count per technology
    pub payloads: BTreeMap<&'static str, usize>,
    /// Registered technologies without a directory
    pub missing_technologies: Vec<&'static str>,
    /// Symlinks found anywhere under the root
    pub symlinks: Vec<PathBuf>,
    /// Entries that no request can ever reach
    pub unservable: Vec<PathBuf>,
}

impl CorpusReport {
    pub fn total_payloads(&self) -> usize {
        self.payloads.values().sum()
    }
}

/// Walk the sandbox root and report what can be served
///
/// Informational only: nothing here blocks startup, and the resolver
/// re-checks every request regardless.
pub fn audit(root: &SandboxRoot, registry: &TechnologyRegistry) -> CorpusReport {
    let mut report = CorpusReport::default();

    for entry in WalkDir::new(root.path()).min_depth(1).max_depth(2) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Failed to read corpus entry");
                continue;
            }
        };

        let path = entry.path().to_path_buf();
        let file_type = entry.file_type();
        let name = entry.file_name().to_string_lossy().into_owned();

        if file_type.is_symlink() {
            warn!(path = %path.display(), "Symlink in payload corpus");
            report.symlinks.push(path.clone());
        }

        if entry.depth() == 1 {
            match registry.lookup(&name) {
                Some(tech) if tech.key == name && file_type.is_dir() => {
                    report.payloads.entry(tech.key).or_insert(0);
                }
                _ => {
                    warn!(path = %path.display(), "Entry outside any technology directory");
                    report.unservable.push(path);
                }
            }
            continue;
        }

        // depth 2: payload candidates inside a technology directory
        let Some(technology) = path
            .parent()
            .and_then(|dir| dir.file_name())
            .and_then(|dir| dir.to_str())
            .and_then(|dir| registry.lookup(dir).filter(|tech| tech.key == dir))
        else {
            continue;
        };

        let servable = !file_type.is_dir()
            && PathSanitizer::forbidden_pattern(&name).is_none()
            && !PathSanitizer::is_hidden(&name)
            && registry.is_allowed_extension(technology.key, &name)
            && (!file_type.is_symlink() || link_stays_home(root, technology.key, &path));

        if servable {
            debug!(technology = technology.key, filename = %name, "Payload registered");
            *report.payloads.entry(technology.key).or_insert(0) += 1;
        } else {
            warn!(
                technology = technology.key,
                path = %path.display(),
                "Payload can never be served"
            );
            report.unservable.push(path);
        }
    }

    for key in registry.technologies() {
        if !report.payloads.contains_key(key) {
            warn!(technology = key, "Technology directory missing");
            report.missing_technologies.push(key);
        }
    }

    info!(
        root = %root.path().display(),
        payloads = report.total_payloads(),
        symlinks = report.symlinks.len(),
        unservable = report.unservable.len(),
        "Payload corpus audited"
    );

    report
}

/// A payload symlink is only served when it resolves to a regular file in
/// its own technology directory
fn link_stays_home(root: &SandboxRoot, technology: &str, link: &Path) -> bool {
    let home = root.technology_dir(technology);
    root.canonicalize(link)
        .map(|target| target.is_file() && target.parent() == Some(home.as_path()))
        .unwrap_or(false)
}
