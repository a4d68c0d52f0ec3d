use super::*;
use crate::registry::TECHNOLOGIES;
use crate::security::FORBIDDEN_PATTERNS;
use proptest::prelude::*;
use std::path::MAIN_SEPARATOR;
use std::sync::OnceLock;
use tempfile::TempDir;

/// One sandbox shared by every case; resolution never writes to it
fn shared_resolver() -> &'static PathResolver {
    static SANDBOX: OnceLock<(TempDir, PathResolver)> = OnceLock::new();
    let (_, resolver) = SANDBOX.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        for entry in TECHNOLOGIES {
            std::fs::create_dir_all(dir.path().join(entry.key)).unwrap();
        }
        let root = SandboxRoot::open(dir.path()).unwrap();
        (dir, PathResolver::new(TechnologyRegistry::new(), root))
    });
    resolver
}

fn arb_technology() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(TECHNOLOGIES.iter().map(|e| e.key).collect::<Vec<_>>())
            .prop_map(String::from),
        // Random casing of known keys
        (
            prop::sample::select(TECHNOLOGIES.iter().map(|e| e.key).collect::<Vec<_>>()),
            prop::collection::vec(any::<bool>(), 16)
        )
            .prop_map(|(key, upper)| {
                key.chars()
                    .zip(upper)
                    .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c })
                    .collect::<String>()
            }),
        "[a-zA-Z]{0,10}",
    ]
}

fn arb_filename() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9_.%/\\\\-]{0,24}",
        "[a-z_]{1,12}\\.(php|asp|aspx|jsp|py|pl|cgi|cfm|sh|PHP|Py|txt)",
        any::<String>(),
    ]
}

fn arb_pattern() -> impl Strategy<Value = &'static str> {
    prop::sample::select(FORBIDDEN_PATTERNS.to_vec())
}

fn random_case(s: &str, mask: &[bool]) -> String {
    s.chars()
        .zip(mask.iter().cycle())
        .map(|(c, &up)| if up { c.to_ascii_uppercase() } else { c })
        .collect()
}

proptest! {
    #[test]
    fn accepted_paths_are_strict_descendants(
        technology in arb_technology(),
        filename in arb_filename(),
    ) {
        let resolver = shared_resolver();
        if let Ok(resolved) = resolver.resolve(&technology, &filename) {
            let root = resolver.root().path().to_str().unwrap().to_string();
            let path = resolved.path().to_str().unwrap().to_string();
            let prefix = format!("{}{}", root.trim_end_matches(MAIN_SEPARATOR), MAIN_SEPARATOR);

            prop_assert!(path.starts_with(&prefix));
            prop_assert!(path.len() > prefix.len());
            prop_assert_eq!(resolved.technology(), technology.to_lowercase());
            let tech_dir = resolver.root().technology_dir(&technology.to_lowercase());
            prop_assert_eq!(resolved.path().parent(), Some(tech_dir.as_path()));
        }
    }

    #[test]
    fn forbidden_patterns_always_rejected(
        technology in arb_technology(),
        prefix in "[a-z]{0,6}",
        suffix in "[a-z]{0,6}(\\.php|\\.py|\\.sh)?",
        pattern in arb_pattern(),
        mask in prop::collection::vec(any::<bool>(), 1..8),
    ) {
        let resolver = shared_resolver();
        let filename = format!("{}{}{}", prefix, random_case(pattern, &mask), suffix);
        let result = resolver.resolve(&technology, &filename);

        if resolver.registry().is_allowed_technology(&technology) {
            prop_assert!(
                matches!(result, Err(RejectionReason::ForbiddenPattern { .. })),
                "{:?} gave {:?}", filename, result
            );
        } else {
            prop_assert_eq!(result, Err(RejectionReason::UnknownTechnology));
        }
    }

    #[test]
    fn dot_files_always_rejected(
        technology in prop::sample::select(TECHNOLOGIES.iter().map(|e| e.key).collect::<Vec<_>>()),
        rest in "[a-z]{1,8}(\\.php|\\.sh)?",
    ) {
        let resolver = shared_resolver();
        let filename = format!(".{}", rest);
        prop_assert_eq!(
            resolver.resolve(technology, &filename),
            Err(RejectionReason::HiddenFile)
        );
    }

    #[test]
    fn resolution_is_idempotent(
        technology in arb_technology(),
        filename in arb_filename(),
    ) {
        let resolver = shared_resolver();
        prop_assert_eq!(
            resolver.resolve(&technology, &filename),
            resolver.resolve(&technology, &filename)
        );
    }

    #[test]
    fn unknown_technologies_short_circuit(
        technology in "[a-z]{1,10}",
        filename in arb_filename(),
    ) {
        let resolver = shared_resolver();
        prop_assume!(!resolver.registry().is_allowed_technology(&technology));
        prop_assert_eq!(
            resolver.resolve(&technology, &filename),
            Err(RejectionReason::UnknownTechnology)
        );
    }
}
