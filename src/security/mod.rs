mod path;

pub use path::{FORBIDDEN_PATTERNS, PathSanitizer};
