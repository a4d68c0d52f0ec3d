// Public API exports
pub mod config;
pub mod corpus;
pub mod registry;
pub mod resolver;
pub mod sandbox;
pub mod security;
pub mod server;
pub mod telemetry;

// Re-export main types for convenience
pub use config::{Config, Environment};
pub use corpus::{CorpusError, CorpusReport, PayloadFile};
pub use registry::{TECHNOLOGIES, TechnologyEntry, TechnologyRegistry};
pub use resolver::{PathResolver, RejectionReason, ResolvedPath, Stage};
pub use sandbox::{SandboxError, SandboxRoot};
pub use security::{FORBIDDEN_PATTERNS, PathSanitizer};
pub use server::{ApiError, AppState, RateLimitConfig, RateLimiter, ServerSettings};
pub use telemetry::{LogBroadcaster, LogRecord};
