use crate::server::{RateLimitConfig, ServerSettings};
use clap::{Parser, ValueEnum};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Deployment flavour; production hides internal error details
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Development,
    Production,
}

/// Process configuration, from flags or environment variables
#[derive(Debug, Clone, Parser)]
#[command(name = "redforge-sentinel", version, about = "Sandboxed RFI/LFI payload server")]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "BIND_ADDR", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// Directory holding one subdirectory per technology
    #[arg(long, env = "FILES_ROOT", default_value = "files")]
    pub files_root: PathBuf,

    /// Tracing filter directive, e.g. `debug` or `redforge_sentinel=info`
    #[arg(long, env = "LOG_LEVEL", default_value = "debug")]
    pub log_level: String,

    /// Also append JSON log lines to this file
    #[arg(long, env = "LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Domain this service is reached at, for subdomain detection
    #[arg(long, env = "DOMAIN", default_value = "localhost")]
    pub domain: String,

    #[arg(long, env = "APP_ENV", value_enum, default_value_t = Environment::Development)]
    pub environment: Environment,

    /// Take the client IP from the first X-Forwarded-For entry
    #[arg(long, env = "TRUST_PROXY")]
    pub trust_proxy: bool,

    /// Payload requests allowed per IP per window
    #[arg(long, env = "PAYLOAD_RATE_LIMIT", default_value_t = 10)]
    pub payload_rate_limit: u32,

    #[arg(long, env = "PAYLOAD_RATE_WINDOW_SECS", default_value_t = 15 * 60)]
    pub payload_rate_window_secs: u64,

    /// Health checks allowed per IP per window
    #[arg(long, env = "HEALTH_RATE_LIMIT", default_value_t = 3)]
    pub health_rate_limit: u32,

    #[arg(long, env = "HEALTH_RATE_WINDOW_SECS", default_value_t = 10 * 60)]
    pub health_rate_window_secs: u64,
}

impl Config {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn server_settings(&self) -> ServerSettings {
        ServerSettings {
            domain: self.domain.to_lowercase(),
            trust_proxy: self.trust_proxy,
            production: self.is_production(),
        }
    }

    pub fn payload_rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.payload_rate_limit,
            window_secs: self.payload_rate_window_secs,
            message: "Too many attempts. Please try again later.",
            ..Default::default()
        }
    }

    pub fn health_rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.health_rate_limit,
            window_secs: self.health_rate_window_secs,
            message: "Too many health checks. Please try again later.",
            ..Default::default()
        }
    }
}
