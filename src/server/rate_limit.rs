//! Per-IP sliding-window rate limiting.
//!
//! Each limiter keeps the request timestamps of every client IP seen within
//! its window. Memory stays bounded two ways: a periodic cleanup every
//! `cleanup_interval` requests, and a hard cap on tracked IPs. A new IP that
//! arrives while the cap is reached (after a forced cleanup) is refused.

use super::client_ip::ClientIp;
use super::error::ApiError;
use super::AppState;
use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Configuration for one rate limiter
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per IP within the window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_secs: u64,
    /// Run cleanup every N requests
    pub cleanup_interval: u64,
    /// Hard cap on distinct IPs tracked at once
    pub max_tracked_ips: usize,
    /// Message sent back with a 429
    pub message: &'static str,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_secs: 15 * 60,
            cleanup_interval: 100,
            max_tracked_ips: 10_000,
            message: "Too many requests. Please try again later.",
        }
    }
}

/// Returned when a request must be refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitExceeded;

/// In-memory sliding-window limiter keyed by client IP
pub struct RateLimiter {
    config: RateLimitConfig,
    state: RwLock<HashMap<IpAddr, Vec<Instant>>>,
    request_count: AtomicU64,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: RwLock::new(HashMap::new()),
            request_count: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Record a request from `ip` if it fits in the window
    ///
    /// Returns how many requests the IP has left in the current window.
    ///
    /// # Errors
    /// `RateLimitExceeded` when the IP is over its budget, or when it is new
    /// and the tracked-IP cap is reached.
    pub fn check(&self, ip: IpAddr) -> Result<u32, RateLimitExceeded> {
        let now = Instant::now();
        let cutoff = self.cutoff(now);

        let count = self.request_count.fetch_add(1, Ordering::Relaxed);
        if count > 0 && count % self.config.cleanup_interval.max(1) == 0 {
            tracing::debug!(request_count = count, "Running periodic rate limiter cleanup");
            self.cleanup();
        }

        let at_capacity = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            !state.contains_key(&ip) && state.len() >= self.config.max_tracked_ips
        };
        if at_capacity {
            self.cleanup();
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        if !state.contains_key(&ip) && state.len() >= self.config.max_tracked_ips {
            tracing::warn!(
                ip = %ip,
                tracked_ips = state.len(),
                max_tracked_ips = self.config.max_tracked_ips,
                "Rejecting new IP: tracked IP limit reached"
            );
            return Err(RateLimitExceeded);
        }

        let timestamps = state.entry(ip).or_default();
        timestamps.retain(|&t| t > cutoff);

        let max = self.config.max_requests as usize;
        if timestamps.len() >= max {
            tracing::warn!(
                ip = %ip,
                requests = timestamps.len(),
                max = self.config.max_requests,
                "Rate limit exceeded"
            );
            return Err(RateLimitExceeded);
        }

        timestamps.push(now);
        Ok((max - timestamps.len()) as u32)
    }

    /// Drop IPs with no request inside the window
    pub fn cleanup(&self) {
        let cutoff = self.cutoff(Instant::now());
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.retain(|_, timestamps| {
            timestamps.retain(|&t| t > cutoff);
            !timestamps.is_empty()
        });
    }

    pub fn tracked_ips(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn cutoff(&self, now: Instant) -> Instant {
        let window = Duration::from_secs(self.config.window_secs);
        now.checked_sub(window).unwrap_or(now)
    }
}

/// Middleware guarding the payload routes
pub async fn limit_payloads(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    request: Request,
    next: Next,
) -> Response {
    enforce(&state.payload_limiter, ip, request, next).await
}

/// Middleware guarding the health route
pub async fn limit_health(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    request: Request,
    next: Next,
) -> Response {
    enforce(&state.health_limiter, ip, request, next).await
}

async fn enforce(limiter: &RateLimiter, ip: IpAddr, request: Request, next: Next) -> Response {
    let remaining = match limiter.check(ip) {
        Ok(remaining) => remaining,
        Err(RateLimitExceeded) => {
            let mut response = ApiError::RateLimited {
                message: limiter.config().message,
            }
            .into_response();
            set_headers(&mut response, limiter.config(), 0);
            return response;
        }
    };

    let mut response = next.run(request).await;
    set_headers(&mut response, limiter.config(), remaining);
    response
}

fn set_headers(response: &mut Response, config: &RateLimitConfig, remaining: u32) {
    let headers = response.headers_mut();
    headers.insert("ratelimit-limit", HeaderValue::from(config.max_requests));
    headers.insert("ratelimit-remaining", HeaderValue::from(remaining));
    headers.insert("ratelimit-reset", HeaderValue::from(config.window_secs));
}
