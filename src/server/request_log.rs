use super::client_ip::ClientIp;
use super::AppState;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// How the request's Host relates to the configured domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostKind {
    /// No Host header, or exactly the configured domain
    Primary,
    /// `<label>.<domain>`
    Subdomain(String),
    /// Some other host entirely
    External(String),
}

/// Classify a Host header value (port stripped, case-insensitive)
pub fn classify_host(host: &str, domain: &str) -> HostKind {
    let host = host.split(':').next().unwrap_or_default().to_lowercase();
    let domain = domain.to_lowercase();

    if host.is_empty() || host == domain {
        return HostKind::Primary;
    }

    match host.strip_suffix(&format!(".{}", domain)) {
        Some(label) => HostKind::Subdomain(label.to_string()),
        None => HostKind::External(host),
    }
}

/// Fragment carried by a Referer URL, including the leading `#`
///
/// Browsers never send fragments in the request line, but a Referer may
/// still carry one.
pub fn referer_fragment(referer: &str) -> Option<&str> {
    if !referer.contains("://") {
        return None;
    }
    referer
        .find('#')
        .map(|idx| &referer[idx..])
        .filter(|fragment| fragment.len() > 1)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

/// Log every request once it completes and tag it with a request id
pub async fn log_requests(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4();

    let method = request.method().clone();
    let url = request.uri().to_string();
    let headers = request.headers();
    let host = header(headers, "host").to_string();
    let origin = header(headers, "origin").to_string();
    let referer = header(headers, "referer").to_string();
    let user_agent = header(headers, "user-agent").to_string();

    let (subdomain, external_host) = match classify_host(&host, &state.settings.domain) {
        HostKind::Primary => (None, None),
        HostKind::Subdomain(label) => (Some(label), None),
        HostKind::External(host) => (None, Some(host)),
    };
    let fragment = referer_fragment(&referer).map(str::to_string);

    let mut response = next.run(request).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis() as u64;
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert("x-request-id", value);
    }

    macro_rules! log_request {
        ($level:ident) => {
            $level!(
                request_id = %request_id,
                method = %method,
                url = %url,
                ip = %ip,
                host = %host,
                origin = %origin,
                referer = %referer,
                user_agent = %user_agent,
                subdomain = subdomain.as_deref().unwrap_or_default(),
                external_host = external_host.as_deref().unwrap_or_default(),
                fragment = fragment.as_deref().unwrap_or_default(),
                status = status.as_u16(),
                duration_ms,
                "{} {} -> {} ({}ms)",
                method,
                url,
                status.as_u16(),
                duration_ms
            )
        };
    }

    if status.is_client_error() || status.is_server_error() {
        log_request!(warn);
    } else {
        log_request!(info);
    }

    response
}
