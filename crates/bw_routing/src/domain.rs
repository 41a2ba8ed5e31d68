//! Host → domain resolution.
//!
//! A production host is exactly three dot-separated labels:
//! `{service}.{base1}.{base2}`. The base domain is the join of the last two.
//! Two relaxed shapes exist for development:
//! - a final label of `localhost` or `localhost:<port>` (any label count),
//! - the reserved local base domain `burrow-local.com:<port>`, which keeps
//!   the three-label shape but forces plain HTTP.

use crate::error::RoutingError;

/// Reserved base domain for local development (always carries a port).
pub const LOCAL_BASE_DOMAIN_PREFIX: &str = "burrow-local.com:";

const LOCALHOST: &str = "localhost";

/// Resolve the shared base domain from a raw `host` (may include a port).
///
/// Fatal outside local mode when the host is not three labels — the caller
/// is mounted on a domain the console was never deployed to.
pub fn base_domain(host: &str) -> Result<String, RoutingError> {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() == 3 {
        return Ok(format!("{}.{}", labels[1], labels[2]));
    }

    // Relaxed shape: anything served off localhost keeps only that label.
    let last = labels[labels.len() - 1];
    if last == LOCALHOST || last.starts_with("localhost:") {
        return Ok(last.to_string());
    }

    Err(RoutingError::InvalidHost {
        host: host.to_string(),
    })
}

/// The leftmost label identifying which service a host belongs to.
pub fn service_label(host: &str, base: &str) -> String {
    host.strip_suffix(base)
        .unwrap_or(host)
        .trim_end_matches('.')
        .to_string()
}

/// True when `base` is a development base domain (relaxes the three-label
/// rule and downgrades the scheme to plain HTTP).
pub fn is_local_base(base: &str) -> bool {
    base == LOCALHOST
        || base.starts_with("localhost:")
        || base.starts_with(LOCAL_BASE_DOMAIN_PREFIX)
}

/// Scheme implied by the base domain: TLS everywhere except local mode.
pub fn scheme_for(base: &str) -> &'static str {
    if is_local_base(base) {
        "http://"
    } else {
        "https://"
    }
}
