//! The router state machine.
//!
//! One `Router` per browsing context, constructed once at application start
//! via [`Router::mount`] and handed to consumers by reference — no ambient
//! singleton. Browser side effects (history push, full location replace) go
//! through an injected [`HistorySink`]; state observers register on an
//! explicit list and run after every state change.
//!
//! Navigation rule: a target on the current page's service is a soft
//! transition (history push + in-place state update). A target on a sibling
//! service replaces the whole location — this app cannot render another
//! service's views, so the in-memory state is deliberately left untouched
//! while the browsing context is torn down.

use tracing::{debug, info, warn};

use crate::domain;
use crate::error::RoutingError;
use crate::page::{normalize_path, Page};
use crate::query::{decode_query_params, encode_query_params, QueryParams};

/// The pieces of a browser location the router consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Host with optional port, e.g. `admin.example.com`.
    pub host: String,
    /// Path component, e.g. `/services/new`.
    pub path: String,
    /// Raw query string, with or without the leading `?`.
    pub search: String,
}

impl Location {
    pub fn new(host: impl Into<String>, path: impl Into<String>, search: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
            search: search.into(),
        }
    }
}

/// Where navigation side effects land (the browser, in production).
pub trait HistorySink {
    /// Push a same-service URL into session history without reloading.
    fn push_url(&self, url: &str);
    /// Replace the whole location — leaves the current browsing context.
    fn replace_location(&self, url: &str);
}

/// Snapshot of the router's observable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterState {
    pub current_page: Page,
    pub base_domain: String,
    pub query_params: QueryParams,
    pub local_mode: bool,
}

type Observer = Box<dyn Fn(&RouterState)>;

pub struct Router {
    state: RouterState,
    sink: Box<dyn HistorySink>,
    observers: Vec<Observer>,
}

impl Router {
    /// Derive the initial state from the current location. Called exactly
    /// once when the application mounts; an unresolvable host is fatal here.
    pub fn mount(location: &Location, sink: Box<dyn HistorySink>) -> Result<Self, RoutingError> {
        let state = Self::state_from_location(location)?;
        info!(
            page = ?state.current_page,
            base = %state.base_domain,
            local = state.local_mode,
            "router mounted"
        );
        Ok(Self {
            state,
            sink,
            observers: Vec::new(),
        })
    }

    fn state_from_location(location: &Location) -> Result<RouterState, RoutingError> {
        let base_domain = domain::base_domain(&location.host)?;
        let service = domain::service_label(&location.host, &base_domain);
        let current_page = Page::from_route(&service, &location.path);
        let query_params = decode_query_params(&location.search);
        let local_mode = domain::is_local_base(&base_domain);
        Ok(RouterState {
            current_page,
            base_domain,
            query_params,
            local_mode,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn current_page(&self) -> Page {
        self.state.current_page
    }

    pub fn base_domain(&self) -> &str {
        &self.state.base_domain
    }

    pub fn query_params(&self) -> &QueryParams {
        &self.state.query_params
    }

    pub fn is_local_mode(&self) -> bool {
        self.state.local_mode
    }

    pub fn state(&self) -> &RouterState {
        &self.state
    }

    fn scheme(&self) -> &'static str {
        domain::scheme_for(&self.state.base_domain)
    }

    /// Root the backend client is built on: `{scheme}{service}.{base}/api`.
    pub fn api_base_url(&self, service: &str) -> String {
        format!(
            "{}{}.{}/api",
            self.scheme(),
            service,
            self.state.base_domain
        )
    }

    // ── Transitions ──────────────────────────────────────────────────────────

    /// Navigate to `page`. Same-service targets update state in place and
    /// push into history; cross-service targets replace the location and
    /// leave state untouched.
    pub fn navigate(&mut self, page: Page, params: Option<QueryParams>) {
        let route = page.route();
        let query = params
            .as_ref()
            .filter(|params| !params.is_empty())
            .map(|params| format!("?{}", encode_query_params(params)))
            .unwrap_or_default();
        let url = format!(
            "{}{}.{}/{}{}",
            self.scheme(),
            route.service,
            self.state.base_domain,
            route.path,
            query
        );

        if route.service != self.state.current_page.service() {
            debug!(from = ?self.state.current_page, to = ?page, %url, "cross-service navigation");
            self.sink.replace_location(&url);
            return;
        }

        debug!(from = ?self.state.current_page, to = ?page, %url, "navigation");
        self.sink.push_url(&url);
        self.state.current_page = page;
        self.state.query_params = params.unwrap_or_default();
        self.notify();
    }

    /// External URL change (history back/forward). Re-derives everything from
    /// the new location; last write wins.
    pub fn handle_url_change(&mut self, location: &Location) -> Result<(), RoutingError> {
        self.state = Self::state_from_location(location)?;
        debug!(page = ?self.state.current_page, "url change applied");
        self.notify();
        Ok(())
    }

    /// Register an observer, called after every state change.
    pub fn subscribe(&mut self, observer: impl Fn(&RouterState) + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn notify(&self) {
        for observer in &self.observers {
            observer(&self.state);
        }
    }

    // ── Return-URI validation ────────────────────────────────────────────────

    /// Accept an externally supplied redirect target only when its scheme
    /// matches the current mode and its host is a sibling service on the
    /// router's own base domain. Everything else is an open-redirect attempt
    /// or a misconfiguration; reject it.
    pub fn is_valid_return_uri(&self, return_uri: &str) -> bool {
        let scheme = self.scheme();
        let Some(rest) = return_uri.strip_prefix(scheme) else {
            warn!(uri = %return_uri, "return URI rejected: scheme mismatch");
            return false;
        };

        let host = match rest.split('/').next() {
            Some(host) if !host.is_empty() => host,
            _ => return false,
        };

        let labels: Vec<&str> = host.split('.').collect();
        if labels.len() != 3 {
            warn!(uri = %return_uri, "return URI rejected: host shape");
            return false;
        }

        let return_base = format!("{}.{}", labels[1], labels[2]);
        if return_base != self.state.base_domain {
            warn!(uri = %return_uri, "return URI rejected: foreign base domain");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every side effect instead of touching a browser.
    #[derive(Default, Clone)]
    struct RecordingSink {
        pushed: Rc<RefCell<Vec<String>>>,
        replaced: Rc<RefCell<Vec<String>>>,
    }

    impl HistorySink for RecordingSink {
        fn push_url(&self, url: &str) {
            self.pushed.borrow_mut().push(url.to_string());
        }
        fn replace_location(&self, url: &str) {
            self.replaced.borrow_mut().push(url.to_string());
        }
    }

    fn mounted(host: &str, path: &str, search: &str) -> (Router, RecordingSink) {
        let sink = RecordingSink::default();
        let router = Router::mount(
            &Location::new(host, path, search),
            Box::new(sink.clone()),
        )
        .unwrap();
        (router, sink)
    }

    #[test]
    fn mount_derives_state_once() {
        let (router, _) = mounted("auth.example.com", "/login", "?return_uri=x");
        assert_eq!(router.current_page(), Page::Login);
        assert_eq!(router.base_domain(), "example.com");
        assert!(!router.is_local_mode());
        assert_eq!(
            router.query_params().get("return_uri").map(String::as_str),
            Some("x")
        );
    }

    #[test]
    fn mount_fails_on_invalid_host() {
        let sink = RecordingSink::default();
        let result = Router::mount(
            &Location::new("example.com", "/", ""),
            Box::new(sink),
        );
        assert!(result.is_err());
    }

    #[test]
    fn same_service_navigation_pushes_and_updates() {
        let (mut router, sink) = mounted("admin.example.com", "/", "");
        let mut params = QueryParams::new();
        params.insert("id".into(), "7".into());

        router.navigate(Page::AdminServicesEdit, Some(params));

        assert_eq!(router.current_page(), Page::AdminServicesEdit);
        assert_eq!(router.query_params().get("id").map(String::as_str), Some("7"));
        assert_eq!(
            sink.pushed.borrow().as_slice(),
            ["https://admin.example.com/services/edit?id=7"]
        );
        assert!(sink.replaced.borrow().is_empty());
    }

    #[test]
    fn cross_service_navigation_replaces_location() {
        let (mut router, sink) = mounted("auth.example.com", "/login", "");

        router.navigate(Page::AdminHome, None);

        // Full location change: state is not updated, nothing pushed.
        assert_eq!(router.current_page(), Page::Login);
        assert!(sink.pushed.borrow().is_empty());
        assert_eq!(
            sink.replaced.borrow().as_slice(),
            ["https://admin.example.com/"]
        );
    }

    #[test]
    fn local_mode_builds_http_urls() {
        let (mut router, sink) = mounted("admin.burrow-local.com:8080", "/", "");
        assert!(router.is_local_mode());

        router.navigate(Page::AdminUsers, None);
        assert_eq!(
            sink.pushed.borrow().as_slice(),
            ["http://admin.burrow-local.com:8080/users"]
        );
    }

    #[test]
    fn url_change_overwrites_state() {
        let (mut router, _) = mounted("admin.example.com", "/users", "");
        router
            .handle_url_change(&Location::new(
                "admin.example.com",
                "/services",
                "?filter=up",
            ))
            .unwrap();
        assert_eq!(router.current_page(), Page::AdminServices);
        assert_eq!(
            router.query_params().get("filter").map(String::as_str),
            Some("up")
        );
    }

    #[test]
    fn observers_run_on_state_change() {
        let (mut router, _) = mounted("admin.example.com", "/", "");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        router.subscribe(move |state| sink.borrow_mut().push(state.current_page));

        router.navigate(Page::AdminUsers, None);
        router
            .handle_url_change(&Location::new("admin.example.com", "/", ""))
            .unwrap();

        assert_eq!(seen.borrow().as_slice(), [Page::AdminUsers, Page::AdminHome]);
    }

    #[test]
    fn return_uri_validation() {
        let (router, _) = mounted("auth.example.com", "/login", "");

        assert!(router.is_valid_return_uri("https://admin.example.com/x"));
        assert!(router.is_valid_return_uri("https://admin.example.com"));
        assert!(!router.is_valid_return_uri("https://evil.com/x"));
        assert!(!router.is_valid_return_uri("https://admin.evil.com/x"));
        // Scheme mismatch outside local mode.
        assert!(!router.is_valid_return_uri("http://admin.example.com/x"));
        assert!(!router.is_valid_return_uri("https://a.b.example.com/x"));
        assert!(!router.is_valid_return_uri(""));
    }

    #[test]
    fn return_uri_validation_local_mode() {
        let (router, _) = mounted("auth.burrow-local.com:8080", "/login", "");
        assert!(router.is_valid_return_uri("http://admin.burrow-local.com:8080/x"));
        assert!(!router.is_valid_return_uri("https://admin.burrow-local.com:8080/x"));
    }

    #[test]
    fn not_found_for_unknown_path() {
        let (router, _) = mounted("admin.example.com", "/no-such", "");
        assert_eq!(router.current_page(), Page::NotFound);
    }
}
