//! The closed set of routable pages.
//!
//! Every page belongs to exactly one service and one normalized path, recorded
//! in the static `ROUTES` table. The table is bidirectional: `Page::route`
//! looks a page's address up, `Page::from_route` resolves an address back to a
//! page (falling back to `NotFound` for anything unknown). Completeness in
//! both directions is asserted by test.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    Login,
    CreateUser,
    Logout,
    AdminHome,
    AdminUsers,
    AdminServices,
    AdminServicesNew,
    AdminServicesEdit,
    AdminDynamicDns,
    NotFound,
}

/// A page's address: service subdomain + path below it (no leading slash,
/// empty for the service root).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub service: &'static str,
    pub path: &'static str,
}

const ROUTES: &[(Page, Route)] = &[
    (Page::Login, Route { service: "auth", path: "login" }),
    (Page::CreateUser, Route { service: "auth", path: "create-user" }),
    (Page::Logout, Route { service: "auth", path: "logout" }),
    (Page::AdminHome, Route { service: "admin", path: "" }),
    (Page::AdminUsers, Route { service: "admin", path: "users" }),
    (Page::AdminServices, Route { service: "admin", path: "services" }),
    (Page::AdminServicesNew, Route { service: "admin", path: "services/new" }),
    (Page::AdminServicesEdit, Route { service: "admin", path: "services/edit" }),
    (Page::AdminDynamicDns, Route { service: "admin", path: "dynamic-dns" }),
    (Page::NotFound, Route { service: "internal", path: "not-found" }),
];

impl Page {
    /// Address of this page. Total — every variant has a table entry.
    pub fn route(self) -> Route {
        ROUTES
            .iter()
            .find(|(page, _)| *page == self)
            .map(|(_, route)| *route)
            .unwrap_or(Route { service: "internal", path: "not-found" })
    }

    /// Resolve a (service, path) pair to a page. Unknown addresses land on
    /// `NotFound` rather than failing — a typo in the URL bar is not a bug.
    pub fn from_route(service: &str, path: &str) -> Page {
        let normalized = normalize_path(path);
        ROUTES
            .iter()
            .find(|(_, route)| route.service == service && route.path == normalized)
            .map(|(page, _)| *page)
            .unwrap_or(Page::NotFound)
    }

    pub fn service(self) -> &'static str {
        self.route().service
    }
}

/// Strip the query string, drop empty segments and the leading slash.
/// `"/services//new?x=1"` → `"services/new"`, `"/"` → `""`.
pub fn normalize_path(path: &str) -> String {
    let path = path.split('?').next().unwrap_or("");
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
