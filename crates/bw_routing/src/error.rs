use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("host {host:?} does not resolve to a service + base domain")]
    InvalidHost { host: String },
}
