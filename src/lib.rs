//! Health check middleware for HTTP applications.
//!
//! Wraps an existing `tower` service (typically an axum `Router`) and serves:
//!
//! - `/_status`: `{"status": "OK"}` plus, when dependencies are configured,
//!   the list of per-dependency paths under `related`
//! - `/_status/ami`: the cloud instance image id, or `null` off-cloud
//! - `/_status/<name>`: a live check of one dependency
//!
//! Every other request is forwarded unchanged to the wrapped application.
//!
//! ```rust,ignore
//! let dependencies = Dependencies::new()
//!     .service("backend", ServiceKind::Backend, "http://admin.internal")
//!     .cache("cache", RedisPing::factory("redis://localhost:6379/0"))
//!     .custom("queue", || Ok(None));
//!
//! let app = add_routes(router, StatusOptions::new().with_dependencies(dependencies))?;
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;

pub use config::{HealthConfig, ServerConfig, ServiceTarget};
pub use dispatcher::{PathDispatcher, RouteTable, StatusLayer};
pub use error::{HealthCheckError, HealthCheckResult};
pub use routes::{add_routes, build_routes, status_layer, Dependencies, Dependency, StatusOptions};
pub use services::{
    connect_database, CacheChecker, ClientFactory, CustomCheck, CustomChecker, DatabaseChecker,
    ElasticsearchPing, Ping, RedisPing, SearchChecker, ServiceChecker, ServiceKind, StatusCheck,
    StatusReport,
};
