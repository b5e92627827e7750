// Route assembly: turns configured dependencies into the status route table

use sea_orm::DatabaseConnection;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::HealthConfig;
use crate::dispatcher::{PathDispatcher, RouteTable, StatusHandler, StatusLayer};
use crate::error::{HealthCheckError, HealthCheckResult};
use crate::handlers::{AmiStatus, StatusSummary, AMI_METADATA_ENDPOINT};
use crate::services::{
    CacheChecker, ClientFactory, CustomCheck, CustomChecker, DatabaseChecker, ElasticsearchPing,
    RedisPing, SearchChecker, ServiceChecker, ServiceKind,
};

pub const STATUS_PATH: &str = "/_status";
pub const AMI_STATUS_PATH: &str = "/_status/ami";

/// How one dependency is checked
#[derive(Clone)]
pub enum Dependency {
    Service { kind: ServiceKind, url: String },
    Database(Arc<DatabaseConnection>),
    Cache(ClientFactory),
    Search(ClientFactory),
    Custom(CustomCheck),
}

impl Dependency {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Dependency::Service { .. } => "service",
            Dependency::Database(_) => "database",
            Dependency::Cache(_) => "cache",
            Dependency::Search(_) => "search",
            Dependency::Custom(_) => "custom",
        }
    }
}

/// Named dependencies of the wrapped application, in registration order
#[derive(Clone, Default)]
pub struct Dependencies {
    entries: Vec<(String, Dependency)>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Services declared in the configuration file plus database, cache and
    /// search entries named `db`, `cache` and `es` built from its URLs
    pub fn from_config(config: &HealthConfig, db: Option<DatabaseConnection>) -> Self {
        let mut dependencies = Self::new();
        for (name, target) in &config.services {
            dependencies = dependencies.service(name.clone(), target.kind, target.url.clone());
        }
        if let Some(conn) = db {
            dependencies = dependencies.database("db", conn);
        }
        dependencies
            .cache("cache", RedisPing::factory(config.redis_url.clone()))
            .search("es", ElasticsearchPing::factory(config.es_url.clone()))
    }

    pub fn add(mut self, name: impl Into<String>, dependency: Dependency) -> Self {
        self.entries.push((name.into(), dependency));
        self
    }

    pub fn service(
        self,
        name: impl Into<String>,
        kind: ServiceKind,
        url: impl Into<String>,
    ) -> Self {
        self.add(name, Dependency::Service { kind, url: url.into() })
    }

    pub fn database(self, name: impl Into<String>, conn: DatabaseConnection) -> Self {
        self.add(name, Dependency::Database(Arc::new(conn)))
    }

    pub fn cache(self, name: impl Into<String>, factory: ClientFactory) -> Self {
        self.add(name, Dependency::Cache(factory))
    }

    pub fn search(self, name: impl Into<String>, factory: ClientFactory) -> Self {
        self.add(name, Dependency::Search(factory))
    }

    pub fn custom<F>(self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn() -> anyhow::Result<Option<String>> + Send + Sync + 'static,
    {
        self.add(name, Dependency::Custom(Arc::new(check)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Options for [`add_routes`]
#[derive(Clone)]
pub struct StatusOptions {
    /// Sent as `User-Agent` by the service checkers
    pub user_agent: Option<String>,
    /// `None` omits the `related` list from `/_status`
    pub dependencies: Option<Dependencies>,
    pub ami_endpoint: String,
}

impl Default for StatusOptions {
    fn default() -> Self {
        Self {
            user_agent: None,
            dependencies: None,
            ami_endpoint: AMI_METADATA_ENDPOINT.to_string(),
        }
    }
}

impl StatusOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_dependencies(mut self, dependencies: Dependencies) -> Self {
        self.dependencies = Some(dependencies);
        self
    }

    pub fn with_ami_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.ami_endpoint = endpoint.into();
        self
    }
}

/// Status path for a dependency name
pub fn status_path(name: &str) -> String {
    format!("{}/{}", STATUS_PATH, name)
}

fn build_checker(
    name: &str,
    dependency: Dependency,
    user_agent: Option<&str>,
) -> HealthCheckResult<StatusHandler> {
    let handler: StatusHandler = match dependency {
        Dependency::Service { kind, url } => {
            Arc::new(ServiceChecker::new(kind, &url, user_agent)?)
        }
        Dependency::Database(conn) => Arc::new(DatabaseChecker::new(conn)?),
        Dependency::Cache(factory) => Arc::new(CacheChecker::new(factory)),
        Dependency::Search(factory) => Arc::new(SearchChecker::new(factory)),
        Dependency::Custom(check) => Arc::new(CustomChecker::new(name, check)),
    };
    Ok(handler)
}

/// Builds the full route table: `/_status`, `/_status/ami` and one
/// `/_status/<name>` per dependency.
///
/// Fails on setup mistakes (unsupported database backend, empty, reserved or
/// repeated names) so they surface before the server starts.
pub fn build_routes(options: StatusOptions) -> HealthCheckResult<RouteTable> {
    let mut routes = RouteTable::new();
    routes.insert(AMI_STATUS_PATH, Arc::new(AmiStatus::new(options.ami_endpoint)?))?;

    let related = match options.dependencies {
        Some(dependencies) => {
            let mut related = BTreeSet::new();
            for (name, dependency) in dependencies.entries {
                if name.is_empty() || name.contains('/') {
                    return Err(HealthCheckError::Config(format!(
                        "Invalid dependency name {:?}",
                        name
                    )));
                }
                let path = status_path(&name);
                tracing::debug!("Registering {} check at {}", dependency.kind_name(), path);
                let handler = build_checker(&name, dependency, options.user_agent.as_deref())?;
                routes.insert(path.clone(), handler)?;
                related.insert(path);
            }
            Some(related)
        }
        None => None,
    };

    let dependency_count = related.as_ref().map_or(0, BTreeSet::len);
    routes.insert(STATUS_PATH, Arc::new(StatusSummary::new(related)))?;
    tracing::info!("Status routes ready ({} dependencies)", dependency_count);

    Ok(routes)
}

/// Wraps `app` so the status routes are served in front of it
pub fn add_routes<S>(app: S, options: StatusOptions) -> HealthCheckResult<PathDispatcher<S>> {
    Ok(PathDispatcher::new(app, build_routes(options)?))
}

/// Same routes as [`add_routes`], as a layer for `ServiceBuilder` stacks
pub fn status_layer(options: StatusOptions) -> HealthCheckResult<StatusLayer> {
    Ok(StatusLayer::new(build_routes(options)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, MockDatabase};

    fn paths(options: StatusOptions) -> Vec<String> {
        build_routes(options).unwrap().paths()
    }

    #[test]
    fn test_fixed_routes_always_present() {
        assert_eq!(paths(StatusOptions::new()), vec!["/_status", "/_status/ami"]);
    }

    #[test]
    fn test_one_route_per_dependency() {
        let dependencies = Dependencies::new()
            .service("backend", ServiceKind::Backend, "http://admin.local")
            .cache("cache", RedisPing::factory("redis://localhost:6379/0"))
            .custom("queue", || Ok(None));

        assert_eq!(
            paths(StatusOptions::new().with_dependencies(dependencies)),
            vec![
                "/_status",
                "/_status/ami",
                "/_status/backend",
                "/_status/cache",
                "/_status/queue",
            ]
        );
    }

    #[test]
    fn test_sqlite_database_fails_assembly() {
        let conn = MockDatabase::new(DbBackend::Sqlite).into_connection();
        let options =
            StatusOptions::new().with_dependencies(Dependencies::new().database("db", conn));

        assert!(matches!(build_routes(options), Err(HealthCheckError::Config(_))));
    }

    #[test]
    fn test_options_with_database_can_be_cloned() {
        let conn = MockDatabase::new(DbBackend::MySql).into_connection();
        let options =
            StatusOptions::new().with_dependencies(Dependencies::new().database("db", conn));
        let copy = options.clone();

        assert_eq!(paths(options), vec!["/_status", "/_status/ami", "/_status/db"]);
        assert_eq!(paths(copy), vec!["/_status", "/_status/ami", "/_status/db"]);
    }

    #[test]
    fn test_colliding_names_fail_assembly() {
        let dependencies = Dependencies::new()
            .custom("db", || Ok(None))
            .cache("db", RedisPing::factory("redis://localhost:6379/0"));
        let options = StatusOptions::new().with_dependencies(dependencies);
        assert!(matches!(build_routes(options), Err(HealthCheckError::Config(_))));

        let reserved =
            StatusOptions::new().with_dependencies(Dependencies::new().custom("ami", || Ok(None)));
        assert!(matches!(build_routes(reserved), Err(HealthCheckError::Config(_))));
    }

    #[test]
    fn test_invalid_names_fail_assembly() {
        for name in ["", "a/b"] {
            let dependencies = Dependencies::new().custom(name, || Ok(None));
            let options = StatusOptions::new().with_dependencies(dependencies);
            assert!(build_routes(options).is_err(), "name {:?} should be rejected", name);
        }
    }

    #[test]
    fn test_from_config_registers_config_services() {
        let mut config = HealthConfig::default();
        config.services.insert(
            "platform".to_string(),
            crate::config::ServiceTarget {
                kind: ServiceKind::Platform,
                url: "http://platform.local".to_string(),
            },
        );

        let dependencies = Dependencies::from_config(&config, None);
        assert_eq!(
            paths(StatusOptions::new().with_dependencies(dependencies)),
            vec![
                "/_status",
                "/_status/ami",
                "/_status/cache",
                "/_status/es",
                "/_status/platform",
            ]
        );
    }
}
