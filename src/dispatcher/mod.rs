// Path dispatcher: serves status routes and forwards everything else

use axum::{
    extract::Request,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::error::{HealthCheckError, HealthCheckResult};
use crate::services::StatusCheck;

/// Handler bound to one exact path
pub type StatusHandler = Arc<dyn StatusCheck>;

/// Exact path to handler mapping, built once at startup
#[derive(Default, Clone)]
pub struct RouteTable {
    routes: HashMap<String, StatusHandler>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route; a path may only be registered once
    pub fn insert(
        &mut self,
        path: impl Into<String>,
        handler: StatusHandler,
    ) -> HealthCheckResult<()> {
        let path = path.into();
        if self.routes.contains_key(&path) {
            return Err(HealthCheckError::Config(format!(
                "Status route {} is registered more than once",
                path
            )));
        }
        self.routes.insert(path, handler);
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<StatusHandler> {
        self.routes.get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.routes.contains_key(path)
    }

    /// Registered paths in sorted order
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.routes.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Wraps an application service; requests whose path is in the route table
/// are answered by the matching handler, all others reach the application
/// untouched.
#[derive(Clone)]
pub struct PathDispatcher<S> {
    fallback: S,
    routes: Arc<Mutex<RouteTable>>,
}

impl<S> PathDispatcher<S> {
    pub fn new(fallback: S, routes: RouteTable) -> Self {
        Self {
            fallback,
            routes: Arc::new(Mutex::new(routes)),
        }
    }

    /// Looks up a handler; the lock is released before the handler runs
    pub fn handler_for(&self, path: &str) -> Option<StatusHandler> {
        let routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        routes.get(path)
    }

    pub fn paths(&self) -> Vec<String> {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner).paths()
    }
}

impl<S> Service<Request> for PathDispatcher<S>
where
    S: Service<Request, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.fallback.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        if let Some(handler) = self.handler_for(req.uri().path()) {
            return Box::pin(async move { Ok(handler.check().await.into_response()) });
        }

        // Hand the driven-ready service to this call and keep a fresh clone
        let clone = self.fallback.clone();
        let mut fallback = std::mem::replace(&mut self.fallback, clone);
        let future = fallback.call(req);
        Box::pin(async move {
            let response = future.await?;
            Ok(response.into_response())
        })
    }
}

/// `tower::Layer` producing a [`PathDispatcher`] around any application
#[derive(Clone)]
pub struct StatusLayer {
    routes: Arc<Mutex<RouteTable>>,
}

impl StatusLayer {
    pub fn new(routes: RouteTable) -> Self {
        Self {
            routes: Arc::new(Mutex::new(routes)),
        }
    }
}

impl<S> Layer<S> for StatusLayer {
    type Service = PathDispatcher<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PathDispatcher {
            fallback: inner,
            routes: Arc::clone(&self.routes),
        }
    }
}
