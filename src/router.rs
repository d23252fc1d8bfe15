//! Ordered request router.
//!
//! Routes are kept in registration order and scanned front to back; the
//! first entry whose method and template both accept the request wins.
//! There is no specificity ranking, so register `/users/me` before
//! `/users/{id}` if both should be reachable.

use std::sync::Arc;

use tracing::debug;

use crate::error::Error;
use crate::handler::{Handler, SharedEndpoint};
use crate::method::Method;
use crate::path::PathMatcher;
use crate::request::{Params, Request};
use crate::response::Response;

/// One `(method, template, endpoint)` entry.
pub struct Route {
    method: Method,
    matcher: PathMatcher,
    endpoint: SharedEndpoint,
}

impl Route {
    pub fn method(&self) -> Method { self.method }
    pub fn template(&self) -> &str { self.matcher.template() }

    pub fn accepts(&self, method: Method, path: &str) -> bool {
        self.method == method && self.matcher.matches(path)
    }
}

/// The application router.
///
/// Build it once at startup. Each [`Router::on`] call returns `self` so
/// registrations chain naturally.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a handler for a method + path template. Returns `self` for
    /// chaining.
    ///
    /// ```rust
    /// # use trellis::{Method, Request, Response, Router};
    /// # async fn get_user(_: Request) -> Response { Response::text("") }
    /// # async fn create_user(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::Get,  "/users/{id}", get_user)
    ///     .on(Method::Post, "/users",      create_user);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `method` is not routable (`HEAD`, `OPTIONS`, …). Use
    /// [`Router::add`] to get an error instead.
    pub fn on(mut self, method: Method, template: &str, handler: impl Handler) -> Self {
        self.add(method, template, handler.into_endpoint())
            .unwrap_or_else(|e| panic!("invalid route `{method} {template}`: {e}"));
        self
    }

    pub fn get(self, template: &str, handler: impl Handler) -> Self {
        self.on(Method::Get, template, handler)
    }

    pub fn post(self, template: &str, handler: impl Handler) -> Self {
        self.on(Method::Post, template, handler)
    }

    pub fn put(self, template: &str, handler: impl Handler) -> Self {
        self.on(Method::Put, template, handler)
    }

    pub fn patch(self, template: &str, handler: impl Handler) -> Self {
        self.on(Method::Patch, template, handler)
    }

    pub fn delete(self, template: &str, handler: impl Handler) -> Self {
        self.on(Method::Delete, template, handler)
    }

    /// Appends an endpoint. Unlike [`Router::on`], a non-routable method is
    /// reported instead of panicking.
    pub fn add(&mut self, method: Method, template: &str, endpoint: SharedEndpoint) -> Result<(), Error> {
        if !method.is_routable() {
            return Err(Error::UnsupportedMethod(method.to_string()));
        }
        debug!(%method, template, "route registered");
        self.routes.push(Route { method, matcher: PathMatcher::new(template), endpoint });
        Ok(())
    }

    pub fn routes(&self) -> &[Route] { &self.routes }

    /// Finds the first route accepting `method` + `path` and extracts its
    /// path parameters.
    pub fn lookup(&self, method: Method, path: &str) -> Result<(&Route, Params), Error> {
        self.routes
            .iter()
            .find(|route| route.accepts(method, path))
            .map(|route| (route, route.matcher.extract_params(path)))
            .ok_or_else(|| Error::RouteNotFound { method, path: path.to_owned() })
    }

    /// Routes one request and produces one response. An unmatched request
    /// gets a 404 naming its method and path.
    pub async fn resolve(&self, req: Request) -> Response {
        match self.lookup(req.method(), req.path()) {
            Ok((route, params)) => {
                let endpoint = Arc::clone(&route.endpoint);
                endpoint.serve(req.with_path_params(params)).await
            }
            Err(err) => err.into_response(),
        }
    }
}
