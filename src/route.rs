//! Plain data model of an HTTP router tree.
//!
//! A [`Router`] holds an ordered list of [`Route`]s. A route may carry a path pattern in
//! `:param` syntax, the methods it answers, optional [`RouteMetadata`] and an optional
//! sub-router mounted under its path.
//!
//! # Example
//!
//! ```
//! use openapi_from_routes::route::{HttpMethod, Route, Router};
//!
//! let users = Router::new()
//!     .route(Route::new("/").method(HttpMethod::Get))
//!     .route(Route::new("/:id").methods([HttpMethod::Get, HttpMethod::Delete]));
//! let api = Router::new().route(Route::new("/users").sub_router(users));
//! assert_eq!(api.routes.len(), 1);
//! ```

use crate::metadata::RouteMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// HTTP methods an operation can be registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// HTTP GET method
    Get,
    /// HTTP PUT method
    Put,
    /// HTTP POST method
    Post,
    /// HTTP DELETE method
    Delete,
    /// HTTP PATCH method
    Patch,
    /// HTTP HEAD method
    Head,
    /// HTTP OPTIONS method
    Options,
    /// HTTP TRACE method
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Head,
        HttpMethod::Options,
        HttpMethod::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown HTTP method: {}", s))
    }
}

/// Ordered collection of routes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Router {
    pub routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route, builder style
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    pub fn push(&mut self, route: Route) {
        self.routes.push(route);
    }
}

/// A single registered route
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Route {
    /// Route name, used as the initial path summary
    pub name: Option<String>,
    /// Path pattern such as `/users/:id`; routes without a path are not documented
    pub path: Option<String>,
    pub methods: Vec<HttpMethod>,
    pub sub_router: Option<Router>,
    pub metadata: Option<RouteMetadata>,
}

impl Route {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// A route without a path pattern (e.g. a catch-all handler)
    pub fn unmatched() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        self
    }

    pub fn methods(self, methods: impl IntoIterator<Item = HttpMethod>) -> Self {
        methods.into_iter().fold(self, Route::method)
    }

    pub fn sub_router(mut self, router: Router) -> Self {
        self.sub_router = Some(router);
        self
    }

    pub fn metadata(mut self, metadata: RouteMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
