//! Route tables.
//!
//! A route is a named callable fixed at a socket. Descendants never hold
//! their own copies: dispatch goes through [`Wire::invoke`], which consults
//! the socket's current table at call time, so redefined routes are observed
//! by every knot below the socket.
//!
//! [`Wire::invoke`]: crate::Wire::invoke

use crate::wire::Knot;
use anyhow::Result;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A route body: called with the invoking knot and the caller's arguments.
pub type RouteFn = dyn Fn(&Knot, &[Value]) -> Result<Value> + Send + Sync;

/// A named callable installed at a socket.
#[derive(Clone)]
pub struct Route(Arc<RouteFn>);

impl Route {
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&Knot, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Route(Arc::new(body))
    }

    /// Run the route body.
    pub fn call(&self, knot: &Knot, args: &[Value]) -> Result<Value> {
        (self.0)(knot, args)
    }

    /// True when both handles point at the same installed body.
    pub fn same(&self, other: &Route) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Route")
    }
}

/// Insertion-ordered mapping from route name to callable.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: IndexMap<String, Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or override the route under `name`.
    pub fn define<F>(&mut self, name: impl Into<String>, body: F)
    where
        F: Fn(&Knot, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.routes.insert(name.into(), Route::new(body));
    }

    /// Builder-style [`RouteTable::define`].
    pub fn with<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Knot, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.define(name, body);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Route> {
        self.routes.get(name)
    }

    /// Route names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
