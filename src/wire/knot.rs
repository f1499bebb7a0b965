//! The knot: unit of identity, data and state in a wire.

use crate::index::Index;
use crate::route::RouteTable;
use crate::runtime::SharedRuntimeSource;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fmt;

/// Handle addressing a knot inside its [`Wire`](crate::Wire).
///
/// Handles stay valid for the lifetime of the wire: truncation detaches a
/// knot but never removes it, so a held id keeps addressing the same
/// (possibly isolated) knot. Handles are only meaningful within the wire
/// that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KnotId(pub(crate) usize);

impl fmt::Display for KnotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "knot#{}", self.0)
    }
}

/// A single node in the wire.
///
/// A knot owns its namespace identity, local data and state, attached
/// runtime sources and the cached aggregates rebuilt by sync. Linkage to
/// parent and socket is held as explicit optional handles; `None` means the
/// knot is a root and therefore its own aggregation boundary.
#[derive(Debug)]
pub struct Knot {
    pub(crate) namespace: String,
    pub(crate) label: String,
    pub(crate) data: Value,
    pub(crate) state: Value,
    pub(crate) index: Index,
    pub(crate) wire_data: IndexMap<String, Value>,
    pub(crate) children: IndexMap<String, KnotId>,
    pub(crate) parent: Option<KnotId>,
    pub(crate) socket: Option<KnotId>,
    pub(crate) runtime: Vec<SharedRuntimeSource>,
    pub(crate) routes: Option<RouteTable>,
}

impl Knot {
    pub(crate) fn new(
        namespace: String,
        data: Option<Value>,
        state: Option<Value>,
        socket: Option<KnotId>,
        parent: Option<KnotId>,
    ) -> Self {
        let label = namespace
            .rsplit('/')
            .next()
            .unwrap_or(namespace.as_str())
            .to_string();
        Knot {
            label,
            namespace,
            data: data.unwrap_or_else(empty_object),
            state: state.unwrap_or_else(empty_object),
            index: Index::new(),
            wire_data: IndexMap::new(),
            children: IndexMap::new(),
            parent,
            socket,
            runtime: Vec::new(),
            routes: None,
        }
    }

    /// Full slash-delimited path from the owning socket to this knot.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Last namespace segment; unique among siblings.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The knot's local data, untouched by aggregation.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// The knot's local state store. States never affect aggregated data.
    pub fn state(&self) -> &Value {
        &self.state
    }

    /// Label → namespace shortcuts known to this knot.
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// True when this knot is an aggregation boundary: a root or insulated
    /// knot that `fetch("/")` resolves to from anywhere below it.
    pub fn is_socket(&self) -> bool {
        self.socket.is_none()
    }
}

pub(crate) fn empty_object() -> Value {
    Value::Object(Map::new())
}
