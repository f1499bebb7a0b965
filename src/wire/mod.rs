//! The wire: an arena of knots forming one or more composition trees.
//!
//! A [`Wire`] owns every knot it ever created and addresses them through
//! copyable [`KnotId`] handles, so parent and socket linkage are plain
//! optional ids instead of cyclic references. Trees grow with [`Wire::branch`],
//! resolve paths with [`Wire::fetch`], shrink with [`Wire::truncate`] and
//! re-root with [`Wire::insulate`]. Aggregated views (`wire_data`, the index)
//! are cached per knot and rebuilt by an explicit [`Wire::sync`]; states and
//! shared runtime values are resolved fresh on every read.

pub mod knot;
pub mod labels;

pub use knot::{Knot, KnotId};
pub use labels::LabelSequence;

use crate::error::WireError;
use crate::index::{self, Index, IndexEntry};
use crate::merge;
use crate::route::RouteTable;
use crate::runtime::SharedRuntimeSource;
use indexmap::IndexMap;
use knot::empty_object;
use serde_json::Value;
use tracing::{debug, warn};

/// The composition engine.
///
/// Structural operations take `&mut self`; the whole read surface takes
/// `&self`. Every structural operation leaves the knots it touches synced,
/// so cached aggregates are always present; only mutations through
/// [`Wire::data_mut`] or [`Wire::add_shortcut`] require a follow-up
/// [`Wire::sync`] to become visible in aggregated views.
#[derive(Debug)]
pub struct Wire {
    knots: Vec<Knot>,
    root: KnotId,
    labels: LabelSequence,
}

impl Wire {
    /// Create a wire holding a single root knot, the initial socket.
    ///
    /// Fails with [`WireError::EmptyNamespace`] when `namespace` is empty.
    /// The namespace is otherwise arbitrary and may itself contain `/`; the
    /// root label is its last segment.
    pub fn new(
        namespace: &str,
        data: Option<Value>,
        state: Option<Value>,
    ) -> Result<Wire, WireError> {
        Wire::with_labels(namespace, data, state, LabelSequence::new())
    }

    /// Like [`Wire::new`], with an injected auto-label sequence.
    pub fn with_labels(
        namespace: &str,
        data: Option<Value>,
        state: Option<Value>,
        labels: LabelSequence,
    ) -> Result<Wire, WireError> {
        if namespace.is_empty() {
            return Err(WireError::EmptyNamespace);
        }
        let mut root = Knot::new(namespace.to_string(), data, state, None, None);
        root.routes = Some(RouteTable::new());
        let mut wire = Wire {
            knots: vec![root],
            root: KnotId(0),
            labels,
        };
        wire.sync_knot(wire.root);
        Ok(wire)
    }

    /// Handle of the root knot.
    pub fn root(&self) -> KnotId {
        self.root
    }

    /// Read access to a knot, or `None` for a handle this wire never issued.
    pub fn knot(&self, at: KnotId) -> Option<&Knot> {
        self.knots.get(at.0)
    }

    fn k(&self, at: KnotId) -> &Knot {
        &self.knots[at.0]
    }

    fn k_mut(&mut self, at: KnotId) -> &mut Knot {
        &mut self.knots[at.0]
    }

    //------------------------------------------------------------------
    // composition
    //------------------------------------------------------------------

    /// Create a child knot under `at`.
    ///
    /// The child namespace is `<parent namespace>/<label>`; it inherits the
    /// creator's boundary as its socket. An omitted or empty label is drawn
    /// from the wire's [`LabelSequence`]. Returns `None` when a child with
    /// that label already exists; the existing child is neither replaced
    /// nor returned.
    pub fn branch(
        &mut self,
        at: KnotId,
        data: Option<Value>,
        label: Option<&str>,
        state: Option<Value>,
    ) -> Option<KnotId> {
        let label = match label {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => self.labels.next_label(),
        };
        if self.k(at).children.contains_key(&label) {
            debug!(parent = %self.k(at).namespace, %label, "branch ignored, label exists");
            return None;
        }

        let namespace = format!("{}/{}", self.k(at).namespace, label);
        let socket = Some(self.socket_of(at));
        let id = KnotId(self.knots.len());
        self.knots
            .push(Knot::new(namespace, data, state, socket, Some(at)));
        self.k_mut(at).children.insert(label, id);
        self.sync_knot(id);

        debug!(knot = %self.k(id).namespace, "branched");
        Some(id)
    }

    /// Resolve a namespace path relative to `at`, without mutating anything.
    ///
    /// `"/"` resolves to the knot's socket and `".."` to its parent, each
    /// to the knot itself when it is an unlinked root. A leading `/` roots
    /// the remaining path at the socket, a leading `..` at the parent; other
    /// segments select the knot itself (own label, no remainder) or descend
    /// into the matching child. Anything unresolved is `None`.
    pub fn fetch(&self, at: KnotId, namespace: &str) -> Option<KnotId> {
        if namespace.is_empty() {
            return None;
        }
        if namespace == "/" {
            return Some(self.socket_of(at));
        }
        if namespace == ".." {
            return Some(self.parent_of(at));
        }

        let (head, rest) = match namespace.split_once('/') {
            Some((head, rest)) => (head, Some(rest)),
            None => (namespace, None),
        };
        let knot = self.k(at);
        match head {
            "" => self.fetch(self.socket_of(at), rest?),
            ".." => self.fetch(self.parent_of(at), rest?),
            _ if rest.is_none() && head == knot.label => Some(at),
            _ => {
                let child = *knot.children.get(head)?;
                match rest {
                    None => Some(child),
                    Some(rest) => self.fetch(child, rest),
                }
            }
        }
    }

    /// Detach a knot and reset it to an isolated root.
    ///
    /// With `Some(namespace)` the target is resolved through [`Wire::fetch`]
    /// first; a failed resolution is a no-op. Detaching removes the knot
    /// from its parent's children, recursively truncates its own children
    /// (each becomes an isolated root too), resets `namespace` to the bare
    /// label, clears inherited index and wire data and drops the route
    /// table. Local data, state and runtime sources are preserved.
    pub fn truncate(&mut self, at: KnotId, namespace: Option<&str>) {
        match namespace {
            Some(namespace) => {
                if let Some(target) = self.fetch(at, namespace) {
                    self.truncate_knot(target);
                }
            }
            None => self.truncate_knot(at),
        }
    }

    fn truncate_knot(&mut self, at: KnotId) {
        if let Some(parent) = self.k(at).parent {
            let label = self.k(at).label.clone();
            self.k_mut(parent).children.shift_remove(&label);
        }

        let children: Vec<KnotId> = self.k(at).children.values().copied().collect();
        for child in children {
            self.truncate_knot(child);
        }

        let knot = self.k_mut(at);
        knot.namespace = knot.label.clone();
        knot.children.clear();
        knot.index.clear();
        knot.wire_data.clear();
        knot.parent = None;
        knot.socket = None;
        knot.routes = None;
        self.sync_knot(at);

        debug!(knot = %self.k(at).namespace, "truncated");
    }

    /// Truncate `at` and re-establish it as a socket owning `routes`.
    pub fn insulate(&mut self, at: KnotId, routes: RouteTable) {
        self.truncate_knot(at);
        self.k_mut(at).routes = Some(routes);
        self.sync(at);
        debug!(socket = %self.k(at).namespace, "insulated");
    }

    /// The nearest aggregation boundary: the knot's socket, or the knot
    /// itself when it is an unlinked root.
    pub fn socket_of(&self, at: KnotId) -> KnotId {
        self.k(at).socket.unwrap_or(at)
    }

    /// The immediate parent, or the knot itself when it is an unlinked root.
    pub fn parent_of(&self, at: KnotId) -> KnotId {
        self.k(at).parent.unwrap_or(at)
    }

    /// Handles of the direct children, in insertion order.
    pub fn children(&self, at: KnotId) -> impl Iterator<Item = KnotId> + '_ {
        self.k(at).children.values().copied()
    }

    //------------------------------------------------------------------
    // aggregation
    //------------------------------------------------------------------

    /// Rebuild the cached index and wire data of `at` and every descendant.
    ///
    /// A mutation near the root is observable below only after a sync at or
    /// above the mutated knot; batch mutations and sync once at the highest
    /// affected ancestor.
    pub fn sync(&mut self, at: KnotId) {
        self.sync_knot(at);
        let children: Vec<KnotId> = self.k(at).children.values().copied().collect();
        for child in children {
            self.sync(child);
        }
    }

    fn sync_knot(&mut self, at: KnotId) {
        self.sync_index(at);
        self.sync_data(at);
    }

    fn sync_index(&mut self, at: KnotId) {
        let parent_index: Option<Index> = self.k(at).parent.map(|p| self.k(p).index.clone());

        let knot = self.k_mut(at);
        if knot.index.is_empty() {
            knot.index
                .insert(knot.label.clone(), IndexEntry::One(knot.namespace.clone()));
        }
        if let Some(parent_index) = parent_index {
            for (label, entry) in &parent_index {
                index::update(&mut knot.index, label, entry);
            }
        }
    }

    fn sync_data(&mut self, at: KnotId) {
        let mut wire_data = match self.k(at).parent {
            Some(parent) => self.k(parent).wire_data.clone(),
            None => IndexMap::new(),
        };
        {
            let knot = self.k(at);
            match wire_data.entry(knot.namespace.clone()) {
                indexmap::map::Entry::Occupied(mut slot) => merge::merge(slot.get_mut(), &knot.data),
                indexmap::map::Entry::Vacant(slot) => {
                    slot.insert(knot.data.clone());
                }
            }
        }
        self.k_mut(at).wire_data = wire_data;
    }

    /// The aggregated namespace → data mapping from the boundary down to
    /// `at`, as of the last sync.
    pub fn wire_data(&self, at: KnotId) -> &IndexMap<String, Value> {
        &self.k(at).wire_data
    }

    /// One aggregated entry, addressed by namespace or index shortcut.
    ///
    /// A single-valued shortcut resolves to its target namespace; a promoted
    /// list is ambiguous and the name is used literally. Unknown namespaces
    /// yield an empty object.
    pub fn wire_data_at(&self, at: KnotId, namespace: &str) -> Value {
        let knot = self.k(at);
        let resolved = knot
            .index
            .get(namespace)
            .and_then(IndexEntry::single)
            .unwrap_or(namespace);
        knot.wire_data
            .get(resolved)
            .cloned()
            .unwrap_or_else(empty_object)
    }

    //------------------------------------------------------------------
    // state
    //------------------------------------------------------------------

    /// Write one state key on `at`. States never affect aggregated data.
    pub fn apply_state(&mut self, at: KnotId, name: &str, value: Value) {
        let state = &mut self.k_mut(at).state;
        if !state.is_object() {
            *state = empty_object();
        }
        if let Value::Object(map) = state {
            map.insert(name.to_string(), value);
        }
    }

    /// Copies of every state object from the boundary down to `at`, keyed by
    /// namespace. Recomputed on every call; states are never cached.
    pub fn states(&self, at: KnotId) -> IndexMap<String, Value> {
        self.states_filtered(at, None)
    }

    /// One state object by exact namespace, or an empty object when absent.
    pub fn states_at(&self, at: KnotId, namespace: &str) -> Value {
        self.states_filtered(at, Some(namespace))
            .shift_remove(namespace)
            .unwrap_or_else(empty_object)
    }

    fn states_filtered(&self, at: KnotId, filter: Option<&str>) -> IndexMap<String, Value> {
        let knot = self.k(at);
        let mut result = IndexMap::new();
        if filter.map_or(true, |namespace| namespace == knot.namespace) {
            result.insert(knot.namespace.clone(), knot.state.clone());
        }
        if let Some(parent) = knot.parent {
            for (namespace, state) in self.states_filtered(parent, None) {
                result.entry(namespace).or_insert(state);
            }
        }
        result
    }

    //------------------------------------------------------------------
    // shared runtime
    //------------------------------------------------------------------

    /// Attach a runtime source to `at`. Nothing resolves until values are
    /// read.
    pub fn join_shared_runtime(&mut self, at: KnotId, source: SharedRuntimeSource) {
        self.k_mut(at).runtime.push(source);
    }

    /// Resolved runtime values from the boundary down to `at`, keyed by
    /// namespace. Accessors run on every call; results are never cached.
    pub fn shared_runtime_values(&self, at: KnotId) -> IndexMap<String, Value> {
        self.runtime_filtered(at, None)
    }

    /// Resolved runtime values for one exact namespace, or an empty object
    /// when absent.
    pub fn shared_runtime_values_at(&self, at: KnotId, namespace: &str) -> Value {
        self.runtime_filtered(at, Some(namespace))
            .shift_remove(namespace)
            .unwrap_or_else(empty_object)
    }

    fn runtime_filtered(&self, at: KnotId, filter: Option<&str>) -> IndexMap<String, Value> {
        let knot = self.k(at);
        let mut result = IndexMap::new();
        // a filter that cannot match this knot skips resolving its sources
        if filter.map_or(true, |namespace| namespace == knot.namespace) {
            let resolved: Vec<Value> = knot.runtime.iter().map(|s| s.resolve()).collect();
            result.insert(knot.namespace.clone(), merge::merge_all(&resolved));
        }
        if let Some(parent) = knot.parent {
            for (namespace, values) in self.runtime_filtered(parent, None) {
                result.entry(namespace).or_insert(values);
            }
        }
        result
    }

    //------------------------------------------------------------------
    // routes
    //------------------------------------------------------------------

    /// The route table of the knot's socket, when one is installed.
    pub fn routes(&self, at: KnotId) -> Option<&RouteTable> {
        self.k(self.socket_of(at)).routes.as_ref()
    }

    /// Mutable access to the socket's table. Redefinitions are observed by
    /// every descendant on its next [`Wire::invoke`]; dispatch is late-bound.
    pub fn routes_mut(&mut self, at: KnotId) -> Option<&mut RouteTable> {
        let socket = self.socket_of(at);
        self.k_mut(socket).routes.as_mut()
    }

    /// Invoke a route by name, with `at` as the invoking knot.
    ///
    /// The socket's current table is consulted at call time; the body
    /// receives the invoking knot and the caller's arguments. A missing
    /// route, an absent table or a failing body all yield `None`; route
    /// failures are logged and never propagate.
    pub fn invoke(&self, at: KnotId, name: &str, args: &[Value]) -> Option<Value> {
        let route = self.routes(at)?.get(name)?.clone();
        match route.call(self.k(at), args) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(route = name, knot = %self.k(at).namespace, "route failed: {err:#}");
                None
            }
        }
    }

    //------------------------------------------------------------------
    // local access
    //------------------------------------------------------------------

    /// Full namespace of `at`.
    pub fn namespace(&self, at: KnotId) -> &str {
        &self.k(at).namespace
    }

    /// Label of `at`.
    pub fn label(&self, at: KnotId) -> &str {
        &self.k(at).label
    }

    /// The knot's local data.
    pub fn data(&self, at: KnotId) -> &Value {
        &self.k(at).data
    }

    /// Mutable access to the local data; call [`Wire::sync`] afterwards to
    /// refresh the aggregated views.
    pub fn data_mut(&mut self, at: KnotId) -> &mut Value {
        &mut self.k_mut(at).data
    }

    /// Label → namespace shortcuts known to `at`.
    pub fn index(&self, at: KnotId) -> &Index {
        &self.k(at).index
    }

    /// Define a namespace shortcut on the knot's own index.
    ///
    /// Shortcuts survive rebuilds, take precedence locally and are inherited
    /// (possibly promoted into lists) by descendants on their next sync.
    pub fn add_shortcut(&mut self, at: KnotId, label: &str, namespace: &str) {
        self.k_mut(at)
            .index
            .insert(label.to_string(), IndexEntry::One(namespace.to_string()));
    }
}
