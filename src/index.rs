//! Knot index: label → namespace shortcuts.
//!
//! Aggregated views are keyed by full namespaces, which callers rarely want
//! to spell out. Each knot therefore carries an index mapping labels (and
//! caller-defined shortcuts) to namespaces. A label reused across the tree
//! promotes its entry to a list of namespaces instead of silently dropping
//! one of them.

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Label → namespace mapping held by every knot.
pub type Index = IndexMap<String, IndexEntry>;

/// A single index slot: one namespace, or several once a label collides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexEntry {
    One(String),
    Many(Vec<String>),
}

impl IndexEntry {
    /// The target namespace, when the entry is unambiguous.
    pub fn single(&self) -> Option<&str> {
        match self {
            IndexEntry::One(namespace) => Some(namespace),
            IndexEntry::Many(_) => None,
        }
    }

    /// All namespaces held by this entry, in registration order.
    pub fn namespaces(&self) -> &[String] {
        match self {
            IndexEntry::One(namespace) => std::slice::from_ref(namespace),
            IndexEntry::Many(list) => list,
        }
    }
}

/// Fold one `(label, entry)` pair into an accumulated index.
///
/// New labels are set directly. An existing list appends namespaces it has
/// not seen yet. A scalar colliding with a different namespace is promoted
/// to a two-element list; an equal scalar is left alone. Folding the same
/// pair repeatedly is idempotent.
pub fn update(index: &mut Index, label: &str, incoming: &IndexEntry) {
    for namespace in incoming.namespaces() {
        match index.entry(label.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(IndexEntry::One(namespace.clone()));
            }
            Entry::Occupied(mut slot) => match slot.get_mut() {
                IndexEntry::Many(list) => {
                    if !list.contains(namespace) {
                        list.push(namespace.clone());
                    }
                }
                entry => {
                    if entry.single() != Some(namespace.as_str()) {
                        let existing = entry.namespaces()[0].clone();
                        *entry = IndexEntry::Many(vec![existing, namespace.clone()]);
                    }
                }
            },
        }
    }
}
