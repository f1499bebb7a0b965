//! Shared runtime sources.
//!
//! A shared runtime source is an externally maintained collection of plain
//! values and zero-argument accessors attached to a knot. Sources are never
//! cached: every read resolves the accessors again, so a knot always reports
//! the collaborator's current values.
//!
//! Accessor names follow the `get*` / `is*` / `has*` convention and resolve
//! to the remainder of the name with its first letter lower-cased
//! (`getDuration` → `duration`). Accessors with any other name are never
//! invoked and never appear in a resolved result.

use anyhow::Result;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Reserved key marking failed accessors in a resolved runtime result.
///
/// A failing accessor stores this marker as its property value; the rendered
/// error itself is collected in a nested map under this key, keyed by
/// property name.
pub const SRO_ERROR: &str = "sroError";

type Accessor = Arc<dyn Fn() -> Result<Value> + Send + Sync>;

#[derive(Clone)]
enum Member {
    Value(Value),
    Accessor(Accessor),
}

/// An ordered set of plain values and fallible zero-argument accessors.
///
/// Multiple sources attached to the same knot merge in registration order,
/// later sources winning on key collisions.
#[derive(Clone, Default)]
pub struct SharedRuntimeSource {
    members: IndexMap<String, Member>,
}

impl SharedRuntimeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a plain value, copied into every resolved result as-is.
    pub fn value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.members.insert(name.into(), Member::Value(value));
        self
    }

    /// Attach a zero-argument accessor.
    ///
    /// Only accessors named `get*`, `is*` or `has*` are invoked during
    /// resolution; a bare prefix (`"get"`) or any other name is dropped.
    pub fn accessor<F>(mut self, name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn() -> Result<Value> + Send + Sync + 'static,
    {
        self.members
            .insert(name.into(), Member::Accessor(Arc::new(accessor)));
        self
    }

    /// Resolve this source into a flat property object.
    ///
    /// Accessor failures are captured, never propagated: the property is set
    /// to the [`SRO_ERROR`] marker and the rendered error is recorded in the
    /// error bag under the same name.
    pub(crate) fn resolve(&self) -> Value {
        let mut result = Map::new();
        for (name, member) in &self.members {
            match member {
                Member::Value(value) => {
                    result.insert(name.clone(), value.clone());
                }
                Member::Accessor(accessor) => {
                    let Some(key) = accessor_key(name) else {
                        continue;
                    };
                    match accessor() {
                        Ok(value) => {
                            result.insert(key, value);
                        }
                        Err(err) => {
                            result.insert(key.clone(), Value::String(SRO_ERROR.to_string()));
                            let bag = result
                                .entry(SRO_ERROR.to_string())
                                .or_insert_with(|| Value::Object(Map::new()));
                            if let Value::Object(bag) = bag {
                                bag.insert(key, Value::String(format!("{err:#}")));
                            }
                        }
                    }
                }
            }
        }
        Value::Object(result)
    }
}

impl fmt::Debug for SharedRuntimeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedRuntimeSource")
            .field("members", &self.members.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Resolve an accessor name to its property key: `getDuration` → `duration`,
/// `isPlaying` → `playing`, `hasError` → `error`. Anything else is `None`.
fn accessor_key(name: &str) -> Option<String> {
    let rest = ["get", "is", "has"]
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accessor_key_strips_known_prefixes() {
        assert_eq!(accessor_key("getDuration").as_deref(), Some("duration"));
        assert_eq!(accessor_key("isPlaying").as_deref(), Some("playing"));
        assert_eq!(accessor_key("hasError").as_deref(), Some("error"));
    }

    #[test]
    fn accessor_key_rejects_other_names() {
        assert_eq!(accessor_key("play"), None);
        assert_eq!(accessor_key("fetchState"), None);
    }

    #[test]
    fn accessor_key_rejects_bare_prefixes() {
        assert_eq!(accessor_key("get"), None);
        assert_eq!(accessor_key("is"), None);
        assert_eq!(accessor_key("has"), None);
    }

    #[test]
    fn values_copy_as_is() {
        let source = SharedRuntimeSource::new().value("time", json!(1));
        assert_eq!(source.resolve(), json!({"time": 1}));
    }

    #[test]
    fn accessors_resolve_under_their_property_name() {
        let source = SharedRuntimeSource::new()
            .accessor("getDuration", || Ok(json!(2)))
            .accessor("isPlaying", || Ok(json!(true)))
            .accessor("hasStarted", || Ok(json!(false)));
        assert_eq!(
            source.resolve(),
            json!({"duration": 2, "playing": true, "started": false})
        );
    }

    #[test]
    fn unrecognized_accessors_are_never_invoked() {
        use std::sync::atomic::{AtomicBool, Ordering};
        let invoked = Arc::new(AtomicBool::new(false));
        let flag = invoked.clone();
        let source = SharedRuntimeSource::new().accessor("play", move || {
            flag.store(true, Ordering::SeqCst);
            Ok(json!(null))
        });

        assert_eq!(source.resolve(), json!({}));
        assert!(!invoked.load(Ordering::SeqCst));
    }

    #[test]
    fn failures_are_captured_in_the_error_bag() {
        let source = SharedRuntimeSource::new()
            .accessor("getDuration", || Ok(json!(2)))
            .accessor("isPlaying", || Err(anyhow::anyhow!("not wired up")))
            .value("time", json!(1));

        let resolved = source.resolve();
        assert_eq!(resolved["duration"], json!(2));
        assert_eq!(resolved["playing"], json!(SRO_ERROR));
        assert_eq!(resolved["time"], json!(1));
        assert_eq!(resolved[SRO_ERROR]["playing"], json!("not wired up"));
    }

    #[test]
    fn later_members_override_earlier_names() {
        let source = SharedRuntimeSource::new()
            .value("duration", json!(1))
            .accessor("getDuration", || Ok(json!(2)));
        assert_eq!(source.resolve(), json!({"duration": 2}));
    }
}
