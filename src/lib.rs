//! Braid: Hierarchical Data Composition
//!
//! A tree of addressable knots that carry local data, local state and
//! dynamically resolved runtime values, exposing merged views of all three
//! up to a designated boundary knot (a socket). Trees grow with `branch`,
//! are addressed by slash-delimited namespaces via `fetch`, shrink with
//! `truncate` and re-root with `insulate`; cached aggregates refresh on an
//! explicit `sync`, while states and runtime values resolve fresh on every
//! read. Sockets own named routes that every descendant can invoke.

pub mod error;
pub mod index;
pub mod logging;
pub mod merge;
pub mod route;
pub mod runtime;
pub mod wire;

pub use error::{LoggingError, WireError};
pub use index::IndexEntry;
pub use route::{Route, RouteTable};
pub use runtime::{SharedRuntimeSource, SRO_ERROR};
pub use wire::{Knot, KnotId, LabelSequence, Wire};
