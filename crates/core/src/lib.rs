//! craft-core
//!
//! Core library for reconciling an instrumentation tool's configuration tree
//! with the runtime logs it produces.
//!
//! The crate holds the config-line codec and tree model (status and precision
//! resolution, aggregation, pruning), the XML log model and its ingestion, and
//! the merge logic for trees and logs. Rendering and argument parsing belong to
//! frontends; they read state back through the query methods here.

pub mod error;
pub mod ingest;
pub mod io;
pub mod log;
pub mod model;
pub mod reconcile;
pub mod settings;
pub mod tested;
pub mod tree;

pub use error::{IngestError, MergeIssue, MergeReport};
pub use log::LogFile;
pub use model::{NodeKind, NodeStatus};
pub use tree::{ConfigFile, ConfigNode, ConfigTree, NodeId};

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
