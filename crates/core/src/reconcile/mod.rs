//! Folding a second config tree or log into a first one.
//!
//! Trees are matched by label, level by level, and assumed to share a shape.
//! Logs are matched by instruction address and by trace structure; serialized
//! ids are only local names and get remapped.

mod log;
mod tree;

pub use log::LogMergeSummary;
