use thiserror::Error;

use crate::model::NodeKind;

/// Failure to tokenize a raw log event stream.
///
/// Schema-level surprises (unknown elements or attributes, text in an element
/// combination nothing listens to) never produce this; they are dropped.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The bytes are not well-formed XML.
    #[error("Malformed log XML at byte {position}: {source}")]
    Xml { position: u64, source: quick_xml::Error },

    #[error("Malformed attribute at byte {position}: {source}")]
    Attribute { position: u64, source: quick_xml::events::attributes::AttrError },

    /// An element or attribute name is not valid UTF-8.
    #[error("Invalid UTF-8 in log XML name: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Convenience result type for ingestion.
pub type IngestResult<T> = Result<T, IngestError>;

/// One structural mismatch found while merging config trees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeIssue {
    #[error("Mismatched labels for {incoming} (expected {original})")]
    RootLabelMismatch { original: String, incoming: String },

    /// An incoming entry had no same-label counterpart under the matched parent.
    #[error("Cannot find original entry for {} {label}", .kind.keyword())]
    MissingEntry { kind: NodeKind, label: String },
}

/// Everything that went wrong during one best-effort merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub issues: Vec<MergeIssue>,
}

impl MergeReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub(crate) fn push(&mut self, issue: MergeIssue) {
        tracing::warn!(%issue, "merge mismatch");
        self.issues.push(issue);
    }
}

impl std::fmt::Display for MergeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.issues.is_empty() {
            return write!(f, "Merge completed without errors");
        }
        write!(f, "Errors merging configurations:")?;
        for issue in &self.issues {
            write!(f, "\n  {issue}")?;
        }
        Ok(())
    }
}
