//! Results of automated precision tests, keyed by config identity tags.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::tree::ConfigTree;

/// One tested configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestedResult {
    pub cuid: String,
    pub default_cfg: String,
    pub label: String,
    pub level: String,
    pub result: String,
    pub runtime: u64,
    pub error: f64,
    /// Identity tag of each entry the test ran with a non-default setting.
    pub exceptions: HashMap<String, String>,
}

impl ConfigTree {
    /// Mark every attached node named by a result's exceptions as tested and
    /// give its subtree that result's error. Later results overwrite earlier
    /// ones. Returns how many tags matched a node.
    pub fn apply_tested_results(&mut self, results: &[TestedResult]) -> usize {
        let lookup = self.tag_index();
        let mut matched = 0;
        for result in results {
            for tag in result.exceptions.keys() {
                if let Some(&id) = lookup.get(tag) {
                    self.node_mut(id).tested = true;
                    self.set_error(id, result.error);
                    matched += 1;
                }
            }
        }
        tracing::debug!(results = results.len(), matched, "tested results applied");
        matched
    }
}
