//! File-level loaders and savers.
//!
//! These are thin wrappers: they read or write the whole file eagerly and hand
//! the content to the in-memory models. Failures leave any model the caller
//! already holds untouched.

use std::path::Path;

use anyhow::{Context, Result};

use crate::error::MergeReport;
use crate::ingest::parse_log_bytes;
use crate::log::LogFile;
use crate::reconcile::LogMergeSummary;
use crate::settings::{IngestOptions, LoadOptions, SessionConfig};
use crate::tested::TestedResult;
use crate::tree::{ConfigFile, ConfigTree};

/// Read a config file and build its tree.
pub fn load_config_file(path: &Path, options: &LoadOptions) -> Result<ConfigFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    Ok(ConfigFile::from_lines(text.lines(), options))
}

/// Write misc lines then every structured entry, one per line.
pub fn save_config_file(file: &ConfigFile, path: &Path) -> Result<()> {
    let mut out = String::new();
    for line in file.to_lines() {
        out.push_str(&line);
        out.push('\n');
    }
    std::fs::write(path, out)
        .with_context(|| format!("Failed to write config file at {}", path.display()))?;
    Ok(())
}

/// Merge the config file at `path` into `target`.
pub fn merge_config_file(
    target: &mut ConfigTree,
    path: &Path,
    options: &LoadOptions,
) -> Result<MergeReport> {
    let incoming = load_config_file(path, options)?;
    Ok(target.merge(&incoming.tree))
}

/// Parse an XML log and derive its per-instruction statistics.
pub fn load_log_file(path: &Path, options: &IngestOptions) -> Result<LogFile> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read log file at {}", path.display()))?;
    let mut log = parse_log_bytes(&bytes, options)
        .with_context(|| format!("Failed to parse log file at {}", path.display()))?;
    log.refresh_instruction_stats();
    Ok(log)
}

/// Merge the log at `path` into `target` and refresh statistics.
pub fn merge_log_file(
    target: &mut LogFile,
    path: &Path,
    options: &IngestOptions,
) -> Result<LogMergeSummary> {
    let incoming = load_log_file(path, options)?;
    let summary = target.merge(&incoming);
    target.refresh_instruction_stats();
    Ok(summary)
}

/// Read a JSON array of tested results.
pub fn load_tested_results(path: &Path) -> Result<Vec<TestedResult>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tested results at {}", path.display()))?;
    let results: Vec<TestedResult> =
        serde_json::from_str(&json).context("Failed to parse tested results JSON")?;
    Ok(results)
}

/// Read session settings. A missing file is an error; callers wanting defaults
/// should fall back to [`SessionConfig::default`].
pub fn load_session_config(path: &Path) -> Result<SessionConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session config at {}", path.display()))?;
    let config: SessionConfig =
        serde_json::from_str(&json).context("Failed to parse session config JSON")?;
    Ok(config)
}

pub fn save_session_config(config: &SessionConfig, path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(config).context("Failed to serialize session config")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write session config at {}", path.display()))?;
    Ok(())
}
