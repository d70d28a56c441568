//! Solver configuration stored in `cube-solver.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::planner::{Subgoal, SubgoalPlanner};

pub const DEFAULT_CONFIG_PATH: &str = "cube-solver.toml";

/// Solver configuration (TOML).
///
/// Missing fields default to values that work with a `cube-search` binary on
/// `PATH` and the built-in layer-by-layer strategy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SolverConfig {
    /// Directory for per-subgoal engine logs. Nothing is written when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    pub engine: EngineConfig,

    /// Replaces the built-in strategy when non-empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subgoals: Vec<Subgoal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Program plus leading arguments (e.g. `["cube-search", "--quiet"]`).
    pub command: Vec<String>,

    /// Per-subgoal wall-clock budget in seconds.
    pub timeout_secs: u64,

    /// Keep at most this many bytes of engine stdout/stderr.
    pub output_limit_bytes: usize,

    /// Argument of the `search` protocol command.
    pub search: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: vec!["cube-search".to_string()],
            timeout_secs: 60,
            output_limit_bytes: 1_000_000,
            search: "tree astar".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.engine.timeout_secs == 0 {
            return Err(anyhow!("engine.timeout_secs must be > 0"));
        }
        if self.engine.output_limit_bytes == 0 {
            return Err(anyhow!("engine.output_limit_bytes must be > 0"));
        }
        if self.engine.command.is_empty() || self.engine.command[0].trim().is_empty() {
            return Err(anyhow!("engine.command must be a non-empty array"));
        }
        if self.engine.search.trim().is_empty() {
            return Err(anyhow!("engine.search must not be empty"));
        }
        for (i, subgoal) in self.subgoals.iter().enumerate() {
            if subgoal.name.trim().is_empty() {
                return Err(anyhow!("subgoals[{i}].name must not be empty"));
            }
        }
        Ok(())
    }

    /// Strategy for a run: the configured subgoals, or layer-by-layer.
    pub fn planner(&self) -> SubgoalPlanner {
        if self.subgoals.is_empty() {
            SubgoalPlanner::layer_by_layer()
        } else {
            SubgoalPlanner::new(self.subgoals.clone())
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SolverConfig::default()`.
pub fn load_config(path: &Path) -> Result<SolverConfig> {
    if !path.exists() {
        let cfg = SolverConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SolverConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &SolverConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
