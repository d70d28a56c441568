//! Solve artifacts: per-subgoal engine logs and the JSON report.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::types::SolveReport;
use crate::io::config::write_atomic;
use crate::io::process::CommandOutput;

/// `<dir>/subgoal-<step>.log`, with `step` 1-based.
pub fn engine_log_path(dir: &Path, step: usize) -> PathBuf {
    dir.join(format!("subgoal-{step}.log"))
}

/// Write the raw engine exchange, capped at `output_limit` bytes.
pub fn write_engine_log(
    path: &Path,
    script: &str,
    output: &CommandOutput,
    output_limit: usize,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create engine log dir {}", parent.display()))?;
    }
    let mut buf = String::new();
    buf.push_str("=== stdin ===\n");
    buf.push_str(script);
    buf.push_str("=== stdout ===\n");
    buf.push_str(&output.stdout_text());
    buf.push_str(&output.stdout_truncated_notice("engine"));
    buf.push_str("\n=== stderr ===\n");
    buf.push_str(&output.stderr_text());
    buf.push_str(&output.stderr_truncated_notice("engine"));
    if output.timed_out {
        buf.push_str("\n[engine timed out]\n");
    }
    if output.cancelled {
        buf.push_str("\n[engine cancelled]\n");
    }

    if buf.len() > output_limit {
        let cut = floor_char_boundary(&buf, output_limit);
        let truncated = format!("{}\n[truncated {} bytes]\n", &buf[..cut], buf.len() - cut);
        return fs::write(path, truncated)
            .with_context(|| format!("write engine log {}", path.display()));
    }

    fs::write(path, buf).with_context(|| format!("write engine log {}", path.display()))
}

/// Pretty JSON with a trailing newline, replaced atomically.
pub fn write_report(path: &Path, report: &SolveReport) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(report).context("serialize solve report")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    use crate::core::facelet::FaceletState;
    use crate::core::types::SolveOutcome;

    fn output(stdout: &str, stderr: &str) -> CommandOutput {
        CommandOutput {
            status: ExitStatus::from_raw(0),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
            stdout_truncated: 0,
            stderr_truncated: 0,
            timed_out: false,
            cancelled: false,
        }
    }

    #[test]
    fn engine_log_has_sections() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = engine_log_path(&temp.path().join("logs"), 2);
        assert!(path.ends_with("logs/subgoal-2.log"));

        write_engine_log(&path, "exit\n", &output("Solution: R U\n", "warming up"), 10_000)
            .expect("write");
        let contents = fs::read_to_string(&path).expect("read");
        assert!(contents.starts_with("=== stdin ===\nexit\n=== stdout ===\nSolution: R U\n"));
        assert!(contents.contains("=== stderr ===\nwarming up"));
    }

    #[test]
    fn engine_log_is_capped() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("subgoal-1.log");
        write_engine_log(&path, "", &output(&"x".repeat(500), ""), 64).expect("write");
        let contents = fs::read_to_string(&path).expect("read");
        assert!(contents.contains("[truncated"));
        assert!(contents.len() < 200);
    }

    #[test]
    fn report_is_pretty_json_with_newline() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("plan.json");
        let report = SolveReport {
            initial: FaceletState::solved(),
            steps: Vec::new(),
            skipped: vec!["cross".to_string()],
            final_state: FaceletState::solved(),
            outcome: SolveOutcome::Solved,
        };
        write_report(&path, &report).expect("write");
        let contents = fs::read_to_string(&path).expect("read");
        assert!(contents.ends_with("}\n"));
        let value: serde_json::Value = serde_json::from_str(&contents).expect("parse");
        assert_eq!(value["outcome"]["status"], "solved");
        assert_eq!(value["skipped"][0], "cross");
    }
}
