//! Rubik's cube notation tools and staged solver.
//!
//! Converts cube states between positional and color notation, applies move
//! sequences, and solves a cube subgoal by subgoal with an external search
//! engine (`cube-search` by default, see `cube-solver.toml`).

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use cube_solver::convert::{forward, is_error, reverse};
use cube_solver::core::facelet::{FaceletState, Notation};
use cube_solver::core::moves::apply_sequence;
use cube_solver::core::notation::to_positional;
use cube_solver::exit_codes;
use cube_solver::io::config::{DEFAULT_CONFIG_PATH, SolverConfig, load_config};
use cube_solver::io::plan_log::write_report;
use cube_solver::io::solver::ExternalSolverClient;
use cube_solver::io::transcripts::{
    DEFAULT_STORE_PATH, JsonTranscriptStore, Transcript, TranscriptStore,
};
use cube_solver::logging;
use cube_solver::pipeline::SolvePipeline;
use cube_solver::plan::render_plan;

#[derive(Parser)]
#[command(
    name = "cube-solver",
    version,
    about = "Rubik's cube notation tools and staged solver"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a state and print it in color notation (or an `Error:` line).
    Convert { state: String },
    /// Convert a color-notation state to positional notation.
    ToPositional { state: String },
    /// Print `positional`, `color` or `invalid`.
    Check { state: String },
    /// Apply a move sequence such as "R U R' U'" and print the result.
    Apply { state: String, moves: String },
    /// Solve a state subgoal by subgoal and print the plan.
    Solve {
        state: String,
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
        /// Engine executable, replacing `engine.command` from the config.
        #[arg(long)]
        engine: Option<PathBuf>,
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Write the structured report here as JSON.
        #[arg(long)]
        plan_out: Option<PathBuf>,
    },
    /// Inspect or extend the saved transcript store.
    Transcripts {
        #[arg(long, default_value = DEFAULT_STORE_PATH)]
        store: PathBuf,
        #[command(subcommand)]
        action: TranscriptCommand,
    },
}

#[derive(Subcommand)]
enum TranscriptCommand {
    /// List every saved transcript.
    List,
    /// Case-insensitive search over titles and transcript text.
    Search { keyword: String },
    /// Print one transcript as JSON.
    Show { video_id: String },
    /// Save a transcript, replacing any with the same video id.
    Add {
        video_id: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        channel: String,
        #[arg(long, default_value = "")]
        url: String,
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        /// Read the transcript text from a file.
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Convert { state } => Ok(print_result(&forward(&state))),
        Command::ToPositional { state } => Ok(print_result(&reverse(&state))),
        Command::Check { state } => cmd_check(&state),
        Command::Apply { state, moves } => cmd_apply(&state, &moves),
        Command::Solve {
            state,
            config,
            engine,
            timeout_secs,
            plan_out,
        } => {
            let mut cfg = load_config(&config)
                .with_context(|| format!("load config {}", config.display()))?;
            apply_overrides(&mut cfg, engine, timeout_secs)?;
            cmd_solve(&state, &cfg, plan_out)
        }
        Command::Transcripts { store, action } => {
            let mut store = JsonTranscriptStore::open(&store)?;
            cmd_transcripts(&mut store, action)
        }
    }
}

fn print_result(result: &str) -> i32 {
    println!("{result}");
    if is_error(result) {
        exit_codes::INVALID
    } else {
        exit_codes::OK
    }
}

fn cmd_check(state: &str) -> Result<i32> {
    let notation = FaceletState::parse(state)
        .map(|s| s.notation())
        .unwrap_or(Notation::Invalid);
    println!("{}", notation.as_str());
    Ok(match notation {
        Notation::Invalid => exit_codes::INVALID,
        Notation::Positional | Notation::Color => exit_codes::OK,
    })
}

fn cmd_apply(state: &str, moves: &str) -> Result<i32> {
    let start = FaceletState::parse(state).context("parse state")?;
    if start.notation() == Notation::Invalid {
        bail!("state is neither valid positional nor color notation");
    }
    let result = apply_sequence(&start, moves).context("apply moves")?;
    println!("{result}");
    Ok(exit_codes::OK)
}

fn apply_overrides(
    cfg: &mut SolverConfig,
    engine: Option<PathBuf>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    if let Some(engine) = engine {
        cfg.engine.command = vec![engine.to_string_lossy().into_owned()];
    }
    if let Some(timeout_secs) = timeout_secs {
        cfg.engine.timeout_secs = timeout_secs;
    }
    cfg.validate()
}

fn cmd_solve(state: &str, cfg: &SolverConfig, plan_out: Option<PathBuf>) -> Result<i32> {
    let initial = to_positional(state).context("invalid cube state")?;
    let client = ExternalSolverClient::from_config(cfg)?;
    let planner = cfg.planner();
    let report = SolvePipeline::new(&planner, &client).run(initial);

    print!("{}", render_plan(&report)?);
    if let Some(path) = plan_out {
        write_report(&path, &report)
            .with_context(|| format!("write plan {}", path.display()))?;
    }

    Ok(if report.is_solved() {
        exit_codes::OK
    } else {
        exit_codes::SOLVE_FAILED
    })
}

fn cmd_transcripts<S: TranscriptStore>(store: &mut S, action: TranscriptCommand) -> Result<i32> {
    match action {
        TranscriptCommand::List => {
            for record in store.list_all() {
                println!("{}\t{}\t{}", record.video_id, record.title, record.channel);
            }
        }
        TranscriptCommand::Search { keyword } => {
            let results = store.search_by_keyword(&keyword);
            if results.is_empty() {
                println!("No local transcripts found containing the keyword '{keyword}'.");
            }
            for (i, record) in results.iter().enumerate() {
                println!(
                    "--- Result {} ---\nTitle: {}\nChannel: {}\nContent Snippet: {}\n",
                    i + 1,
                    record.title,
                    record.channel,
                    record.transcript
                );
            }
        }
        TranscriptCommand::Show { video_id } => {
            let record = store
                .lookup_by_video_id(&video_id)
                .with_context(|| format!("no transcript for video id {video_id}"))?;
            println!("{}", serde_json::to_string_pretty(record)?);
        }
        TranscriptCommand::Add {
            video_id,
            title,
            channel,
            url,
            text,
            file,
        } => {
            let transcript = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => fs::read_to_string(&path)
                    .with_context(|| format!("read {}", path.display()))?,
                (None, None) => bail!("transcript text required (--text or --file)"),
            };
            store.insert(Transcript::new(video_id, title, channel, transcript).with_url(url))?;
        }
    }
    Ok(exit_codes::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_solve_with_overrides() {
        let cli = Cli::parse_from([
            "cube-solver",
            "solve",
            "UUU",
            "--engine",
            "/opt/cube-search",
            "--timeout-secs",
            "5",
        ]);
        match cli.command {
            Command::Solve {
                state,
                config,
                engine,
                timeout_secs,
                plan_out,
            } => {
                assert_eq!(state, "UUU");
                assert_eq!(config, PathBuf::from(DEFAULT_CONFIG_PATH));
                assert_eq!(engine, Some(PathBuf::from("/opt/cube-search")));
                assert_eq!(timeout_secs, Some(5));
                assert!(plan_out.is_none());
            }
            _ => panic!("expected solve"),
        }
    }

    #[test]
    fn parse_transcripts_search() {
        let cli = Cli::parse_from(["cube-solver", "transcripts", "search", "cross"]);
        assert!(matches!(
            cli.command,
            Command::Transcripts {
                action: TranscriptCommand::Search { .. },
                ..
            }
        ));
    }

    #[test]
    fn overrides_replace_engine_and_timeout() {
        let mut cfg = SolverConfig::default();
        apply_overrides(&mut cfg, Some(PathBuf::from("/opt/engine")), Some(7)).expect("ok");
        assert_eq!(cfg.engine.command, vec!["/opt/engine".to_string()]);
        assert_eq!(cfg.engine.timeout_secs, 7);
        assert!(apply_overrides(&mut cfg, None, Some(0)).is_err());
    }
}
