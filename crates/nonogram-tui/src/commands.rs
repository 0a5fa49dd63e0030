use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::ExitCode;

use nonogram_core::codec::read_picture;
use nonogram_core::{BacktrackEngine, Cell, JsonCodec, NoteError, Puzzle, PuzzleCodec};

use crate::cli::{Cli, Command, CreateArgs, InfoField, NoteCommand, OutputArgs, SolveArgs};
use crate::config::{OutputTarget, SessionConfig};
use crate::error::SessionError;
use crate::session::{RunSummary, Session};
use crate::sink::{ensure_single, open_artifact};

/// Exit status of a solve that ran cleanly but found nothing
const NO_SOLUTIONS: u8 = 2;

pub fn run(cli: &Cli) -> Result<ExitCode, SessionError> {
    match &cli.command {
        Command::Solve(args) => solve(cli, args),
        Command::Config(args) => {
            println!("{}", args.session_config(cli.verbose()));
            Ok(ExitCode::SUCCESS)
        }
        Command::Create(args) => create(cli, args),
        Command::Check => check(cli),
        Command::Info { field, output } => info(cli, *field, output),
        Command::Note(command) => note(cli, command),
    }
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>, SessionError> {
    match path {
        Some(path) => fs::read(path).map_err(|e| SessionError::io(path.display().to_string(), e)),
        None => {
            let mut bytes = Vec::new();
            io::stdin()
                .read_to_end(&mut bytes)
                .map_err(|e| SessionError::io("standard input", e))?;
            Ok(bytes)
        }
    }
}

fn input_name(cli: &Cli) -> String {
    cli.input
        .as_deref()
        .map_or_else(|| "standard input".into(), |path| path.display().to_string())
}

fn load_puzzle(cli: &Cli) -> Result<Puzzle, SessionError> {
    let bytes = read_input(cli.input.as_deref())?;
    Ok(JsonCodec.load(&bytes)?)
}

fn write_artifact(
    target: &OutputTarget,
    artifact: &'static str,
    bytes: &[u8],
) -> Result<(), SessionError> {
    let Some(mut out) = open_artifact(target, artifact)? else {
        return Ok(());
    };
    out.write_all(bytes)
        .and_then(|()| out.flush())
        .map_err(|e| SessionError::io(target.describe(), e))
}

/// An imbalanced puzzle has no solution, so the search is skipped unless
/// someone is watching it
pub fn engine_should_run(imbalance: i64, display_enabled: bool) -> bool {
    imbalance == 0 || display_enabled
}

fn solve(cli: &Cli, args: &SolveArgs) -> Result<ExitCode, SessionError> {
    let config = args.session_config(cli.verbose());
    let puzzle = load_puzzle(cli)?;
    if puzzle.imbalance() != 0 && config.verbose {
        log::warn!("puzzle ({}) has imbalance: {}", input_name(cli), puzzle.imbalance());
    }
    let summary = solve_puzzle(puzzle, &config)?;

    if config.count_on_stderr {
        eprintln!("{}", summary.solutions);
    }
    if config.count_on_stdout {
        println!("{}", summary.solutions);
    }
    if summary.solutions == 0 {
        return Ok(ExitCode::from(NO_SOLUTIONS));
    }
    Ok(ExitCode::SUCCESS)
}

fn solve_puzzle(puzzle: Puzzle, config: &SessionConfig) -> Result<RunSummary, SessionError> {
    let imbalance = puzzle.imbalance();
    let buffer = vec![Cell::Unknown; puzzle.cell_count()];
    let mut session = Session::start(puzzle, buffer, config, BacktrackEngine::new())?;

    let summary = if engine_should_run(imbalance, config.display_enabled()) {
        let summary = session.run()?;
        if !summary.exhausted {
            log::info!("solution limit of {} reached", config.limit);
        }
        summary
    } else {
        log::info!("skipping search of imbalanced puzzle");
        session.shutdown()?;
        session.summary()
    };

    let failed = session.errors().len();
    if failed > 0 {
        log::warn!("{failed} of {} solutions could not be written", summary.solutions);
    }
    log::info!("{} solutions in {} steps", summary.solutions, summary.steps);
    Ok(summary)
}

fn create(cli: &Cli, args: &CreateArgs) -> Result<ExitCode, SessionError> {
    let target = args.output.target();
    ensure_single(&target, "puzzle")?;
    let bytes = read_input(cli.input.as_deref())?;
    let grid = read_picture(&String::from_utf8_lossy(&bytes), args.solid, args.dot)?;
    let mut puzzle = Puzzle::from_grid(&grid)?;
    puzzle.set_title(args.title.clone());
    write_artifact(&target, "puzzle", &JsonCodec.save(&puzzle))?;
    Ok(ExitCode::SUCCESS)
}

fn check(cli: &Cli) -> Result<ExitCode, SessionError> {
    let imbalance = load_puzzle(cli)?.imbalance();
    println!("{imbalance}");
    if cli.verbose() && imbalance != 0 {
        let heavier = if imbalance > 0 { "Row" } else { "Column" };
        eprintln!("{heavier}-heaviness: {}", imbalance.abs());
    }
    Ok(ExitCode::SUCCESS)
}

fn info(cli: &Cli, field: InfoField, output: &OutputArgs) -> Result<ExitCode, SessionError> {
    let target = output.target();
    ensure_single(&target, "value")?;
    let text = info_text(&load_puzzle(cli)?, field);
    write_artifact(&target, "value", text.as_bytes())?;
    Ok(ExitCode::SUCCESS)
}

/// One puzzle attribute as a line of text; an untitled puzzle prints nothing
fn info_text(puzzle: &Puzzle, field: InfoField) -> String {
    match field {
        InfoField::Title => puzzle.title().map(|title| format!("{title}\n")).unwrap_or_default(),
        InfoField::Width => format!("{}\n", puzzle.width()),
        InfoField::Height => format!("{}\n", puzzle.height()),
    }
}

fn note(cli: &Cli, command: &NoteCommand) -> Result<ExitCode, SessionError> {
    match command {
        NoteCommand::Get { name, output } => {
            let target = output.target();
            ensure_single(&target, "note value")?;
            let puzzle = load_puzzle(cli)?;
            let value = puzzle.note(name)?;
            write_artifact(&target, "note value", format!("{value}\n").as_bytes())?;
        }
        NoteCommand::Set {
            name,
            value,
            safe,
            output,
        } => {
            let target = output.target();
            ensure_single(&target, "puzzle")?;
            let mut puzzle = load_puzzle(cli)?;
            set_note(&mut puzzle, name, value, *safe, cli.verbose())?;
            write_artifact(&target, "puzzle", &JsonCodec.save(&puzzle))?;
        }
        NoteCommand::Unset { name, output } => {
            let target = output.target();
            ensure_single(&target, "puzzle")?;
            let mut puzzle = load_puzzle(cli)?;
            puzzle.unset_note(name)?;
            write_artifact(&target, "puzzle", &JsonCodec.save(&puzzle))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// A safe set of an existing note fails when verbose; quietly it leaves the
/// puzzle as it was
fn set_note(
    puzzle: &mut Puzzle,
    name: &str,
    value: &str,
    safe: bool,
    verbose: bool,
) -> Result<(), SessionError> {
    match puzzle.set_note(name, value, safe) {
        Ok(()) => Ok(()),
        Err(err @ NoteError::AlreadyExists(_)) if !verbose => {
            log::debug!("{err}");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
