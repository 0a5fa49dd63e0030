use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{
    DisplayKind, FilePattern, Format, Glyphs, LogTarget, OutputTarget, SessionConfig,
};

#[derive(Debug, Parser)]
#[command(
    name = "nonogram",
    author,
    version,
    about = "Solve, create and annotate nonogram puzzles"
)]
pub struct Cli {
    /// Read from FILE instead of standard input
    #[arg(short, long, global = true, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Only report errors, and only briefly
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn verbose(&self) -> bool {
        !self.quiet
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Solve the puzzle and write every solution found
    Solve(SolveArgs),
    /// Print the settings `solve` would run with
    Config(SolveArgs),
    /// Build a puzzle from a picture drawn as text
    Create(CreateArgs),
    /// Report how many more cells the row clues fill than the column clues
    Check,
    /// Print one property of the puzzle
    Info {
        #[arg(value_enum)]
        field: InfoField,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Read or change the puzzle's notes
    #[command(subcommand)]
    Note(NoteCommand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InfoField {
    Title,
    Width,
    Height,
}

#[derive(Debug, Subcommand)]
pub enum NoteCommand {
    /// Print the value of a note
    Get {
        name: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Set a note and write the updated puzzle
    Set {
        name: String,
        value: String,
        /// Leave an existing note untouched
        #[arg(long)]
        safe: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Remove a note and write the updated puzzle
    Unset {
        name: String,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Write to FILE instead of standard output
    #[arg(short, long, value_name = "FILE", conflicts_with_all = ["numbered", "no_output"])]
    pub output: Option<PathBuf>,

    /// Write each solution to its own file, named by PATTERN with one %d
    #[arg(long, value_name = "PATTERN", conflicts_with = "no_output")]
    pub numbered: Option<FilePattern>,

    /// Discard the output
    #[arg(long)]
    pub no_output: bool,
}

impl OutputArgs {
    pub fn target(&self) -> OutputTarget {
        if self.no_output {
            OutputTarget::None
        } else if let Some(pattern) = &self.numbered {
            OutputTarget::Numbered(pattern.clone())
        } else if let Some(path) = &self.output {
            OutputTarget::File(path.clone())
        } else {
            OutputTarget::Stdout
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct FormatArgs {
    /// Write solutions as rows of an HTML table
    #[arg(long)]
    pub html: bool,

    /// With --html, put each whole grid in a single table cell
    #[arg(long)]
    pub no_table: bool,

    /// Text (or image path with --html) for solid cells
    #[arg(long, value_name = "TEXT")]
    pub solid: Option<String>,

    /// Text (or image path with --html) for dots
    #[arg(long, value_name = "TEXT")]
    pub dot: Option<String>,

    /// Text (or image path with --html) for blank cells
    #[arg(long, value_name = "TEXT")]
    pub blank: Option<String>,
}

impl FormatArgs {
    pub fn format(&self) -> Format {
        let mut glyphs = if self.html { Glyphs::markup() } else { Glyphs::plain() };
        if let Some(solid) = &self.solid {
            glyphs.solid = solid.clone();
        }
        if let Some(dot) = &self.dot {
            glyphs.dot = dot.clone();
        }
        if let Some(blank) = &self.blank {
            glyphs.blank = blank.clone();
        }
        if self.html {
            Format::Markup {
                glyphs,
                table: !self.no_table,
            }
        } else {
            Format::Plain(glyphs)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Escape sequences on standard error
    Terminal,
    /// BBC VDU plot codes on standard error
    Plotter,
    /// Track progress without drawing it
    Null,
}

#[derive(Debug, Clone, Args)]
pub struct SolveArgs {
    #[command(flatten)]
    pub output: OutputArgs,

    #[command(flatten)]
    pub format: FormatArgs,

    /// Show the search on the terminal while solving
    #[arg(short, long)]
    pub visual: bool,

    /// How to draw the search; implies --visual
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Stop after N solutions, 0 for all of them
    #[arg(short = 's', long, value_name = "N", default_value_t = 0)]
    pub limit: usize,

    /// Record the session in FILE, appending to what is there
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Start the session log afresh instead of appending
    #[arg(long)]
    pub log_truncate: bool,

    /// Session log detail: 1 records solutions, 2 also records each step
    #[arg(long, value_name = "LEVEL", default_value_t = 1)]
    pub log_level: u32,

    /// Print the number of solutions on standard output
    #[arg(long)]
    pub count_stdout: bool,

    /// Print the number of solutions on standard error
    #[arg(long)]
    pub count_stderr: bool,
}

impl SolveArgs {
    pub fn session_config(&self, verbose: bool) -> SessionConfig {
        let display = match (self.backend, self.visual) {
            (Some(Backend::Terminal), _) | (None, true) => DisplayKind::Terminal,
            (Some(Backend::Plotter), _) => DisplayKind::Plotter,
            (Some(Backend::Null), _) => DisplayKind::Null,
            (None, false) => DisplayKind::Off,
        };
        SessionConfig {
            display,
            output: self.output.target(),
            format: self.format.format(),
            limit: self.limit,
            verbose,
            log: self.log.as_ref().map(|path| LogTarget {
                path: path.clone(),
                append: !self.log_truncate,
                level: self.log_level,
            }),
            count_on_stdout: self.count_stdout,
            count_on_stderr: self.count_stderr,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct CreateArgs {
    #[command(flatten)]
    pub output: OutputArgs,

    /// Title stored in the new puzzle
    #[arg(short, long)]
    pub title: Option<String>,

    /// Character that draws a solid cell in the picture
    #[arg(long, default_value_t = '#')]
    pub solid: char,

    /// Character that draws a dot in the picture
    #[arg(long, default_value_t = '-')]
    pub dot: char,
}
