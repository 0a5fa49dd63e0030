//! Session configuration: what to draw, where solutions go and how they look.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use nonogram_core::Cell;

pub const DEFAULT_SOLID: &str = "#";
pub const DEFAULT_DOT: &str = "-";
pub const DEFAULT_BLANK: &str = " ";
pub const DEFAULT_MARKUP_SOLID: &str = "icons/solid.xbm";
pub const DEFAULT_MARKUP_DOT: &str = "icons/dot.xbm";
pub const DEFAULT_MARKUP_BLANK: &str = "icons/blank.xbm";

/// Strings written for solid, dot and blank cells.
///
/// In plain output these are the cell tokens; in markup output they are image
/// paths. Unknown cells are written as blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyphs {
    pub solid: String,
    pub dot: String,
    pub blank: String,
}

impl Glyphs {
    pub fn plain() -> Self {
        Self {
            solid: DEFAULT_SOLID.into(),
            dot: DEFAULT_DOT.into(),
            blank: DEFAULT_BLANK.into(),
        }
    }

    pub fn markup() -> Self {
        Self {
            solid: DEFAULT_MARKUP_SOLID.into(),
            dot: DEFAULT_MARKUP_DOT.into(),
            blank: DEFAULT_MARKUP_BLANK.into(),
        }
    }

    pub fn for_cell(&self, cell: Cell) -> &str {
        match cell {
            Cell::Solid => &self.solid,
            Cell::Dot => &self.dot,
            Cell::Blank | Cell::Unknown => &self.blank,
        }
    }
}

/// How a solution is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    /// One line per row, one glyph per cell
    Plain(Glyphs),
    /// HTML rows of images, optionally one table cell per grid cell
    Markup { glyphs: Glyphs, table: bool },
}

impl Default for Format {
    fn default() -> Self {
        Format::Plain(Glyphs::plain())
    }
}

/// Where solutions are delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    None,
    Stdout,
    /// One file holding every solution, opened when the session starts
    File(PathBuf),
    /// A fresh file per solution, named by substituting the solution number
    Numbered(FilePattern),
}

impl OutputTarget {
    pub fn describe(&self) -> String {
        match self {
            OutputTarget::None => "none".into(),
            OutputTarget::Stdout => "standard output".into(),
            OutputTarget::File(path) => path.display().to_string(),
            OutputTarget::Numbered(pattern) => pattern.to_string(),
        }
    }
}

/// Failure to parse a numbering pattern
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum PatternError {
    #[display("pattern `{_0}` has no %d placeholder")]
    NoPlaceholder(#[error(not(source))] String),
    #[display("pattern `{_0}` has more than one placeholder")]
    MultiplePlaceholders(#[error(not(source))] String),
    #[display("pattern `{pattern}` has an unsupported directive at byte {at}")]
    BadDirective { pattern: String, at: usize },
}

/// File name pattern with exactly one integer placeholder.
///
/// The placeholder is `%d`, or `%Nd` / `%0Nd` to pad to `N` digits with
/// spaces or zeros. `%%` stands for a literal percent sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern {
    raw: String,
    prefix: String,
    suffix: String,
    width: usize,
    zero_pad: bool,
}

impl FilePattern {
    /// File name for the 1-based solution `index`
    pub fn path_for(&self, index: usize) -> PathBuf {
        let number = if self.zero_pad {
            format!("{index:0width$}", width = self.width)
        } else {
            format!("{index:width$}", width = self.width)
        };
        PathBuf::from(format!("{}{number}{}", self.prefix, self.suffix))
    }
}

impl FromStr for FilePattern {
    type Err = PatternError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut placeholder: Option<(usize, bool)> = None;
        let mut chars = raw.char_indices().peekable();

        while let Some((at, c)) = chars.next() {
            let text = if placeholder.is_some() { &mut suffix } else { &mut prefix };
            if c != '%' {
                text.push(c);
                continue;
            }
            if chars.next_if(|&(_, c)| c == '%').is_some() {
                text.push('%');
                continue;
            }
            let zero_pad = chars.next_if(|&(_, c)| c == '0').is_some();
            let mut digits = String::new();
            while let Some((_, d)) = chars.next_if(|(_, c)| c.is_ascii_digit()) {
                digits.push(d);
            }
            if chars.next_if(|&(_, c)| c == 'd').is_none() {
                return Err(PatternError::BadDirective {
                    pattern: raw.into(),
                    at,
                });
            }
            if placeholder.is_some() {
                return Err(PatternError::MultiplePlaceholders(raw.into()));
            }
            let width = digits.parse().unwrap_or(0);
            placeholder = Some((width, zero_pad));
        }

        let (width, zero_pad) = placeholder.ok_or_else(|| PatternError::NoPlaceholder(raw.into()))?;
        Ok(Self {
            raw: raw.into(),
            prefix,
            suffix,
            width,
            zero_pad,
        })
    }
}

impl fmt::Display for FilePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Live progress display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayKind {
    /// No display; the engine gets no progress observer at all
    #[default]
    Off,
    /// Escape-sequence rendering on the terminal
    Terminal,
    /// VDU plot codes for legacy graphics hardware
    Plotter,
    /// Display requested but rendering nothing
    Null,
}

impl DisplayKind {
    pub fn is_enabled(self) -> bool {
        self != DisplayKind::Off
    }
}

/// Session log destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub path: PathBuf,
    /// Append to an existing log instead of truncating it
    pub append: bool,
    pub level: u32,
}

impl LogTarget {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Immutable snapshot of a solving session's rendering and output choices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub display: DisplayKind,
    pub output: OutputTarget,
    pub format: Format,
    /// Stop after this many solutions; 0 means no limit
    pub limit: usize,
    pub verbose: bool,
    pub log: Option<LogTarget>,
    pub count_on_stdout: bool,
    pub count_on_stderr: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            display: DisplayKind::Off,
            output: OutputTarget::Stdout,
            format: Format::default(),
            limit: 0,
            verbose: true,
            log: None,
            count_on_stdout: false,
            count_on_stderr: false,
        }
    }
}

impl SessionConfig {
    pub fn display_enabled(&self) -> bool {
        self.display.is_enabled()
    }
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "enabled"
    } else {
        "disabled"
    }
}

impl fmt::Display for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Output:\t{}", self.output.describe())?;
        let (markup, table) = match &self.format {
            Format::Plain(_) => (false, false),
            Format::Markup { table, .. } => (true, *table),
        };
        writeln!(f, "HTML:\t{}", enabled(markup))?;
        writeln!(f, "Table:\t{}", enabled(table))?;
        writeln!(f, "Informational:\t{}", if self.verbose { "verbose" } else { "silent" })?;
        match self.limit {
            0 => writeln!(f, "Solution limit:\tdisabled")?,
            n => writeln!(f, "Solution limit:\t{n}")?,
        }
        writeln!(f, "Count on stdout:\t{}", enabled(self.count_on_stdout))?;
        writeln!(f, "Count on stderr:\t{}", enabled(self.count_on_stderr))?;
        writeln!(f, "Visual:\t{:?}", self.display)?;
        match &self.log {
            Some(log) => {
                writeln!(f, "Log:\tfile {}", log.path.display())?;
                writeln!(f, "Log mode:\t{}", if log.append { "append" } else { "truncate" })?;
                writeln!(f, "Log level:\t{}", log.level)?;
            }
            None => writeln!(f, "Log:\toff")?,
        }
        let glyphs = match &self.format {
            Format::Plain(glyphs) | Format::Markup { glyphs, .. } => glyphs,
        };
        writeln!(f, "Solid:\t{}", glyphs.solid)?;
        writeln!(f, "Dot:\t{}", glyphs.dot)?;
        write!(f, "Blank:\t{}", glyphs.blank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pattern_plain_placeholder() {
        let pattern: FilePattern = "out%d.txt".parse().unwrap();
        assert_eq!(pattern.path_for(1), PathBuf::from("out1.txt"));
        assert_eq!(pattern.path_for(12), PathBuf::from("out12.txt"));
    }

    #[test]
    fn test_pattern_padding_and_escapes() {
        let pattern: FilePattern = "100%%-%03d.sol".parse().unwrap();
        assert_eq!(pattern.path_for(7), PathBuf::from("100%-007.sol"));
        let spaced: FilePattern = "s%3d".parse().unwrap();
        assert_eq!(spaced.path_for(7), PathBuf::from("s  7"));
    }

    #[test]
    fn test_pattern_rejects_bad_placeholders() {
        assert_eq!(
            "plain.txt".parse::<FilePattern>(),
            Err(PatternError::NoPlaceholder("plain.txt".into()))
        );
        assert_eq!(
            "%d-%d".parse::<FilePattern>(),
            Err(PatternError::MultiplePlaceholders("%d-%d".into()))
        );
        assert!(matches!(
            "out%s".parse::<FilePattern>(),
            Err(PatternError::BadDirective { at: 3, .. })
        ));
    }

    #[test]
    fn test_unknown_cells_use_blank_glyph() {
        let glyphs = Glyphs::plain();
        assert_eq!(glyphs.for_cell(Cell::Unknown), " ");
        assert_eq!(glyphs.for_cell(Cell::Dot), "-");
    }

    #[test]
    fn test_config_listing() {
        let config = SessionConfig {
            limit: 3,
            ..SessionConfig::default()
        };
        let text = config.to_string();
        assert!(text.contains("Output:\tstandard output"));
        assert!(text.contains("Solution limit:\t3"));
        assert!(text.contains("Log:\toff"));
    }

    proptest! {
        #[test]
        fn numbered_paths_wrap_padded_index(
            prefix in "[a-z/._-]{0,8}",
            suffix in "[a-z._-]{0,6}",
            width in 0usize..6,
            zero_pad: bool,
            index in 1usize..100_000,
        ) {
            let flag = if zero_pad { "0" } else { "" };
            let raw = if width == 0 {
                format!("{prefix}%d{suffix}")
            } else {
                format!("{prefix}%{flag}{width}d{suffix}")
            };
            let pattern: FilePattern = raw.parse().unwrap();
            let path = pattern.path_for(index).to_string_lossy().into_owned();
            prop_assert!(path.starts_with(&prefix));
            prop_assert!(path.ends_with(&suffix));
            let number = &path[prefix.len()..path.len() - suffix.len()];
            prop_assert!(number.len() >= width);
            let pad = if zero_pad { '0' } else { ' ' };
            prop_assert_eq!(number.trim_start_matches(pad).parse::<usize>().unwrap(), index);
        }
    }
}
