//! Formatting solutions and delivering them to their destination.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufWriter, Write};

use nonogram_core::{Cell, Grid};

use crate::config::{FilePattern, Format, Glyphs, OutputTarget};
use crate::error::SessionError;

/// One line per row; `separator` adds the blank line that divides
/// consecutive solutions sharing a destination
pub fn render_plain(grid: &Grid, glyphs: &Glyphs, separator: bool) -> String {
    let mut text = String::new();
    for row in grid.rows() {
        for &cell in row {
            text.push_str(glyphs.for_cell(cell));
        }
        text.push('\n');
    }
    if separator {
        text.push('\n');
    }
    text
}

fn image(text: &mut String, src: &str, cell: Cell) {
    let alt = match cell {
        Cell::Dot => "-",
        Cell::Solid => "#",
        Cell::Blank | Cell::Unknown => "&nbsp;",
    };
    let _ = write!(text, "<IMG SRC=\"{src}\" BORDER=0 HSPACE=0 VSPACE=0 ALT=\"{alt}\">");
}

/// HTML table rows of cell images, closed by a horizontal-rule row.
///
/// With `table` every cell gets its own `<TD>`; otherwise the whole grid sits
/// in one cell with `<BR>` between rows.
pub fn render_markup(grid: &Grid, glyphs: &Glyphs, table: bool) -> String {
    let mut text = String::new();
    let width = grid.width();
    if table {
        for row in grid.rows() {
            text.push_str("<TR>");
            for (x, &cell) in row.iter().enumerate() {
                text.push_str("<TD>");
                image(&mut text, glyphs.for_cell(cell), cell);
                if x + 1 == width {
                    text.push_str("<BR>");
                }
                text.push_str("</TD>");
            }
            text.push_str("</TR>\n");
        }
    } else {
        text.push_str("\n<TR><TD>");
        let height = grid.height();
        for (y, row) in grid.rows().enumerate() {
            for &cell in row {
                image(&mut text, glyphs.for_cell(cell), cell);
            }
            text.push_str(if y + 1 == height { "</TD></TR>\n" } else { "<BR>\n" });
        }
    }
    let span = if table { width } else { 1 };
    let _ = writeln!(text, "<TR><TD COLSPAN={span}><HR></TD></TR>");
    text
}

enum Destination {
    Discard,
    Stream { name: String, out: Box<dyn Write> },
    File { name: String, out: Option<Box<dyn Write>> },
    Numbered(FilePattern),
}

/// Where and how each solution is written
pub struct SolutionSink {
    format: Format,
    destination: Destination,
}

impl SolutionSink {
    /// Open the destination named by `target`. A single output file is
    /// created here, before any solving starts.
    pub fn open(target: &OutputTarget, format: Format) -> Result<Self, SessionError> {
        let destination = match target {
            OutputTarget::None => Destination::Discard,
            OutputTarget::Stdout => Destination::Stream {
                name: "standard output".into(),
                out: Box::new(io::stdout()),
            },
            OutputTarget::File(path) => {
                let name = path.display().to_string();
                let file = File::create(path).map_err(|e| SessionError::io(name.as_str(), e))?;
                Destination::File {
                    name,
                    out: Some(Box::new(BufWriter::new(file))),
                }
            }
            OutputTarget::Numbered(pattern) => Destination::Numbered(pattern.clone()),
        };
        Ok(Self { format, destination })
    }

    /// Write solutions to an already-open stream
    #[cfg(test)]
    pub fn to_stream(name: impl Into<String>, out: Box<dyn Write>, format: Format) -> Self {
        Self {
            format,
            destination: Destination::Stream {
                name: name.into(),
                out,
            },
        }
    }

    /// Write every solution to one already-open file
    #[cfg(test)]
    pub fn to_single(name: impl Into<String>, out: Box<dyn Write>, format: Format) -> Self {
        Self {
            format,
            destination: Destination::File {
                name: name.into(),
                out: Some(out),
            },
        }
    }

    #[cfg(test)]
    pub fn discard() -> Self {
        Self {
            format: Format::default(),
            destination: Destination::Discard,
        }
    }

    /// Whether a write failure ends the run: only the single output file is
    /// shared by every later solution
    pub fn failure_is_fatal(&self) -> bool {
        matches!(self.destination, Destination::File { .. })
    }

    fn render(&self, grid: &Grid) -> String {
        match &self.format {
            Format::Plain(glyphs) => {
                let separator = !matches!(self.destination, Destination::Numbered(_));
                render_plain(grid, glyphs, separator)
            }
            Format::Markup { glyphs, table } => render_markup(grid, glyphs, *table),
        }
    }

    /// Deliver solution number `index` (1-based)
    pub fn emit(&mut self, index: usize, grid: &Grid) -> Result<(), SessionError> {
        if matches!(self.destination, Destination::Discard) {
            return Ok(());
        }
        let text = self.render(grid);
        match &mut self.destination {
            Destination::Discard => Ok(()),
            Destination::Stream { name, out } => {
                write_all(out, &text).map_err(|e| SessionError::io(name.as_str(), e))
            }
            Destination::File { name, out } => {
                let out = out.as_mut().ok_or_else(|| {
                    let closed =
                        io::Error::new(io::ErrorKind::NotConnected, "output already closed");
                    SessionError::io(name.as_str(), closed)
                })?;
                write_all(out, &text).map_err(|e| SessionError::io(name.as_str(), e))
            }
            Destination::Numbered(pattern) => {
                let path = pattern.path_for(index);
                let destination = path.display().to_string();
                let mut file =
                    File::create(&path).map_err(|e| SessionError::io(destination.as_str(), e))?;
                write_all(&mut file, &text).map_err(|e| SessionError::io(destination, e))
            }
        }
    }

    /// Flush and release the destination. Later calls do nothing.
    pub fn close(&mut self) -> Result<(), SessionError> {
        match &mut self.destination {
            Destination::File { name, out } => match out.take() {
                Some(mut out) => out.flush().map_err(|e| SessionError::io(name.as_str(), e)),
                None => Ok(()),
            },
            Destination::Stream { name, out } => {
                out.flush().map_err(|e| SessionError::io(name.as_str(), e))
            }
            Destination::Discard | Destination::Numbered(_) => Ok(()),
        }
    }
}

fn write_all(out: &mut impl Write, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    out.flush()
}

/// Reject destinations that cannot hold a single artifact
pub fn ensure_single(target: &OutputTarget, artifact: &'static str) -> Result<(), SessionError> {
    match target {
        OutputTarget::Numbered(pattern) => Err(SessionError::UnsupportedDestination {
            destination: pattern.to_string(),
            artifact,
        }),
        OutputTarget::None | OutputTarget::Stdout | OutputTarget::File(_) => Ok(()),
    }
}

/// Writer for a command that produces exactly one artifact, such as a puzzle
/// or a note value. `None` means the output is discarded.
pub fn open_artifact(
    target: &OutputTarget,
    artifact: &'static str,
) -> Result<Option<Box<dyn Write>>, SessionError> {
    ensure_single(target, artifact)?;
    match target {
        OutputTarget::None => Ok(None),
        OutputTarget::Stdout => Ok(Some(Box::new(io::stdout()))),
        OutputTarget::File(path) => {
            let file =
                File::create(path).map_err(|e| SessionError::io(path.display().to_string(), e))?;
            Ok(Some(Box::new(BufWriter::new(file))))
        }
        OutputTarget::Numbered(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nonogram_core::testing::{FailingWriter, SharedBuffer};
    use Cell::*;

    fn grid(width: usize, height: usize, cells: Vec<Cell>) -> Grid {
        Grid::from_buffer(width, height, cells).unwrap()
    }

    #[test]
    fn test_plain_row() {
        let text = render_plain(&grid(3, 1, vec![Solid, Dot, Blank]), &Glyphs::plain(), false);
        assert_eq!(text, "#- \n");
    }

    #[test]
    fn test_plain_unknown_as_blank_and_separator() {
        let cells = grid(2, 2, vec![Unknown, Solid, Solid, Dot]);
        let text = render_plain(&cells, &Glyphs::plain(), true);
        assert_eq!(text, " #\n#-\n\n");
    }

    #[test]
    fn test_markup_table_row() {
        let glyphs = Glyphs {
            solid: "s.xbm".into(),
            dot: "d.xbm".into(),
            blank: "b.xbm".into(),
        };
        let text = render_markup(&grid(3, 1, vec![Solid, Dot, Blank]), &glyphs, true);
        assert_eq!(text.matches("<TD>").count(), 3);
        assert!(text.starts_with(
            "<TR><TD><IMG SRC=\"s.xbm\" BORDER=0 HSPACE=0 VSPACE=0 ALT=\"#\"></TD>"
        ));
        assert!(text.contains("ALT=\"&nbsp;\"><BR></TD></TR>\n"));
        assert!(text.ends_with("<TR><TD COLSPAN=3><HR></TD></TR>\n"));
    }

    #[test]
    fn test_markup_single_cell_layout() {
        let text = render_markup(&grid(1, 2, vec![Dot, Solid]), &Glyphs::markup(), false);
        assert_eq!(
            text,
            "\n<TR><TD><IMG SRC=\"icons/dot.xbm\" BORDER=0 HSPACE=0 VSPACE=0 ALT=\"-\"><BR>\n\
             <IMG SRC=\"icons/solid.xbm\" BORDER=0 HSPACE=0 VSPACE=0 ALT=\"#\"></TD></TR>\n\
             <TR><TD COLSPAN=1><HR></TD></TR>\n"
        );
    }

    #[test]
    fn test_stream_emits_whole_solutions() {
        let buffer = SharedBuffer::new();
        let mut sink = SolutionSink::to_stream("test", Box::new(buffer.clone()), Format::default());
        sink.emit(1, &grid(2, 1, vec![Solid, Dot])).unwrap();
        sink.emit(2, &grid(2, 1, vec![Dot, Solid])).unwrap();
        assert_eq!(buffer.contents(), "#-\n\n-#\n\n");
        assert!(!sink.failure_is_fatal());
    }

    #[test]
    fn test_stream_failure_names_destination() {
        let mut sink = SolutionSink::to_stream("pipe", Box::new(FailingWriter), Format::default());
        let err = sink.emit(1, &grid(1, 1, vec![Solid])).unwrap_err();
        assert!(matches!(err, SessionError::Io { ref destination, .. } if destination == "pipe"));
    }

    #[test]
    fn test_single_file_failure_is_fatal() {
        let mut sink =
            SolutionSink::to_single("out.txt", Box::new(FailingWriter), Format::default());
        assert!(sink.failure_is_fatal());
        let err = sink.emit(1, &grid(1, 1, vec![Solid])).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Io { ref destination, .. } if destination == "out.txt"
        ));
    }

    #[test]
    fn test_numbered_files_have_no_separator() {
        let dir = std::env::temp_dir().join(format!("nonogram-sink-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let pattern: FilePattern = dir.join("sol%02d.txt").to_string_lossy().parse().unwrap();
        let target = OutputTarget::Numbered(pattern);
        let mut sink = SolutionSink::open(&target, Format::default()).unwrap();
        sink.emit(1, &grid(2, 1, vec![Solid, Blank])).unwrap();
        sink.emit(2, &grid(2, 1, vec![Blank, Solid])).unwrap();
        assert_eq!(std::fs::read_to_string(dir.join("sol01.txt")).unwrap(), "# \n");
        assert_eq!(std::fs::read_to_string(dir.join("sol02.txt")).unwrap(), " #\n");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_single_file_close_is_idempotent() {
        let path = std::env::temp_dir().join(format!("nonogram-single-{}.txt", std::process::id()));
        let target = OutputTarget::File(path.clone());
        let mut sink = SolutionSink::open(&target, Format::default()).unwrap();
        assert!(sink.failure_is_fatal());
        sink.emit(1, &grid(1, 1, vec![Solid])).unwrap();
        sink.close().unwrap();
        sink.close().unwrap();
        assert!(sink.emit(2, &grid(1, 1, vec![Solid])).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "#\n\n");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_numbered_artifact_rejected() {
        let pattern: FilePattern = "p%d".parse().unwrap();
        let result = open_artifact(&OutputTarget::Numbered(pattern), "puzzle");
        assert!(matches!(
            result,
            Err(SessionError::UnsupportedDestination { artifact: "puzzle", .. })
        ));
    }
}
