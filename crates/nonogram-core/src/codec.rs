//! Loading and saving puzzles.

use crate::{Cell, Grid, Puzzle, PuzzleLoadError};

/// Converts puzzles to and from bytes
pub trait PuzzleCodec {
    fn load(&self, bytes: &[u8]) -> Result<Puzzle, PuzzleLoadError>;

    fn save(&self, puzzle: &Puzzle) -> Vec<u8>;
}

/// Puzzles as pretty-printed JSON documents
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl PuzzleCodec for JsonCodec {
    fn load(&self, bytes: &[u8]) -> Result<Puzzle, PuzzleLoadError> {
        let puzzle: Puzzle = serde_json::from_slice(bytes)?;
        puzzle.validate()?;
        Ok(puzzle)
    }

    fn save(&self, puzzle: &Puzzle) -> Vec<u8> {
        let mut bytes = serde_json::to_vec_pretty(puzzle).unwrap_or_default();
        bytes.push(b'\n');
        bytes
    }
}

/// Read a picture drawn as text, one line per row.
///
/// The first line fixes the width; reading stops at the first line of a
/// different width. `solid` marks solid cells, `dot` marks dots, and any
/// other character is blank.
pub fn read_picture(text: &str, solid: char, dot: char) -> Result<Grid, PuzzleLoadError> {
    let mut width = None;
    let mut cells = Vec::new();
    let mut height = 0;
    for line in text.lines() {
        let row: Vec<Cell> = line
            .chars()
            .map(|c| match c {
                c if c == solid => Cell::Solid,
                c if c == dot => Cell::Dot,
                _ => Cell::Blank,
            })
            .collect();
        match width {
            None if row.is_empty() => break,
            None => width = Some(row.len()),
            Some(w) if w != row.len() => break,
            Some(_) => {}
        }
        cells.extend(row);
        height += 1;
    }
    let width = width.ok_or(PuzzleLoadError::EmptyGrid)?;
    Grid::from_buffer(width, height, cells).map_err(|_| PuzzleLoadError::EmptyGrid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PuzzleError;

    #[test]
    fn test_json_keeps_notes_and_title() {
        let mut puzzle = Puzzle::new(vec![vec![1]], vec![vec![1]]).unwrap();
        puzzle.set_title(Some("dot".into()));
        puzzle.set_note("author", "ann", false).unwrap();
        let bytes = JsonCodec.save(&puzzle);
        assert_eq!(JsonCodec.load(&bytes).unwrap(), puzzle);
    }

    #[test]
    fn test_json_rejects_inconsistent_clues() {
        let bytes = br#"{"width": 2, "height": 1, "rows": [[3]], "columns": [[1], [1]]}"#;
        assert!(matches!(
            JsonCodec.load(bytes),
            Err(PuzzleLoadError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_json_rejects_clues_too_large_to_count() {
        let rows = br#"{"width": 2, "height": 1,
            "rows": [[18446744073709551615, 18446744073709551615]], "columns": [[1], [1]]}"#;
        assert!(matches!(
            JsonCodec.load(rows),
            Err(PuzzleLoadError::Inconsistent(PuzzleError::ClueTooLarge { axis: "row", .. }))
        ));
        let columns = br#"{"width": 1, "height": 2,
            "rows": [[1], [1]], "columns": [[18446744073709551615, 1]]}"#;
        assert!(matches!(
            JsonCodec.load(columns),
            Err(PuzzleLoadError::Inconsistent(PuzzleError::ClueTooLarge { axis: "column", .. }))
        ));
    }

    #[test]
    fn test_json_rejects_garbage() {
        assert!(matches!(JsonCodec.load(b"not json"), Err(PuzzleLoadError::Malformed(_))));
    }

    #[test]
    fn test_read_picture_stops_at_ragged_line() {
        let grid = read_picture("#-#\n-#-\nlonger line\n#", '#', '-').unwrap();
        assert_eq!((grid.width(), grid.height()), (3, 2));
        assert_eq!(grid.row(1), &[Cell::Dot, Cell::Solid, Cell::Dot]);
    }

    #[test]
    fn test_read_picture_other_chars_blank() {
        let grid = read_picture("#x", '#', '-').unwrap();
        assert_eq!(grid.row(0), &[Cell::Solid, Cell::Blank]);
        assert!(matches!(read_picture("", '#', '-'), Err(PuzzleLoadError::EmptyGrid)));
    }
}
