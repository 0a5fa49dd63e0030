//! Named string annotations carried by a puzzle.
//!
//! Notes are independent of the grid and clue data. Operations here never
//! touch anything else on the puzzle; callers re-serialize the puzzle if the
//! change should persist.

use serde::{Deserialize, Serialize};

use crate::NoteError;

/// A single named annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub name: String,
    pub value: String,
}

/// Insertion-ordered note collection with unique names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Notes {
    entries: Vec<Note>,
}

impl Notes {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|note| note.name == name)
    }

    pub fn get(&self, name: &str) -> Result<&str, NoteError> {
        self.position(name)
            .map(|i| self.entries[i].value.as_str())
            .ok_or_else(|| NoteError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Set a note.
    ///
    /// With `safe`, an existing note is left alone and the call fails with
    /// [`NoteError::AlreadyExists`]. Otherwise the value is created or
    /// overwritten in place, keeping the note's original position.
    pub fn set(&mut self, name: &str, value: &str, safe: bool) -> Result<(), NoteError> {
        match self.position(name) {
            Some(_) if safe => Err(NoteError::AlreadyExists(name.to_string())),
            Some(i) => {
                self.entries[i].value = value.to_string();
                Ok(())
            }
            None => {
                self.entries.push(Note {
                    name: name.to_string(),
                    value: value.to_string(),
                });
                Ok(())
            }
        }
    }

    /// Remove a note, returning its former value
    pub fn unset(&mut self, name: &str) -> Result<String, NoteError> {
        let i = self
            .position(name)
            .ok_or_else(|| NoteError::NotFound(name.to_string()))?;
        Ok(self.entries.remove(i).value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
