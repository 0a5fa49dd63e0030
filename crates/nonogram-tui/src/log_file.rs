use std::fmt;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::LogTarget;
use crate::error::SessionError;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Per-session diagnostic log, bracketed by start and end markers
pub struct SessionLog {
    name: String,
    out: Box<dyn Write>,
    level: u32,
}

impl SessionLog {
    pub fn open(target: &LogTarget) -> Result<Self, SessionError> {
        let name = target.path().display().to_string();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(target.append)
            .truncate(!target.append)
            .open(target.path())
            .map_err(|e| SessionError::io(name.as_str(), e))?;
        Self::to_writer(name, Box::new(BufWriter::new(file)), target.level)
    }

    /// Log to an already-open writer, writing the start marker first
    pub fn to_writer(
        name: impl Into<String>,
        out: Box<dyn Write>,
        level: u32,
    ) -> Result<Self, SessionError> {
        let mut log = Self {
            name: name.into(),
            out,
            level,
        };
        log.record(format_args!("log started at {}", now_secs()))?;
        Ok(log)
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Append one line
    pub fn record(&mut self, line: fmt::Arguments<'_>) -> Result<(), SessionError> {
        writeln!(self.out, "{line}")
            .and_then(|()| self.out.flush())
            .map_err(|e| SessionError::io(self.name.as_str(), e))
    }

    pub fn close(mut self) -> Result<(), SessionError> {
        self.record(format_args!("log ended at {}", now_secs()))
    }
}
