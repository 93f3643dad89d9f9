//! Replay of recorded readings, one JSON object per line.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use tracing::{debug, warn};

use carwatch_core::{CarwatchError, Reading};

use crate::source::TelemetrySource;

/// Reads recorded [`Reading`]s from a JSON-lines stream.
///
/// Blank lines are skipped. Lines that fail to parse are logged and skipped.
/// Code lists longer than the capacity are trimmed oldest-first.
pub struct ReplaySource<B> {
    lines: Lines<B>,
    line_no: usize,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CarwatchError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening replay file");
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<B: BufRead> ReplaySource<B> {
    pub fn from_reader(reader: B) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

/// Parse a single JSON line into a reading.
pub fn parse_line(line: &str) -> Result<Reading, CarwatchError> {
    let mut reading: Reading = serde_json::from_str(line)?;
    reading.trim_error_codes();
    Ok(reading)
}

impl<B: BufRead> TelemetrySource for ReplaySource<B> {
    fn next_reading(&mut self) -> Option<Reading> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    warn!(line = self.line_no + 1, error = %e, "replay read failed, stopping");
                    return None;
                }
            };
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match parse_line(trimmed) {
                Ok(reading) => return Some(reading),
                Err(e) => {
                    warn!(line = self.line_no, error = %e, "skipping malformed replay line");
                }
            }
        }
    }
}
