//! Access trace loading.
//!
//! A trace is a text file with one access per line:
//!
//! ```text
//! # cycle  command  address  [size]
//! 1        GetS     0x1000
//! 1        GetX     0x2040   8
//! ```
//!
//! Blank lines and `#` comments are ignored. Addresses are hexadecimal with or
//! without a `0x` prefix. Accesses are returned sorted by cycle, keeping file order
//! within a cycle.

use std::{fs, path::Path};

use memhier_core::common::{Command, Cycle, MemEvent, event::UnknownCommand};

/// A malformed trace.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// The file could not be read.
    #[error("failed to read trace: {0}")]
    Io(#[from] std::io::Error),

    /// A line does not have the expected fields.
    #[error("line {line}: expected '<cycle> <command> <hex address> [size]', found '{text}'")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// The offending line.
        text: String,
    },

    /// A field could not be parsed.
    #[error("line {line}: invalid {field} '{value}'")]
    Field {
        /// 1-based line number.
        line: usize,
        /// Field name.
        field: &'static str,
        /// The offending value.
        value: String,
    },

    /// The command is not known.
    #[error("line {line}: {source}")]
    Command {
        /// 1-based line number.
        line: usize,
        /// Parse failure.
        source: UnknownCommand,
    },
}

/// One access from the trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    /// Cycle at which the access is handled by the cache.
    pub cycle: Cycle,
    /// The access.
    pub event: MemEvent,
}

/// Reads and parses a trace file.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<TraceEntry>, TraceError> {
    parse(&fs::read_to_string(path)?)
}

/// Parses trace text.
pub fn parse(text: &str) -> Result<Vec<TraceEntry>, TraceError> {
    let mut entries = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let fields: Vec<&str> = content.split_whitespace().collect();
        if !(3..=4).contains(&fields.len()) {
            return Err(TraceError::Malformed {
                line,
                text: raw.to_string(),
            });
        }
        let field_err = |field: &'static str, value: &str| TraceError::Field {
            line,
            field,
            value: value.to_string(),
        };
        let cycle: Cycle = fields[0].parse().map_err(|_| field_err("cycle", fields[0]))?;
        let cmd: Command = fields[1]
            .parse()
            .map_err(|source| TraceError::Command { line, source })?;
        let hex = fields[2].trim_start_matches("0x").trim_start_matches("0X");
        let addr = u64::from_str_radix(hex, 16).map_err(|_| field_err("address", fields[2]))?;
        let size = match fields.get(3) {
            Some(size) => size.parse().map_err(|_| field_err("size", size))?,
            None => 0,
        };
        entries.push(TraceEntry {
            cycle,
            event: MemEvent::new(entries.len() as u64, cmd, addr).with_size(size),
        });
    }
    entries.sort_by_key(|entry| entry.cycle);
    Ok(entries)
}
