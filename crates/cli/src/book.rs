//! Workbook files.
//!
//! A book is a snapshot JSON file (the same shape templates use). Commands
//! load it into a [`MemoryHost`], run against it, and write it back.

use std::path::Path;

use gridext_core::CellRange;
use gridext_engine::memory::{DEFAULT_COLUMN_COUNT, DEFAULT_ROW_COUNT};
use gridext_engine::{HostGridFacade, MemoryHost};

use crate::CliError;

/// Load a book. A missing file yields a fresh single-sheet document named
/// after the file.
pub fn load_book(path: &Path) -> Result<MemoryHost, CliError> {
    if !path.exists() {
        let unit = path.file_stem().and_then(|s| s.to_str()).unwrap_or("book");
        log::debug!("{} not found, starting a new book", path.display());
        return Ok(MemoryHost::new(unit, DEFAULT_ROW_COUNT, DEFAULT_COLUMN_COUNT));
    }

    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))?;
    let snapshot: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| CliError::parse(format!("{}: {}", path.display(), e)))?;
    MemoryHost::from_snapshot(snapshot)
        .map_err(|e| CliError::parse(format!("{}: {}", path.display(), e)))
}

pub fn save_book(host: &MemoryHost, path: &Path) -> Result<(), CliError> {
    let snapshot = host
        .export_snapshot()
        .ok_or_else(|| CliError::new(crate::exit_codes::EXIT_HOST_REJECTED, "book has no sheets"))?;
    let json = serde_json::to_string_pretty(&snapshot)
        .map_err(|e| CliError::io(e.to_string()))?;
    std::fs::write(path, json + "\n").map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))
}

/// Parse "B7" or "A1:C3".
pub fn parse_range(text: &str) -> Result<CellRange, CliError> {
    CellRange::parse_a1(text)
        .ok_or_else(|| CliError::args(format!("invalid cell reference '{}'", text)).with_hint("use A1 notation, e.g. B7 or A1:C3"))
}
