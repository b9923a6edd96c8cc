//! WLA-style symbol file loading.
//!
//! Only the `[labels]` section is read; each line there is `BB:OOOO Name`.

use std::path::Path;

use snesflow_cfg::Labels;
use snesflow_rom::Address;
use tracing::{debug, warn};

use crate::{Result, read_text};

/// Parse symbol file text into labels. Malformed lines are skipped.
pub fn parse_symbols(text: &str) -> Labels {
    let mut labels = Labels::new();
    let mut in_labels = false;
    let mut skipped = 0usize;

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') {
            in_labels = line == "[labels]";
            continue;
        }
        if !in_labels {
            continue;
        }
        match parse_label_line(line) {
            Some((addr, name)) => labels.insert(addr, name),
            None => {
                warn!(line = lineno + 1, text = line, "skipping malformed symbol line");
                skipped += 1;
            }
        }
    }

    debug!(labels = labels.len(), skipped, "symbols loaded");
    labels
}

/// Load a symbol file.
pub fn load_symbols(path: &Path) -> Result<Labels> {
    Ok(parse_symbols(&read_text(path)?))
}

fn parse_label_line(line: &str) -> Option<(Address, &str)> {
    let (location, name) = line.split_once(char::is_whitespace)?;
    let (bank, offset) = location.split_once(':')?;
    let bank = u8::from_str_radix(bank, 16).ok()?;
    let offset = u16::from_str_radix(offset, 16).ok()?;
    let name = name.split_whitespace().next()?;
    Some((Address::from_parts(bank, offset), name))
}
