//! Hook and contract manifest loading.
//!
//! The manifest is JSON:
//!
//! ```json
//! {
//!   "hooks": [
//!     { "address": "$008781", "name": "JumpTableLocal", "kind": "jsl",
//!       "expected_x": 16, "expected_exit_m": "8", "source": "core/jtl.asm:12" }
//!   ],
//!   "critical_addresses": [ { "address": "0x02C0C3", "expected_m": true } ]
//! }
//! ```
//!
//! Width fields take a bit count, a boolean (`true` is 8-bit), or a string.
//! Entries that fail to normalize are skipped one at a time.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use snesflow_cfg::{HookInfo, HookKind, RegisterState, SourceLocation, Width};
use snesflow_isa::RegWidth;
use snesflow_rom::Address;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{Result, read_text};

#[derive(Deserialize)]
struct RawManifest {
    #[serde(default)]
    hooks: Vec<Value>,
    #[serde(default)]
    critical_addresses: Vec<Value>,
}

/// Why a single manifest entry was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryError {
    #[error("entry is not an object")]
    NotAnObject,
    #[error("missing address")]
    MissingAddress,
    #[error("invalid address {0}")]
    InvalidAddress(String),
    #[error("invalid width for {field}: {value}")]
    InvalidWidth { field: &'static str, value: String },
}

/// Hooks and critical addresses declared by a manifest.
#[derive(Clone, Debug, Default)]
pub struct Manifest {
    /// Hook entry points; seeded and validated.
    pub hooks: Vec<HookInfo>,
    /// Contracts on addresses that are not hooks; validated only.
    pub critical: Vec<HookInfo>,
    /// Number of entries rejected while loading.
    pub skipped: usize,
}

impl Manifest {
    /// Parse manifest JSON. Only a document that is not JSON at all fails.
    pub fn parse(json: &str) -> Result<Self> {
        let raw: RawManifest = serde_json::from_str(json)?;
        let mut manifest = Self::default();
        manifest.hooks = manifest.normalize_section(&raw.hooks, "jsl", "hooks");
        manifest.critical =
            manifest.normalize_section(&raw.critical_addresses, "patch", "critical_addresses");
        debug!(
            hooks = manifest.hooks.len(),
            critical = manifest.critical.len(),
            skipped = manifest.skipped,
            "manifest loaded"
        );
        Ok(manifest)
    }

    /// Load a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        Self::parse(&read_text(path)?)
    }

    fn normalize_section(
        &mut self,
        entries: &[Value],
        default_kind: &str,
        section: &str,
    ) -> Vec<HookInfo> {
        let mut out = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            match parse_entry(entry, default_kind) {
                Ok(hook) => out.push(hook),
                Err(err) => {
                    warn!(section, index, %err, "skipping manifest entry");
                    self.skipped += 1;
                }
            }
        }
        out
    }

    /// Every declared contract, hooks first.
    pub fn contracts(&self) -> impl Iterator<Item = &HookInfo> {
        self.hooks.iter().chain(&self.critical)
    }
}

/// Normalize one manifest entry.
pub fn parse_entry(entry: &Value, default_kind: &str) -> std::result::Result<HookInfo, EntryError> {
    let obj = entry.as_object().ok_or(EntryError::NotAnObject)?;
    let address = parse_address(obj.get("address").ok_or(EntryError::MissingAddress)?)?;

    let width = |field: &'static str| -> std::result::Result<Width, EntryError> {
        match obj.get(field) {
            None | Some(Value::Null) => Ok(Width::Unknown),
            Some(value) => normalize_width(value).ok_or_else(|| EntryError::InvalidWidth {
                field,
                value: value.to_string(),
            }),
        }
    };
    let entry_m = width("expected_m")?;
    let entry_x = width("expected_x")?;
    let exit_m = width("expected_exit_m")?;
    let exit_x = width("expected_exit_x")?;

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map_or_else(|| format!("hook_{:06X}", address.raw()), str::to_string);
    let kind = HookKind::parse(obj.get("kind").and_then(Value::as_str).unwrap_or(default_kind));

    let mut hook = HookInfo::new(name, address, kind);
    if entry_m.is_known() || entry_x.is_known() {
        hook.expected_entry = Some(RegisterState::new(entry_m, entry_x));
    }
    if exit_m.is_known() || exit_x.is_known() {
        hook.expected_exit = Some(RegisterState::new(exit_m, exit_x));
    }
    hook.skip_validation = ["skip_abi", "skip_validation"]
        .iter()
        .any(|key| obj.get(*key).and_then(Value::as_bool).unwrap_or(false));
    hook.source = obj
        .get("source")
        .and_then(Value::as_str)
        .and_then(SourceLocation::parse);
    Ok(hook)
}

/// Accept `"0x8000"`, `"$008000"`, `"32768"`, or a JSON number.
fn parse_address(value: &Value) -> std::result::Result<Address, EntryError> {
    let invalid = || EntryError::InvalidAddress(value.to_string());
    let raw = match value {
        Value::Number(n) => n.as_u64().ok_or_else(invalid)?,
        Value::String(s) => parse_int(s).ok_or_else(invalid)?,
        _ => return Err(invalid()),
    };
    u32::try_from(raw)
        .ok()
        .filter(|&raw| raw <= Address::MASK)
        .map(Address::new)
        .ok_or_else(invalid)
}

fn parse_int(s: &str) -> Option<u64> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = s.strip_prefix('$') {
        u64::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

/// Normalize a width field to a known width; `None` if it is not 8 or 16.
fn normalize_width(value: &Value) -> Option<Width> {
    let bits = match value {
        Value::Bool(narrow) => {
            if *narrow {
                8
            } else {
                16
            }
        }
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as u64))?,
        Value::String(s) => parse_int(s)?,
        _ => return None,
    };
    let width = RegWidth::try_from(u32::try_from(bits).ok()?).ok()?;
    Some(Width::known(width))
}
