//! snesflow - static analysis of 65816 console ROMs.
//!
//! Infers the accumulator/index register widths at every reachable
//! instruction, builds the routine call graph, and reports width contract
//! violations at hook boundaries, stack imbalances, recursion, and
//! cross-bank transfers.
//!
//! # Example
//!
//! ```ignore
//! use snesflow::{AnalysisConfig, Analyzer, Manifest, RomImage, Mapping};
//!
//! let rom = RomImage::load("game.sfc".as_ref(), Mapping::LoRom)?;
//! let report = Analyzer::new(&rom, AnalysisConfig::default())
//!     .with_manifest(Manifest::load("hooks.json".as_ref())?)
//!     .run();
//! for diag in report.errors() {
//!     println!("{diag}");
//! }
//! ```

pub use snesflow_cfg::{
    CallGraph, CallGraphStats, CrossRef, Diagnostic, DiagnosticKind, HookInfo, HookKind,
    Instruction, Labels, RefKind, RegisterState, ReturnStates, Severity, SourceLocation, StackOp,
    StateTracker, Subgraph, TrackerOutput, Width, validate_contracts,
};
pub use snesflow_isa::{OpKind, RegWidth, StackMnemonic, WidthFlag, classify, operand_length};
pub use snesflow_rom::{Address, Mapping, RomError, RomImage, Vector};

mod analysis;
mod config;
mod drift;
mod hooks;
mod manifest;
mod symbols;

pub use analysis::*;
pub use config::*;
pub use drift::*;
pub use hooks::*;
pub use manifest::*;
pub use symbols::*;

use std::path::PathBuf;

use thiserror::Error;

/// Analysis input errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("ROM error: {0}")]
    Rom(#[from] RomError),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

fn read_text(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}
