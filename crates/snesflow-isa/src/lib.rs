//! 65816 instruction set definitions.
//!
//! Provides the opcode table, operand sizing under the M/X register widths,
//! control-flow classification, and the stack effect of each stack-mutating
//! instruction. All tables are immutable and built at compile time.

mod classify;
mod stack;
mod table;
mod width;

pub use classify::*;
pub use stack::*;
pub use table::*;
pub use width::*;

use thiserror::Error;

/// Instruction set errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IsaError {
    #[error("invalid register width: {0} bits (expected 8 or 16)")]
    InvalidWidth(u32),
}
