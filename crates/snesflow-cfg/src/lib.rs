//! M/X register width inference for 65816 ROMs.
//!
//! The tracker walks code from entry points, deriving the accumulator and
//! index widths at every reachable instruction so that operand lengths can
//! be decoded at all. Along the way it builds the routine call graph and
//! checks stack balance at returns; a separate pass compares the result
//! against declared hook contracts.

mod call_graph;
mod contract;
mod decoder;
mod diag;
mod labels;
mod stack;
mod state;
mod tracker;

pub use call_graph::*;
pub use contract::*;
pub use decoder::*;
pub use diag::*;
pub use labels::*;
pub use stack::*;
pub use state::*;
pub use tracker::*;
