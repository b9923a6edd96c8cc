//! Control-flow and state-effect classification of opcodes.

use crate::{opcode_info, AddrMode, RegWidth};

/// What an opcode does to control flow or to the tracked processor state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Falls through with no tracked effect.
    Normal,
    /// Conditional relative branch.
    Branch,
    /// Unconditional relative branch (BRA, BRL).
    BranchAlways,
    /// JMP / JML, direct or indirect.
    Jump,
    /// JSR / JSL, direct or indirect.
    Call,
    /// RTS, RTL, RTI.
    Return,
    /// REP: clear status bits.
    ClearFlags,
    /// SEP: set status bits.
    SetFlags,
    /// PLP: status pulled from the stack.
    RestoreFlags,
    /// XCE: swap carry and emulation bits.
    ExchangeMode,
    /// Stack push without control-flow effect.
    Push,
    /// Stack pull without control-flow effect.
    Pull,
    /// BRK, COP: software interrupt, execution resumes afterwards.
    Interrupt,
    /// STP: processor halts.
    Halt,
}

impl OpKind {
    /// Check if the opcode changes M/X.
    pub const fn mutates_flags(self) -> bool {
        matches!(
            self,
            Self::ClearFlags | Self::SetFlags | Self::RestoreFlags | Self::ExchangeMode
        )
    }

    /// Check if execution never reaches the next sequential instruction.
    pub const fn ends_block(self) -> bool {
        matches!(
            self,
            Self::BranchAlways | Self::Jump | Self::Return | Self::Halt
        )
    }
}

const fn kind_of(opcode: u8) -> OpKind {
    match opcode {
        0x10 | 0x30 | 0x50 | 0x70 | 0x90 | 0xB0 | 0xD0 | 0xF0 => OpKind::Branch,
        0x80 | 0x82 => OpKind::BranchAlways,
        0x4C | 0x5C | 0x6C | 0x7C | 0xDC => OpKind::Jump,
        0x20 | 0x22 | 0xFC => OpKind::Call,
        0x40 | 0x60 | 0x6B => OpKind::Return,
        0xC2 => OpKind::ClearFlags,
        0xE2 => OpKind::SetFlags,
        0x28 => OpKind::RestoreFlags,
        0xFB => OpKind::ExchangeMode,
        0x08 | 0x0B | 0x48 | 0x4B | 0x5A | 0x62 | 0x8B | 0xD4 | 0xDA | 0xF4 => OpKind::Push,
        0x2B | 0x68 | 0x7A | 0xAB | 0xFA => OpKind::Pull,
        0x00 | 0x02 => OpKind::Interrupt,
        0xDB => OpKind::Halt,
        _ => OpKind::Normal,
    }
}

static KINDS: [OpKind; 256] = {
    let mut table = [OpKind::Normal; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = kind_of(i as u8);
        i += 1;
    }
    table
};

/// Classify an opcode.
#[inline]
pub fn classify(opcode: u8) -> OpKind {
    KINDS[opcode as usize]
}

/// How a call or jump names its destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetForm {
    /// 16-bit operand, bank taken from the instruction's own bank.
    Absolute,
    /// 24-bit operand.
    Long,
    /// Destination read through a pointer at run time.
    Indirect,
}

/// Destination form of a call or jump opcode.
pub fn target_form(opcode: u8) -> Option<TargetForm> {
    if !matches!(classify(opcode), OpKind::Call | OpKind::Jump) {
        return None;
    }
    match opcode_info(opcode).mode {
        AddrMode::Absolute => Some(TargetForm::Absolute),
        AddrMode::AbsoluteLong => Some(TargetForm::Long),
        mode if mode.is_indirect() => Some(TargetForm::Indirect),
        _ => None,
    }
}

/// Operand byte count of an opcode under the given register widths.
#[inline]
pub fn operand_length(opcode: u8, m: RegWidth, x: RegWidth) -> u8 {
    opcode_info(opcode).mode.operand_size(m, x)
}
