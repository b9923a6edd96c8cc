//! 65816 opcode table.
//!
//! One entry per opcode byte: mnemonic and addressing mode. The operand size
//! of every instruction follows from its addressing mode and, for the two
//! width-dependent immediate modes, from the current register widths.

use crate::RegWidth;

/// Addressing mode of an opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddrMode {
    Implied,
    Immediate8,
    Immediate16,
    /// Immediate operand sized by the accumulator width (M flag).
    ImmediateM,
    /// Immediate operand sized by the index width (X flag).
    ImmediateX,
    Relative8,
    Relative16,
    DirectPage,
    DirectPageX,
    DirectPageY,
    DirectPageIndirect,
    DirectPageIndexedIndirect,
    DirectPageIndirectIndexedY,
    DirectPageIndirectLong,
    DirectPageIndirectLongY,
    StackRelative,
    StackRelativeIndirectY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    AbsoluteLong,
    AbsoluteLongX,
    AbsoluteIndirect,
    AbsoluteIndexedIndirect,
    AbsoluteIndirectLong,
    BlockMove,
}

impl AddrMode {
    /// Operand byte count under the given register widths.
    pub const fn operand_size(self, m: RegWidth, x: RegWidth) -> u8 {
        match self {
            Self::Implied => 0,
            Self::ImmediateM => m.bytes(),
            Self::ImmediateX => x.bytes(),
            Self::Immediate8
            | Self::Relative8
            | Self::DirectPage
            | Self::DirectPageX
            | Self::DirectPageY
            | Self::DirectPageIndirect
            | Self::DirectPageIndexedIndirect
            | Self::DirectPageIndirectIndexedY
            | Self::DirectPageIndirectLong
            | Self::DirectPageIndirectLongY
            | Self::StackRelative
            | Self::StackRelativeIndirectY => 1,
            Self::Immediate16
            | Self::Relative16
            | Self::Absolute
            | Self::AbsoluteX
            | Self::AbsoluteY
            | Self::AbsoluteIndirect
            | Self::AbsoluteIndexedIndirect
            | Self::AbsoluteIndirectLong
            | Self::BlockMove => 2,
            Self::AbsoluteLong | Self::AbsoluteLongX => 3,
        }
    }

    /// Check if the operand is a PC-relative displacement.
    pub const fn is_relative(self) -> bool {
        matches!(self, Self::Relative8 | Self::Relative16)
    }

    /// Check if the operand is read through a pointer (target not encoded).
    pub const fn is_indirect(self) -> bool {
        matches!(
            self,
            Self::AbsoluteIndirect | Self::AbsoluteIndexedIndirect | Self::AbsoluteIndirectLong
        )
    }
}

/// Static information about one opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpcodeInfo {
    pub mnemonic: &'static str,
    pub mode: AddrMode,
}

const fn op(mnemonic: &'static str, mode: AddrMode) -> OpcodeInfo {
    OpcodeInfo { mnemonic, mode }
}

/// Look up the table entry for an opcode byte.
#[inline]
pub fn opcode_info(opcode: u8) -> &'static OpcodeInfo {
    &OPCODES[opcode as usize]
}

/// Opcodes without a defined operation; they decode with a one-byte operand.
pub const RESERVED_OPCODES: [u8; 1] = [0x42];

#[rustfmt::skip]
static OPCODES: [OpcodeInfo; 256] = {
    #[allow(clippy::enum_glob_use)]
    use AddrMode::*;
    [
        op("BRK", Immediate8), // 00
        op("ORA", DirectPageIndexedIndirect), // 01
        op("COP", Immediate8), // 02
        op("ORA", StackRelative), // 03
        op("TSB", DirectPage), // 04
        op("ORA", DirectPage), // 05
        op("ASL", DirectPage), // 06
        op("ORA", DirectPageIndirectLong), // 07
        op("PHP", Implied), // 08
        op("ORA", ImmediateM), // 09
        op("ASL", Implied), // 0A
        op("PHD", Implied), // 0B
        op("TSB", Absolute), // 0C
        op("ORA", Absolute), // 0D
        op("ASL", Absolute), // 0E
        op("ORA", AbsoluteLong), // 0F
        op("BPL", Relative8), // 10
        op("ORA", DirectPageIndirectIndexedY), // 11
        op("ORA", DirectPageIndirect), // 12
        op("ORA", StackRelativeIndirectY), // 13
        op("TRB", DirectPage), // 14
        op("ORA", DirectPageX), // 15
        op("ASL", DirectPageX), // 16
        op("ORA", DirectPageIndirectLongY), // 17
        op("CLC", Implied), // 18
        op("ORA", AbsoluteY), // 19
        op("INC", Implied), // 1A
        op("TCS", Implied), // 1B
        op("TRB", Absolute), // 1C
        op("ORA", AbsoluteX), // 1D
        op("ASL", AbsoluteX), // 1E
        op("ORA", AbsoluteLongX), // 1F
        op("JSR", Absolute), // 20
        op("AND", DirectPageIndexedIndirect), // 21
        op("JSL", AbsoluteLong), // 22
        op("AND", StackRelative), // 23
        op("BIT", DirectPage), // 24
        op("AND", DirectPage), // 25
        op("ROL", DirectPage), // 26
        op("AND", DirectPageIndirectLong), // 27
        op("PLP", Implied), // 28
        op("AND", ImmediateM), // 29
        op("ROL", Implied), // 2A
        op("PLD", Implied), // 2B
        op("BIT", Absolute), // 2C
        op("AND", Absolute), // 2D
        op("ROL", Absolute), // 2E
        op("AND", AbsoluteLong), // 2F
        op("BMI", Relative8), // 30
        op("AND", DirectPageIndirectIndexedY), // 31
        op("AND", DirectPageIndirect), // 32
        op("AND", StackRelativeIndirectY), // 33
        op("BIT", DirectPageX), // 34
        op("AND", DirectPageX), // 35
        op("ROL", DirectPageX), // 36
        op("AND", DirectPageIndirectLongY), // 37
        op("SEC", Implied), // 38
        op("AND", AbsoluteY), // 39
        op("DEC", Implied), // 3A
        op("TSC", Implied), // 3B
        op("BIT", AbsoluteX), // 3C
        op("AND", AbsoluteX), // 3D
        op("ROL", AbsoluteX), // 3E
        op("AND", AbsoluteLongX), // 3F
        op("RTI", Implied), // 40
        op("EOR", DirectPageIndexedIndirect), // 41
        op("WDM", Immediate8), // 42
        op("EOR", StackRelative), // 43
        op("MVP", BlockMove), // 44
        op("EOR", DirectPage), // 45
        op("LSR", DirectPage), // 46
        op("EOR", DirectPageIndirectLong), // 47
        op("PHA", Implied), // 48
        op("EOR", ImmediateM), // 49
        op("LSR", Implied), // 4A
        op("PHK", Implied), // 4B
        op("JMP", Absolute), // 4C
        op("EOR", Absolute), // 4D
        op("LSR", Absolute), // 4E
        op("EOR", AbsoluteLong), // 4F
        op("BVC", Relative8), // 50
        op("EOR", DirectPageIndirectIndexedY), // 51
        op("EOR", DirectPageIndirect), // 52
        op("EOR", StackRelativeIndirectY), // 53
        op("MVN", BlockMove), // 54
        op("EOR", DirectPageX), // 55
        op("LSR", DirectPageX), // 56
        op("EOR", DirectPageIndirectLongY), // 57
        op("CLI", Implied), // 58
        op("EOR", AbsoluteY), // 59
        op("PHY", Implied), // 5A
        op("TCD", Implied), // 5B
        op("JML", AbsoluteLong), // 5C
        op("EOR", AbsoluteX), // 5D
        op("LSR", AbsoluteX), // 5E
        op("EOR", AbsoluteLongX), // 5F
        op("RTS", Implied), // 60
        op("ADC", DirectPageIndexedIndirect), // 61
        op("PER", Relative16), // 62
        op("ADC", StackRelative), // 63
        op("STZ", DirectPage), // 64
        op("ADC", DirectPage), // 65
        op("ROR", DirectPage), // 66
        op("ADC", DirectPageIndirectLong), // 67
        op("PLA", Implied), // 68
        op("ADC", ImmediateM), // 69
        op("ROR", Implied), // 6A
        op("RTL", Implied), // 6B
        op("JMP", AbsoluteIndirect), // 6C
        op("ADC", Absolute), // 6D
        op("ROR", Absolute), // 6E
        op("ADC", AbsoluteLong), // 6F
        op("BVS", Relative8), // 70
        op("ADC", DirectPageIndirectIndexedY), // 71
        op("ADC", DirectPageIndirect), // 72
        op("ADC", StackRelativeIndirectY), // 73
        op("STZ", DirectPageX), // 74
        op("ADC", DirectPageX), // 75
        op("ROR", DirectPageX), // 76
        op("ADC", DirectPageIndirectLongY), // 77
        op("SEI", Implied), // 78
        op("ADC", AbsoluteY), // 79
        op("PLY", Implied), // 7A
        op("TDC", Implied), // 7B
        op("JMP", AbsoluteIndexedIndirect), // 7C
        op("ADC", AbsoluteX), // 7D
        op("ROR", AbsoluteX), // 7E
        op("ADC", AbsoluteLongX), // 7F
        op("BRA", Relative8), // 80
        op("STA", DirectPageIndexedIndirect), // 81
        op("BRL", Relative16), // 82
        op("STA", StackRelative), // 83
        op("STY", DirectPage), // 84
        op("STA", DirectPage), // 85
        op("STX", DirectPage), // 86
        op("STA", DirectPageIndirectLong), // 87
        op("DEY", Implied), // 88
        op("BIT", ImmediateM), // 89
        op("TXA", Implied), // 8A
        op("PHB", Implied), // 8B
        op("STY", Absolute), // 8C
        op("STA", Absolute), // 8D
        op("STX", Absolute), // 8E
        op("STA", AbsoluteLong), // 8F
        op("BCC", Relative8), // 90
        op("STA", DirectPageIndirectIndexedY), // 91
        op("STA", DirectPageIndirect), // 92
        op("STA", StackRelativeIndirectY), // 93
        op("STY", DirectPageX), // 94
        op("STA", DirectPageX), // 95
        op("STX", DirectPageY), // 96
        op("STA", DirectPageIndirectLongY), // 97
        op("TYA", Implied), // 98
        op("STA", AbsoluteY), // 99
        op("TXS", Implied), // 9A
        op("TXY", Implied), // 9B
        op("STZ", Absolute), // 9C
        op("STA", AbsoluteX), // 9D
        op("STZ", AbsoluteX), // 9E
        op("STA", AbsoluteLongX), // 9F
        op("LDY", ImmediateX), // A0
        op("LDA", DirectPageIndexedIndirect), // A1
        op("LDX", ImmediateX), // A2
        op("LDA", StackRelative), // A3
        op("LDY", DirectPage), // A4
        op("LDA", DirectPage), // A5
        op("LDX", DirectPage), // A6
        op("LDA", DirectPageIndirectLong), // A7
        op("TAY", Implied), // A8
        op("LDA", ImmediateM), // A9
        op("TAX", Implied), // AA
        op("PLB", Implied), // AB
        op("LDY", Absolute), // AC
        op("LDA", Absolute), // AD
        op("LDX", Absolute), // AE
        op("LDA", AbsoluteLong), // AF
        op("BCS", Relative8), // B0
        op("LDA", DirectPageIndirectIndexedY), // B1
        op("LDA", DirectPageIndirect), // B2
        op("LDA", StackRelativeIndirectY), // B3
        op("LDY", DirectPageX), // B4
        op("LDA", DirectPageX), // B5
        op("LDX", DirectPageY), // B6
        op("LDA", DirectPageIndirectLongY), // B7
        op("CLV", Implied), // B8
        op("LDA", AbsoluteY), // B9
        op("TSX", Implied), // BA
        op("TYX", Implied), // BB
        op("LDY", AbsoluteX), // BC
        op("LDA", AbsoluteX), // BD
        op("LDX", AbsoluteY), // BE
        op("LDA", AbsoluteLongX), // BF
        op("CPY", ImmediateX), // C0
        op("CMP", DirectPageIndexedIndirect), // C1
        op("REP", Immediate8), // C2
        op("CMP", StackRelative), // C3
        op("CPY", DirectPage), // C4
        op("CMP", DirectPage), // C5
        op("DEC", DirectPage), // C6
        op("CMP", DirectPageIndirectLong), // C7
        op("INY", Implied), // C8
        op("CMP", ImmediateM), // C9
        op("DEX", Implied), // CA
        op("WAI", Implied), // CB
        op("CPY", Absolute), // CC
        op("CMP", Absolute), // CD
        op("DEC", Absolute), // CE
        op("CMP", AbsoluteLong), // CF
        op("BNE", Relative8), // D0
        op("CMP", DirectPageIndirectIndexedY), // D1
        op("CMP", DirectPageIndirect), // D2
        op("CMP", StackRelativeIndirectY), // D3
        op("PEI", DirectPage), // D4
        op("CMP", DirectPageX), // D5
        op("DEC", DirectPageX), // D6
        op("CMP", DirectPageIndirectLongY), // D7
        op("CLD", Implied), // D8
        op("CMP", AbsoluteY), // D9
        op("PHX", Implied), // DA
        op("STP", Implied), // DB
        op("JML", AbsoluteIndirectLong), // DC
        op("CMP", AbsoluteX), // DD
        op("DEC", AbsoluteX), // DE
        op("CMP", AbsoluteLongX), // DF
        op("CPX", ImmediateX), // E0
        op("SBC", DirectPageIndexedIndirect), // E1
        op("SEP", Immediate8), // E2
        op("SBC", StackRelative), // E3
        op("CPX", DirectPage), // E4
        op("SBC", DirectPage), // E5
        op("INC", DirectPage), // E6
        op("SBC", DirectPageIndirectLong), // E7
        op("INX", Implied), // E8
        op("SBC", ImmediateM), // E9
        op("NOP", Implied), // EA
        op("XBA", Implied), // EB
        op("CPX", Absolute), // EC
        op("SBC", Absolute), // ED
        op("INC", Absolute), // EE
        op("SBC", AbsoluteLong), // EF
        op("BEQ", Relative8), // F0
        op("SBC", DirectPageIndirectIndexedY), // F1
        op("SBC", DirectPageIndirect), // F2
        op("SBC", StackRelativeIndirectY), // F3
        op("PEA", Immediate16), // F4
        op("SBC", DirectPageX), // F5
        op("INC", DirectPageX), // F6
        op("SBC", DirectPageIndirectLongY), // F7
        op("SED", Implied), // F8
        op("SBC", AbsoluteY), // F9
        op("PLX", Implied), // FA
        op("XCE", Implied), // FB
        op("JSR", AbsoluteIndexedIndirect), // FC
        op("SBC", AbsoluteX), // FD
        op("INC", AbsoluteX), // FE
        op("SBC", AbsoluteLongX), // FF
    ]
};

#[cfg(test)]
mod tests {
    use super::*;

    const B: RegWidth = RegWidth::Byte;
    const W: RegWidth = RegWidth::Word;

    #[test]
    fn test_table_spot_checks() {
        assert_eq!(opcode_info(0xA9).mnemonic, "LDA");
        assert_eq!(opcode_info(0xA9).mode, AddrMode::ImmediateM);
        assert_eq!(opcode_info(0xA2).mode, AddrMode::ImmediateX);
        assert_eq!(opcode_info(0x22).mnemonic, "JSL");
        assert_eq!(opcode_info(0xFB).mnemonic, "XCE");
        assert_eq!(opcode_info(0xFF).mode, AddrMode::AbsoluteLongX);
    }

    #[test]
    fn test_operand_sizes() {
        assert_eq!(AddrMode::ImmediateM.operand_size(B, W), 1);
        assert_eq!(AddrMode::ImmediateM.operand_size(W, B), 2);
        assert_eq!(AddrMode::ImmediateX.operand_size(W, B), 1);
        assert_eq!(AddrMode::ImmediateX.operand_size(B, W), 2);
        assert_eq!(AddrMode::BlockMove.operand_size(B, B), 2);
        assert_eq!(AddrMode::AbsoluteLong.operand_size(B, B), 3);
        assert_eq!(AddrMode::Implied.operand_size(W, W), 0);
    }

    #[test]
    fn test_reserved_default_one_byte() {
        for &opcode in &RESERVED_OPCODES {
            assert_eq!(opcode_info(opcode).mode.operand_size(W, W), 1);
        }
    }

    #[test]
    fn test_width_dependent_opcodes() {
        let m: Vec<u8> = (0..=255u8)
            .filter(|&op| opcode_info(op).mode == AddrMode::ImmediateM)
            .collect();
        let x: Vec<u8> = (0..=255u8)
            .filter(|&op| opcode_info(op).mode == AddrMode::ImmediateX)
            .collect();
        assert_eq!(m, vec![0x09, 0x29, 0x49, 0x69, 0x89, 0xA9, 0xC9, 0xE9]);
        assert_eq!(x, vec![0xA0, 0xA2, 0xC0, 0xE0]);
    }
}
