//! Stack-mutating instructions and their byte deltas.

use crate::WidthFlag;

/// Mnemonic of an instruction that moves the stack pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StackMnemonic {
    Pha,
    Phx,
    Phy,
    Php,
    Phb,
    Phd,
    Phk,
    Pea,
    Pei,
    Per,
    Pla,
    Plx,
    Ply,
    Plp,
    Plb,
    Pld,
    Jsr,
    Jsl,
    Rts,
    Rtl,
    Rti,
}

impl StackMnemonic {
    /// Push/pull pairs whose counts must match inside a routine.
    pub const PAIRS: [(Self, Self); 6] = [
        (Self::Phb, Self::Plb),
        (Self::Phd, Self::Pld),
        (Self::Php, Self::Plp),
        (Self::Pha, Self::Pla),
        (Self::Phx, Self::Plx),
        (Self::Phy, Self::Ply),
    ];

    /// Decode the stack effect of an opcode, if it has one.
    pub const fn from_opcode(opcode: u8) -> Option<Self> {
        Some(match opcode {
            0x48 => Self::Pha,
            0xDA => Self::Phx,
            0x5A => Self::Phy,
            0x08 => Self::Php,
            0x8B => Self::Phb,
            0x0B => Self::Phd,
            0x4B => Self::Phk,
            0xF4 => Self::Pea,
            0xD4 => Self::Pei,
            0x62 => Self::Per,
            0x68 => Self::Pla,
            0xFA => Self::Plx,
            0x7A => Self::Ply,
            0x28 => Self::Plp,
            0xAB => Self::Plb,
            0x2B => Self::Pld,
            0x20 | 0xFC => Self::Jsr,
            0x22 => Self::Jsl,
            0x60 => Self::Rts,
            0x6B => Self::Rtl,
            0x40 => Self::Rti,
            _ => return None,
        })
    }

    /// Bytes pushed (positive) or pulled (negative) at 8-bit widths.
    pub const fn base_delta(self) -> i32 {
        match self {
            Self::Pha | Self::Phx | Self::Phy | Self::Php | Self::Phb | Self::Phk => 1,
            Self::Phd | Self::Pea | Self::Pei | Self::Per | Self::Jsr => 2,
            Self::Jsl => 3,
            Self::Pla | Self::Plx | Self::Ply | Self::Plp | Self::Plb => -1,
            Self::Pld | Self::Rts => -2,
            Self::Rtl => -3,
            // P, PC and PBR in native mode.
            Self::Rti => -4,
        }
    }

    /// Width flag that doubles the delta when 16-bit.
    pub const fn governing_flag(self) -> Option<WidthFlag> {
        match self {
            Self::Pha | Self::Pla => Some(WidthFlag::M),
            Self::Phx | Self::Phy | Self::Plx | Self::Ply => Some(WidthFlag::X),
            _ => None,
        }
    }

    /// Call and return instructions move the stack across routine boundaries.
    pub const fn is_call_or_return(self) -> bool {
        matches!(
            self,
            Self::Jsr | Self::Jsl | Self::Rts | Self::Rtl | Self::Rti
        )
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Pha => "PHA",
            Self::Phx => "PHX",
            Self::Phy => "PHY",
            Self::Php => "PHP",
            Self::Phb => "PHB",
            Self::Phd => "PHD",
            Self::Phk => "PHK",
            Self::Pea => "PEA",
            Self::Pei => "PEI",
            Self::Per => "PER",
            Self::Pla => "PLA",
            Self::Plx => "PLX",
            Self::Ply => "PLY",
            Self::Plp => "PLP",
            Self::Plb => "PLB",
            Self::Pld => "PLD",
            Self::Jsr => "JSR",
            Self::Jsl => "JSL",
            Self::Rts => "RTS",
            Self::Rtl => "RTL",
            Self::Rti => "RTI",
        }
    }
}

impl std::fmt::Display for StackMnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode_info;

    #[test]
    fn test_names_match_table() {
        for opcode in 0..=255u8 {
            if let Some(mnemonic) = StackMnemonic::from_opcode(opcode) {
                assert_eq!(mnemonic.name(), opcode_info(opcode).mnemonic);
            }
        }
    }

    #[test]
    fn test_pairs_cancel() {
        for (push, pull) in StackMnemonic::PAIRS {
            assert_eq!(push.base_delta() + pull.base_delta(), 0, "{push}/{pull}");
            assert_eq!(push.governing_flag(), pull.governing_flag());
        }
    }

    #[test]
    fn test_call_return_deltas() {
        assert_eq!(StackMnemonic::Jsr.base_delta(), 2);
        assert_eq!(StackMnemonic::Jsl.base_delta(), 3);
        assert_eq!(StackMnemonic::Rts.base_delta(), -2);
        assert_eq!(StackMnemonic::Rtl.base_delta(), -3);
        assert!(StackMnemonic::Rti.is_call_or_return());
        assert!(!StackMnemonic::Php.is_call_or_return());
    }

    #[test]
    fn test_no_effect() {
        assert_eq!(StackMnemonic::from_opcode(0xEA), None);
        assert_eq!(StackMnemonic::from_opcode(0x4C), None);
        assert_eq!(StackMnemonic::from_opcode(0xFC), Some(StackMnemonic::Jsr));
    }
}
