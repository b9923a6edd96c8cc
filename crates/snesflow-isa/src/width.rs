//! Register width flags.

use std::fmt;

use crate::IsaError;

/// Concrete width of the accumulator or index registers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RegWidth {
    #[default]
    Byte,
    Word,
}

impl RegWidth {
    /// Size in bytes (1 or 2).
    pub const fn bytes(self) -> u8 {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
        }
    }

    /// Size in bits (8 or 16).
    pub const fn bits(self) -> u32 {
        match self {
            Self::Byte => 8,
            Self::Word => 16,
        }
    }
}

impl TryFrom<u32> for RegWidth {
    type Error = IsaError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(Self::Byte),
            16 => Ok(Self::Word),
            other => Err(IsaError::InvalidWidth(other)),
        }
    }
}

impl fmt::Display for RegWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// One of the two width bits of the processor status register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WidthFlag {
    /// Accumulator and memory width.
    M,
    /// Index register width.
    X,
}

impl WidthFlag {
    pub const BOTH: [Self; 2] = [Self::M, Self::X];

    /// Bit in the status register; set means 8-bit.
    pub const fn mask(self) -> u8 {
        match self {
            Self::M => 0x20,
            Self::X => 0x10,
        }
    }

    /// Check if this flag's bit is present in a REP/SEP mask.
    pub const fn in_mask(self, mask: u8) -> bool {
        mask & self.mask() != 0
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::M => "M",
            Self::X => "X",
        }
    }
}

impl fmt::Display for WidthFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
