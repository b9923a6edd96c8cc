//! 24-bit bank:offset addresses.

use std::fmt;

/// An address in the console's 24-bit banked address space.
///
/// The high byte is the bank, the low 16 bits the offset within the bank.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u32);

impl Address {
    /// Mask for the 24 significant bits.
    pub const MASK: u32 = 0x00FF_FFFF;

    /// Create an address from a raw value (upper byte discarded).
    pub const fn new(raw: u32) -> Self {
        Self(raw & Self::MASK)
    }

    /// Create an address from its bank and in-bank offset.
    pub const fn from_parts(bank: u8, offset: u16) -> Self {
        Self(((bank as u32) << 16) | offset as u32)
    }

    /// Raw 24-bit value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Bank byte.
    pub const fn bank(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// Offset within the bank.
    pub const fn offset(self) -> u16 {
        self.0 as u16
    }

    /// Same bank, different offset.
    pub const fn with_offset(self, offset: u16) -> Self {
        Self::from_parts(self.bank(), offset)
    }

    /// Advance by `n` bytes, wrapping within the bank.
    ///
    /// The program counter never carries into the program bank register.
    pub const fn advance(self, n: u16) -> Self {
        self.with_offset(self.offset().wrapping_add(n))
    }

    /// Apply a signed displacement, wrapping within the bank.
    pub const fn displace(self, delta: i32) -> Self {
        self.with_offset((self.offset() as i32).wrapping_add(delta) as u16)
    }

    /// Linear successor (carries into the bank); used for multi-byte reads.
    pub const fn next_linear(self) -> Self {
        Self::new(self.0.wrapping_add(1))
    }

    /// Whether two addresses lie in different banks.
    pub const fn crosses_bank(self, other: Self) -> bool {
        self.bank() != other.bank()
    }
}

impl From<u32> for Address {
    fn from(raw: u32) -> Self {
        Self::new(raw)
    }
}

impl From<Address> for u32 {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:06X}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl fmt::UpperHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts() {
        let addr = Address::new(0x02_C0C3);
        assert_eq!(addr.bank(), 0x02);
        assert_eq!(addr.offset(), 0xC0C3);
        assert_eq!(Address::from_parts(0x02, 0xC0C3), addr);
        assert_eq!(Address::new(0xFF12_3456).raw(), 0x12_3456);
    }

    #[test]
    fn test_advance_wraps_in_bank() {
        let addr = Address::new(0x00_FFFE);
        assert_eq!(addr.advance(1), Address::new(0x00_FFFF));
        assert_eq!(addr.advance(3), Address::new(0x00_0001));
        assert_eq!(Address::new(0x00_FFFF).next_linear(), Address::new(0x01_0000));
    }

    #[test]
    fn test_displace() {
        let addr = Address::new(0x01_8010);
        assert_eq!(addr.displace(-0x10), Address::new(0x01_8000));
        assert_eq!(addr.displace(0x20), Address::new(0x01_8030));
        assert_eq!(Address::new(0x01_0002).displace(-4), Address::new(0x01_FFFE));
    }

    #[test]
    fn test_display() {
        assert_eq!(Address::new(0x00_8000).to_string(), "$008000");
        assert_eq!(format!("{:06X}", Address::new(0x7E_0010)), "7E0010");
    }
}
