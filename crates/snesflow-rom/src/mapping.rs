//! Cartridge address mapping conventions.
//!
//! Translates between console addresses and linear ROM file offsets. Both
//! directions are total: anything that does not land in ROM yields `None`.

use std::fmt;
use std::str::FromStr;

use crate::{Address, RomError};

const LOROM_WINDOW: usize = 0x8000;
const HIROM_WINDOW: usize = 0x1_0000;

/// Banks $00-$3F (mirrored at $80-$BF) addressable by LoROM.
const LOROM_BANKS: usize = 0x40;
/// Banks $C0-$FF addressable by HiROM.
const HIROM_BANKS: usize = 0x40;

/// Address mapping convention of a cartridge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mapping {
    /// 32 KB windows at $8000-$FFFF of each bank.
    #[default]
    LoRom,
    /// 64 KB windows, with the upper half mirrored into the system banks.
    HiRom,
}

impl Mapping {
    /// Translate a console address into a linear ROM offset.
    #[inline]
    pub const fn to_linear(self, addr: Address) -> Option<usize> {
        let bank = addr.bank() as usize;
        let offset = addr.offset() as usize;
        match self {
            Self::LoRom => {
                if offset < 0x8000 {
                    return None;
                }
                let window = match bank {
                    0x00..=0x3F => bank,
                    0x80..=0xBF => bank - 0x80,
                    0xC0..=0xFF => bank - 0xC0,
                    _ => return None,
                };
                Some(window * LOROM_WINDOW + (offset - 0x8000))
            }
            Self::HiRom => match bank {
                0xC0..=0xFF => Some((bank - 0xC0) * HIROM_WINDOW + offset),
                0x40..=0x7D => Some((bank - 0x40) * HIROM_WINDOW + offset),
                0x00..=0x3F | 0x80..=0xBF if offset >= 0x8000 => {
                    Some((bank & 0x3F) * HIROM_WINDOW + offset)
                }
                _ => None,
            },
        }
    }

    /// Translate a linear ROM offset into its canonical console address.
    #[inline]
    pub const fn to_address(self, linear: usize) -> Option<Address> {
        match self {
            Self::LoRom => {
                let bank = linear / LOROM_WINDOW;
                if bank >= LOROM_BANKS {
                    return None;
                }
                let offset = (linear % LOROM_WINDOW) + 0x8000;
                Some(Address::from_parts(bank as u8, offset as u16))
            }
            Self::HiRom => {
                let bank = linear / HIROM_WINDOW;
                if bank >= HIROM_BANKS {
                    return None;
                }
                let offset = linear % HIROM_WINDOW;
                Some(Address::from_parts(0xC0 | bank as u8, offset as u16))
            }
        }
    }

    /// Short lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::LoRom => "lorom",
            Self::HiRom => "hirom",
        }
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mapping {
    type Err = RomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lorom" => Ok(Self::LoRom),
            "hirom" => Ok(Self::HiRom),
            _ => Err(RomError::UnknownMapping(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_lorom_to_linear() {
        let m = Mapping::LoRom;
        assert_eq!(m.to_linear(Address::new(0x00_8000)), Some(0));
        assert_eq!(m.to_linear(Address::new(0x00_FFFF)), Some(0x7FFF));
        assert_eq!(m.to_linear(Address::new(0x01_8000)), Some(0x8000));
        assert_eq!(m.to_linear(Address::new(0x02_C0C3)), Some(0x1_40C3));
        assert_eq!(m.to_linear(Address::new(0x82_C0C3)), Some(0x1_40C3));
        assert_eq!(m.to_linear(Address::new(0xC2_C0C3)), Some(0x1_40C3));
    }

    #[test]
    fn test_lorom_unmapped() {
        let m = Mapping::LoRom;
        assert_eq!(m.to_linear(Address::new(0x00_7FFF)), None);
        assert_eq!(m.to_linear(Address::new(0x7E_8000)), None);
        assert_eq!(m.to_linear(Address::new(0x40_8000)), None);
        assert_eq!(m.to_address(0x20_0000), None);
    }

    #[test]
    fn test_hirom() {
        let m = Mapping::HiRom;
        assert_eq!(m.to_linear(Address::new(0xC0_0000)), Some(0));
        assert_eq!(m.to_linear(Address::new(0xC1_1234)), Some(0x1_1234));
        assert_eq!(m.to_linear(Address::new(0x41_1234)), Some(0x1_1234));
        assert_eq!(m.to_linear(Address::new(0x01_9234)), Some(0x1_9234));
        assert_eq!(m.to_linear(Address::new(0x81_9234)), Some(0x1_9234));
        assert_eq!(m.to_linear(Address::new(0x01_1234)), None);
        assert_eq!(m.to_linear(Address::new(0x7E_0000)), None);
        assert_eq!(m.to_address(0x1_1234), Some(Address::new(0xC1_1234)));
    }

    #[test]
    fn test_parse() {
        assert_eq!("LoROM".parse::<Mapping>().unwrap(), Mapping::LoRom);
        assert_eq!("hirom".parse::<Mapping>().unwrap(), Mapping::HiRom);
        assert!("exhirom".parse::<Mapping>().is_err());
    }

    proptest! {
        #[test]
        fn prop_round_trip(linear in 0usize..0x20_0000, hi in any::<bool>()) {
            let m = if hi { Mapping::HiRom } else { Mapping::LoRom };
            let addr = m.to_address(linear).unwrap();
            prop_assert_eq!(m.to_linear(addr), Some(linear));
        }

        #[test]
        fn prop_total(raw in any::<u32>()) {
            // Never panics, whatever the input.
            let _ = Mapping::LoRom.to_linear(Address::new(raw));
            let _ = Mapping::HiRom.to_linear(Address::new(raw));
        }
    }
}
