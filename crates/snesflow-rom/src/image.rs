//! In-memory ROM image.

use std::path::Path;

use crate::{Address, Mapping, Result, RomError};

/// Hardware vectors read from bank $00.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Vector {
    /// Emulation-mode reset.
    Reset,
    /// Emulation-mode NMI.
    Nmi,
    /// Native-mode IRQ.
    Irq,
}

impl Vector {
    /// All vectors, in seeding order.
    pub const ALL: [Self; 3] = [Self::Reset, Self::Nmi, Self::Irq];

    /// Location of the vector word.
    pub const fn location(self) -> Address {
        match self {
            Self::Reset => Address::new(0x00_FFFC),
            Self::Nmi => Address::new(0x00_FFFA),
            Self::Irq => Address::new(0x00_FFEE),
        }
    }
}

/// Immutable ROM bytes plus the mapping used to address them.
#[derive(Clone, Debug)]
pub struct RomImage {
    data: Vec<u8>,
    mapping: Mapping,
}

impl RomImage {
    /// Wrap raw ROM bytes.
    pub fn from_bytes(data: Vec<u8>, mapping: Mapping) -> Self {
        Self { data, mapping }
    }

    /// Load a ROM file from disk.
    pub fn load(path: &Path, mapping: Mapping) -> Result<Self> {
        let data = std::fs::read(path).map_err(|source| RomError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if data.is_empty() {
            return Err(RomError::Empty);
        }
        Ok(Self::from_bytes(data, mapping))
    }

    /// Mapping convention.
    pub fn mapping(&self) -> Mapping {
        self.mapping
    }

    /// Raw bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the image holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Linear offset of an address, if it maps inside this image.
    #[inline]
    pub fn linear(&self, addr: Address) -> Option<usize> {
        self.mapping
            .to_linear(addr)
            .filter(|&offset| offset < self.data.len())
    }

    /// Check if the address maps inside this image.
    pub fn contains(&self, addr: Address) -> bool {
        self.linear(addr).is_some()
    }

    /// Read a byte.
    #[inline]
    pub fn read_byte(&self, addr: Address) -> Option<u8> {
        self.linear(addr).map(|offset| self.data[offset])
    }

    /// Read a little-endian 16-bit word.
    pub fn read_word(&self, addr: Address) -> Option<u16> {
        let lo = self.read_byte(addr)?;
        let hi = self.read_byte(addr.next_linear())?;
        Some(u16::from_le_bytes([lo, hi]))
    }

    /// Read a little-endian 24-bit long address.
    pub fn read_long(&self, addr: Address) -> Option<Address> {
        let lo = self.read_byte(addr)?;
        let mid = self.read_byte(addr.next_linear())?;
        let hi = self.read_byte(addr.next_linear().next_linear())?;
        Some(Address::new(u32::from_le_bytes([lo, mid, hi, 0])))
    }

    /// Read a hardware vector; a zero vector counts as absent.
    pub fn vector(&self, vector: Vector) -> Option<Address> {
        match self.read_word(vector.location())? {
            0 => None,
            target => Some(Address::from_parts(0x00, target)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lorom(size: usize) -> Vec<u8> {
        vec![0; size]
    }

    #[test]
    fn test_reads() {
        let mut data = lorom(0x1_0000);
        data[0x10..0x13].copy_from_slice(&[0x34, 0x12, 0x02]);
        let rom = RomImage::from_bytes(data, Mapping::LoRom);

        assert_eq!(rom.read_byte(Address::new(0x00_8010)), Some(0x34));
        assert_eq!(rom.read_word(Address::new(0x00_8010)), Some(0x1234));
        assert_eq!(
            rom.read_long(Address::new(0x00_8010)),
            Some(Address::new(0x02_1234))
        );
    }

    #[test]
    fn test_out_of_bounds() {
        let rom = RomImage::from_bytes(lorom(0x8000), Mapping::LoRom);
        assert!(rom.contains(Address::new(0x00_FFFF)));
        assert_eq!(rom.read_byte(Address::new(0x01_8000)), None);
        assert_eq!(rom.read_word(Address::new(0x00_FFFF)), None);
        assert_eq!(rom.read_byte(Address::new(0x7E_0000)), None);
    }

    #[test]
    fn test_vectors() {
        let mut data = lorom(0x8000);
        // $00FFFC -> offset 0x7FFC
        data[0x7FFC] = 0x00;
        data[0x7FFD] = 0x80;
        data[0x7FEE] = 0xC9;
        data[0x7FEF] = 0x80;
        let rom = RomImage::from_bytes(data, Mapping::LoRom);

        assert_eq!(rom.vector(Vector::Reset), Some(Address::new(0x00_8000)));
        assert_eq!(rom.vector(Vector::Irq), Some(Address::new(0x00_80C9)));
        assert_eq!(rom.vector(Vector::Nmi), None);
    }

    #[test]
    fn test_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.sfc");
        std::fs::write(&path, [0xEA_u8; 16]).unwrap();

        let rom = RomImage::load(&path, Mapping::LoRom).unwrap();
        assert_eq!(rom.len(), 16);
        assert_eq!(rom.read_byte(Address::new(0x00_8000)), Some(0xEA));

        let empty = dir.path().join("empty.sfc");
        std::fs::write(&empty, b"").unwrap();
        assert!(matches!(
            RomImage::load(&empty, Mapping::LoRom),
            Err(RomError::Empty)
        ));
        assert!(matches!(
            RomImage::load(&dir.path().join("missing.sfc"), Mapping::LoRom),
            Err(RomError::Io { .. })
        ));
    }
}
