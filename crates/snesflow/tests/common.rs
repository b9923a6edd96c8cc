#![allow(dead_code)]

use snesflow::{Address, Mapping, RomImage, Vector};

/// Four LoROM banks.
pub const ROM_SIZE: usize = 0x2_0000;

/// Byte-level LoROM image builder.
pub struct RomBuilder {
    data: Vec<u8>,
}

impl RomBuilder {
    pub fn new() -> Self {
        Self {
            data: vec![0; ROM_SIZE],
        }
    }

    /// Place `bytes` at the console address `addr`.
    pub fn code(mut self, addr: u32, bytes: &[u8]) -> Self {
        let offset = Mapping::LoRom
            .to_linear(Address::new(addr))
            .expect("address outside LoROM");
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    /// Point a bank-$00 hardware vector at `target`.
    pub fn vector(self, vector: Vector, target: u16) -> Self {
        let location = vector.location().raw();
        self.code(location, &target.to_le_bytes())
    }

    pub fn build(self) -> RomImage {
        RomImage::from_bytes(self.data, Mapping::LoRom)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

pub fn sep(mask: u8) -> [u8; 2] {
    [0xE2, mask]
}

pub fn rep(mask: u8) -> [u8; 2] {
    [0xC2, mask]
}

pub fn jsl(target: u32) -> [u8; 4] {
    let [lo, mid, hi, _] = target.to_le_bytes();
    [0x22, lo, mid, hi]
}

pub fn jsr(target: u16) -> [u8; 3] {
    let [lo, hi] = target.to_le_bytes();
    [0x20, lo, hi]
}

pub const RTL: u8 = 0x6B;
pub const RTS: u8 = 0x60;
pub const PHP: u8 = 0x08;
pub const PLP: u8 = 0x28;
pub const NOP: u8 = 0xEA;

/// Concatenate instruction encodings.
pub fn asm(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}
