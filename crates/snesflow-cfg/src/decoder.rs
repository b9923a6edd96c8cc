//! Width-aware instruction decoding over a ROM image.

use snesflow_isa::{classify, opcode_info, operand_length, OpKind, TargetForm};
use snesflow_rom::{Address, RomImage};

use crate::RegisterState;

/// One decoded instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub addr: Address,
    pub opcode: u8,
    pub kind: OpKind,
    /// Operand byte count under the widths the instruction was decoded with.
    pub operand_len: u8,
}

impl Instruction {
    /// Decode the instruction at `addr` under the widths of `state`.
    ///
    /// Returns `None` when the opcode byte does not map into the image.
    pub fn decode(rom: &RomImage, addr: Address, state: &RegisterState) -> Option<Self> {
        let opcode = rom.read_byte(addr)?;
        let (m, x) = state.operand_widths();
        Some(Self {
            addr,
            opcode,
            kind: classify(opcode),
            operand_len: operand_length(opcode, m, x),
        })
    }

    pub fn mnemonic(&self) -> &'static str {
        opcode_info(self.opcode).mnemonic
    }

    /// Total size in bytes.
    pub const fn size(&self) -> u16 {
        1 + self.operand_len as u16
    }

    /// Address of the next sequential instruction.
    pub const fn next(&self) -> Address {
        self.addr.advance(self.size())
    }

    /// Operand byte `index` (0-based).
    pub fn operand_byte(&self, rom: &RomImage, index: u16) -> Option<u8> {
        rom.read_byte(self.addr.advance(1 + index))
    }

    fn operand_word(&self, rom: &RomImage) -> Option<u16> {
        Some(u16::from_le_bytes([
            self.operand_byte(rom, 0)?,
            self.operand_byte(rom, 1)?,
        ]))
    }

    fn operand_long(&self, rom: &RomImage) -> Option<Address> {
        let bytes = [
            self.operand_byte(rom, 0)?,
            self.operand_byte(rom, 1)?,
            self.operand_byte(rom, 2)?,
            0,
        ];
        Some(Address::new(u32::from_le_bytes(bytes)))
    }

    /// Destination of a relative branch.
    pub fn branch_target(&self, rom: &RomImage) -> Option<Address> {
        let displacement = match self.operand_len {
            1 => i32::from(self.operand_byte(rom, 0)? as i8),
            2 => i32::from(self.operand_word(rom)? as i16),
            _ => return None,
        };
        Some(self.next().displace(displacement))
    }

    /// Destination of a direct call or jump; `None` for indirect forms.
    pub fn control_target(&self, rom: &RomImage) -> Option<Address> {
        match snesflow_isa::target_form(self.opcode)? {
            TargetForm::Absolute => Some(self.addr.with_offset(self.operand_word(rom)?)),
            TargetForm::Long => self.operand_long(rom),
            TargetForm::Indirect => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Width;
    use snesflow_rom::Mapping;

    fn rom_with(code: &[u8]) -> RomImage {
        let mut data = vec![0; 0x8000];
        data[..code.len()].copy_from_slice(code);
        RomImage::from_bytes(data, Mapping::LoRom)
    }

    const BASE: Address = Address::new(0x00_8000);

    #[test]
    fn test_width_dependent_length() {
        let rom = rom_with(&[0xA9, 0x34, 0x12]);
        let narrow = Instruction::decode(&rom, BASE, &RegisterState::native8()).unwrap();
        assert_eq!(narrow.size(), 2);
        let wide = RegisterState::new(Width::Bits16, Width::Bits8);
        assert_eq!(Instruction::decode(&rom, BASE, &wide).unwrap().size(), 3);

        let mut emulated = wide;
        emulated.emulation = true;
        assert_eq!(Instruction::decode(&rom, BASE, &emulated).unwrap().size(), 2);
    }

    #[test]
    fn test_targets() {
        // JSR $9000 ; JSL $028000 ; BNE -6 ; JMP ($1234)
        let rom = rom_with(&[
            0x20, 0x00, 0x90, 0x22, 0x00, 0x80, 0x02, 0xD0, 0xF9, 0x6C, 0x34, 0x12,
        ]);
        let state = RegisterState::native8();
        let jsr = Instruction::decode(&rom, BASE, &state).unwrap();
        assert_eq!(jsr.kind, OpKind::Call);
        assert_eq!(jsr.control_target(&rom), Some(Address::new(0x00_9000)));

        let jsl = Instruction::decode(&rom, jsr.next(), &state).unwrap();
        assert_eq!(jsl.control_target(&rom), Some(Address::new(0x02_8000)));

        let bne = Instruction::decode(&rom, jsl.next(), &state).unwrap();
        assert_eq!(bne.kind, OpKind::Branch);
        assert_eq!(bne.branch_target(&rom), Some(Address::new(0x00_8002)));

        let jmp = Instruction::decode(&rom, bne.next(), &state).unwrap();
        assert_eq!(jmp.kind, OpKind::Jump);
        assert_eq!(jmp.control_target(&rom), None);
    }

    #[test]
    fn test_unmapped() {
        let rom = rom_with(&[]);
        let state = RegisterState::native8();
        assert!(Instruction::decode(&rom, Address::new(0x00_1000), &state).is_none());
    }
}
