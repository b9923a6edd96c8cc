//! Abstract register state tracked per address.

use std::fmt;

use snesflow_isa::{RegWidth, StackMnemonic, WidthFlag};
use snesflow_rom::Address;

/// Tri-state register width.
///
/// `Unknown` is the result of opaque restores (PLP, RTI) and is never
/// conflated with either concrete width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Width {
    Bits8,
    Bits16,
    #[default]
    Unknown,
}

impl Width {
    /// Width for a concrete register size.
    pub const fn known(width: RegWidth) -> Self {
        match width {
            RegWidth::Byte => Self::Bits8,
            RegWidth::Word => Self::Bits16,
        }
    }

    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Equal, or either side unknown.
    pub const fn compatible(self, other: Self) -> bool {
        !self.conflicts(other)
    }

    /// Both sides known and different.
    pub const fn conflicts(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Bits8, Self::Bits16) | (Self::Bits16, Self::Bits8)
        )
    }

    /// Concrete width used for decoding; unknown decodes as 8-bit.
    pub const fn resolve(self) -> RegWidth {
        match self {
            Self::Bits16 => RegWidth::Word,
            Self::Bits8 | Self::Unknown => RegWidth::Byte,
        }
    }

    /// Short form used in state summaries.
    pub const fn short(self) -> &'static str {
        match self {
            Self::Bits8 => "8",
            Self::Bits16 => "16",
            Self::Unknown => "?",
        }
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bits8 => "8-bit",
            Self::Bits16 => "16-bit",
            Self::Unknown => "unknown",
        })
    }
}

/// One recorded stack-pointer movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackOp {
    pub addr: Address,
    pub mnemonic: StackMnemonic,
    /// Width-resolved byte delta.
    pub delta: i32,
    /// Depth relative to routine entry after this operation.
    pub depth: i32,
}

impl fmt::Display for StackOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}({:+})", self.mnemonic, self.addr, self.delta)
    }
}

/// Processor state snapshot: M/X widths, emulation bit, and stack history.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterState {
    pub m: Width,
    pub x: Width,
    pub emulation: bool,
    pub stack_depth: i32,
    pub stack_ops: Vec<StackOp>,
}

impl RegisterState {
    pub const fn new(m: Width, x: Width) -> Self {
        Self {
            m,
            x,
            emulation: false,
            stack_depth: 0,
            stack_ops: Vec::new(),
        }
    }

    /// Both registers 8-bit in native mode.
    pub const fn native8() -> Self {
        Self::new(Width::Bits8, Width::Bits8)
    }

    /// Nothing known about either width.
    pub const fn unknown() -> Self {
        Self::new(Width::Unknown, Width::Unknown)
    }

    pub const fn width(&self, flag: WidthFlag) -> Width {
        match flag {
            WidthFlag::M => self.m,
            WidthFlag::X => self.x,
        }
    }

    pub fn set_width(&mut self, flag: WidthFlag, width: Width) {
        match flag {
            WidthFlag::M => self.m = width,
            WidthFlag::X => self.x = width,
        }
    }

    /// Merge compatibility: no flag is proven contradictory.
    pub const fn compatible(&self, other: &Self) -> bool {
        self.m.compatible(other.m) && self.x.compatible(other.x)
    }

    /// Flags that are known on both sides and differ.
    pub fn conflicts(&self, other: &Self) -> Vec<WidthFlag> {
        WidthFlag::BOTH
            .into_iter()
            .filter(|&flag| self.width(flag).conflicts(other.width(flag)))
            .collect()
    }

    /// Accumulator and index widths used to size operands.
    pub const fn operand_widths(&self) -> (RegWidth, RegWidth) {
        if self.emulation {
            return (RegWidth::Byte, RegWidth::Byte);
        }
        (self.m.resolve(), self.x.resolve())
    }

    /// Stack delta of an operation under this state's widths.
    ///
    /// Register pushes and pulls double only when the governing flag is
    /// known to be 16-bit.
    pub const fn stack_delta(&self, mnemonic: StackMnemonic) -> i32 {
        let base = mnemonic.base_delta();
        match mnemonic.governing_flag() {
            Some(flag) if matches!(self.width(flag), Width::Bits16) => base * 2,
            _ => base,
        }
    }

    /// Record a stack operation and update the running depth.
    pub fn record_stack_op(&mut self, addr: Address, mnemonic: StackMnemonic) {
        let delta = self.stack_delta(mnemonic);
        self.stack_depth += delta;
        self.stack_ops.push(StackOp {
            addr,
            mnemonic,
            delta,
            depth: self.stack_depth,
        });
    }

    /// REP: every flag whose bit is set in `mask` becomes 16-bit.
    pub fn apply_rep(&mut self, mask: u8) {
        self.apply_mask(mask, Width::Bits16);
    }

    /// SEP: every flag whose bit is set in `mask` becomes 8-bit.
    pub fn apply_sep(&mut self, mask: u8) {
        self.apply_mask(mask, Width::Bits8);
    }

    fn apply_mask(&mut self, mask: u8, width: Width) {
        for flag in WidthFlag::BOTH {
            if flag.in_mask(mask) {
                self.set_width(flag, width);
            }
        }
    }

    /// PLP / RTI: the pulled status byte is opaque.
    pub fn restore_flags(&mut self) {
        self.m = Width::Unknown;
        self.x = Width::Unknown;
    }

    /// XCE, approximated as landing in native mode with 8-bit registers.
    pub fn exchange_mode(&mut self) {
        self.m = Width::Bits8;
        self.x = Width::Bits8;
        self.emulation = false;
    }

    /// State at the entry of a called routine: same widths, fresh stack.
    pub fn enter_routine(&self) -> Self {
        Self {
            m: self.m,
            x: self.x,
            emulation: self.emulation,
            stack_depth: 0,
            stack_ops: Vec::new(),
        }
    }

    /// Stack operations excluding calls and returns.
    pub fn local_ops(&self) -> impl Iterator<Item = &StackOp> {
        self.stack_ops
            .iter()
            .filter(|op| !op.mnemonic.is_call_or_return())
    }
}

impl fmt::Display for RegisterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "M={} X={} stk={}",
            self.m.short(),
            self.x.short(),
            self.stack_depth
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn width() -> impl Strategy<Value = Width> {
        prop_oneof![
            Just(Width::Bits8),
            Just(Width::Bits16),
            Just(Width::Unknown)
        ]
    }

    #[test]
    fn test_width_compatibility() {
        assert!(Width::Unknown.compatible(Width::Bits8));
        assert!(Width::Unknown.compatible(Width::Bits16));
        assert!(Width::Bits8.compatible(Width::Bits8));
        assert!(!Width::Bits8.compatible(Width::Bits16));
        assert!(!Width::Bits16.compatible(Width::Bits8));
    }

    #[test]
    fn test_rep_sep_masks_independent() {
        let mut state = RegisterState::native8();
        state.apply_rep(0x20);
        assert_eq!((state.m, state.x), (Width::Bits16, Width::Bits8));
        state.apply_rep(0x10);
        assert_eq!((state.m, state.x), (Width::Bits16, Width::Bits16));
        state.apply_sep(0x10);
        assert_eq!((state.m, state.x), (Width::Bits16, Width::Bits8));
        state.apply_sep(0x0F);
        assert_eq!((state.m, state.x), (Width::Bits16, Width::Bits8));
    }

    #[test]
    fn test_restore_and_exchange() {
        let mut state = RegisterState::new(Width::Bits16, Width::Bits16);
        state.restore_flags();
        assert_eq!(state, RegisterState::unknown());
        state.emulation = true;
        state.exchange_mode();
        assert_eq!(state, RegisterState::native8());
    }

    #[test]
    fn test_stack_delta_scaling() {
        let wide_m = RegisterState::new(Width::Bits16, Width::Bits8);
        assert_eq!(wide_m.stack_delta(StackMnemonic::Pha), 2);
        assert_eq!(wide_m.stack_delta(StackMnemonic::Pla), -2);
        assert_eq!(wide_m.stack_delta(StackMnemonic::Phx), 1);

        let wide_x = RegisterState::new(Width::Bits8, Width::Bits16);
        assert_eq!(wide_x.stack_delta(StackMnemonic::Pha), 1);
        assert_eq!(wide_x.stack_delta(StackMnemonic::Phy), 2);
        assert_eq!(wide_x.stack_delta(StackMnemonic::Plx), -2);

        let unknown = RegisterState::unknown();
        assert_eq!(unknown.stack_delta(StackMnemonic::Pha), 1);
        assert_eq!(unknown.stack_delta(StackMnemonic::Plx), -1);

        for state in [&wide_m, &wide_x, &unknown] {
            assert_eq!(state.stack_delta(StackMnemonic::Php), 1);
            assert_eq!(state.stack_delta(StackMnemonic::Phd), 2);
            assert_eq!(state.stack_delta(StackMnemonic::Plb), -1);
        }
    }

    #[test]
    fn test_record_and_enter_routine() {
        let mut state = RegisterState::new(Width::Bits16, Width::Bits8);
        let addr = Address::new(0x00_8000);
        state.record_stack_op(addr, StackMnemonic::Pha);
        state.record_stack_op(addr.advance(1), StackMnemonic::Jsl);
        assert_eq!(state.stack_depth, 5);
        assert_eq!(state.stack_ops[1].depth, 5);
        assert_eq!(state.local_ops().count(), 1);

        let callee = state.enter_routine();
        assert_eq!((callee.m, callee.x), (Width::Bits16, Width::Bits8));
        assert_eq!(callee.stack_depth, 0);
        assert!(callee.stack_ops.is_empty());
    }

    #[test]
    fn test_display() {
        let state = RegisterState::new(Width::Bits8, Width::Bits16);
        assert_eq!(state.to_string(), "M=8 X=16 stk=0");
        assert_eq!(RegisterState::unknown().to_string(), "M=? X=? stk=0");
    }

    proptest! {
        #[test]
        fn prop_compatible_reflexive(m in width(), x in width()) {
            let state = RegisterState::new(m, x);
            prop_assert!(state.compatible(&state));
        }

        #[test]
        fn prop_compatible_symmetric(a in (width(), width()), b in (width(), width())) {
            let a = RegisterState::new(a.0, a.1);
            let b = RegisterState::new(b.0, b.1);
            prop_assert_eq!(a.compatible(&b), b.compatible(&a));
            prop_assert_eq!(a.compatible(&b), a.conflicts(&b).is_empty());
        }

        #[test]
        fn prop_mask_touches_only_selected(m in width(), x in width(), mask in any::<u8>()) {
            let mut rep = RegisterState::new(m, x);
            rep.apply_rep(mask);
            let mut sep = RegisterState::new(m, x);
            sep.apply_sep(mask);
            if mask & 0x20 == 0 {
                prop_assert_eq!(rep.m, m);
                prop_assert_eq!(sep.m, m);
            }
            if mask & 0x10 == 0 {
                prop_assert_eq!(rep.x, x);
                prop_assert_eq!(sep.x, x);
            }
        }
    }
}
