//! Hook discovery from labeled JSL targets.

use rustc_hash::FxHashSet;
use snesflow_cfg::{HookInfo, HookKind, Labels};
use snesflow_rom::{Address, RomImage};
use tracing::debug;

const JSL: u8 = 0x22;

/// Every labeled `JSL` target in the ROM, once, in order of first use.
///
/// This is a byte scan, not a trace: a `$22` inside data or an operand can
/// produce a hook, which is harmless as long as its target is labeled.
pub fn find_jsl_hooks(rom: &RomImage, labels: &Labels) -> Vec<HookInfo> {
    let mut seen = FxHashSet::default();
    let mut hooks = Vec::new();
    for window in rom.data().windows(4) {
        if window[0] != JSL {
            continue;
        }
        let target = Address::new(u32::from_le_bytes([window[1], window[2], window[3], 0]));
        let Some(name) = labels.get(target) else {
            continue;
        };
        if seen.insert(target) {
            hooks.push(HookInfo::new(name, target, HookKind::Jsl));
        }
    }
    debug!(hooks = hooks.len(), "detected JSL hooks");
    hooks
}
