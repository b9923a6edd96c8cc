//! Hook entry-state drift between two builds of the same ROM.

use rustc_hash::FxHashMap;
use snesflow_cfg::{Diagnostic, DiagnosticKind, HookInfo, RegisterState, StateTracker};
use snesflow_isa::WidthFlag;
use snesflow_rom::{Address, RomImage};
use tracing::info_span;

use crate::{AnalysisConfig, root_entry_points};

/// Trace `rom` from its root entry points and return the state at each hook.
fn hook_states(
    rom: &RomImage,
    hooks: &[HookInfo],
    config: &AnalysisConfig,
) -> FxHashMap<Address, RegisterState> {
    let mut tracker = StateTracker::new(rom);
    for addr in root_entry_points(rom, config) {
        tracker.add_entry_point(addr, config.default_state.clone());
    }
    let output = tracker.finish();
    hooks
        .iter()
        .filter_map(|hook| {
            output
                .visited
                .get(&hook.address)
                .map(|state| (hook.address, state.clone()))
        })
        .collect()
}

/// Warn for every hook whose known M or X width differs between builds.
///
/// Both ROMs are analyzed in parallel, each with its own tracker. Hooks not
/// reached in both builds are not compared.
pub fn compare_entry_states(
    baseline: &RomImage,
    patched: &RomImage,
    hooks: &[HookInfo],
    config: &AnalysisConfig,
) -> Vec<Diagnostic> {
    let _span = info_span!("compare_entry_states", hooks = hooks.len()).entered();
    let (before, after) = rayon::join(
        || hook_states(baseline, hooks, config),
        || hook_states(patched, hooks, config),
    );

    let mut diagnostics = Vec::new();
    for hook in hooks {
        let (Some(old), Some(new)) = (before.get(&hook.address), after.get(&hook.address)) else {
            continue;
        };
        for flag in WidthFlag::BOTH {
            let (was, now) = (old.width(flag), new.width(flag));
            if was.conflicts(now) {
                diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::StateDrift,
                        hook.address,
                        format!("Hook '{}' {flag} width changed: {was} -> {now}", hook.name),
                    )
                    .with_context("baseline", old)
                    .with_context("patched", new)
                    .with_source(hook.source.clone()),
                );
            }
        }
    }
    diagnostics
}
