//! Worklist-driven M/X width tracker.
//!
//! Walks code from declared entry points, decoding each instruction under
//! the widths in effect on the current path. Every address is snapshotted
//! once; later paths reaching it either agree (and stop) or contradict it
//! (and are reported once). Work items carry the start of the routine they
//! belong to, which attributes returns without simulating a call stack.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use snesflow_isa::{OpKind, StackMnemonic};
use snesflow_rom::{Address, RomImage};
use tracing::{debug, trace, trace_span};

use crate::{
    check_stack_balance, CallGraph, CrossRef, Diagnostic, DiagnosticKind, Instruction, Labels,
    RefKind, RegisterState,
};

/// Return instructions traced for one routine, with the state at each.
pub type ReturnStates = FxHashMap<Address, Vec<(Address, RegisterState)>>;

/// Pending trace: where to start, the state on entry, and the owning routine.
#[derive(Clone, Debug)]
struct WorkItem {
    addr: Address,
    state: RegisterState,
    routine: Address,
}

/// Everything a completed run produced.
#[derive(Clone, Debug, Default)]
pub struct TrackerOutput {
    /// State on first arrival at each decoded instruction.
    pub visited: FxHashMap<Address, RegisterState>,
    /// Routine start to its traced returns.
    pub return_states: ReturnStates,
    pub cross_refs: Vec<CrossRef>,
    pub call_graph: CallGraph,
    pub diagnostics: Vec<Diagnostic>,
}

/// Fixed-point width tracker over one ROM image.
pub struct StateTracker<'a> {
    rom: &'a RomImage,
    labels: Option<&'a Labels>,
    visited: FxHashMap<Address, RegisterState>,
    worklist: VecDeque<WorkItem>,
    entries: Vec<Address>,
    mismatched: FxHashSet<Address>,
    cross_refs: Vec<CrossRef>,
    call_graph: CallGraph,
    return_states: ReturnStates,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> StateTracker<'a> {
    pub fn new(rom: &'a RomImage) -> Self {
        Self {
            rom,
            labels: None,
            visited: FxHashMap::default(),
            worklist: VecDeque::new(),
            entries: Vec::new(),
            mismatched: FxHashSet::default(),
            cross_refs: Vec::new(),
            call_graph: CallGraph::new(),
            return_states: FxHashMap::default(),
            diagnostics: Vec::new(),
        }
    }

    /// Use `labels` when rendering addresses in messages.
    #[must_use]
    pub fn with_labels(mut self, labels: &'a Labels) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Queue an entry point as the start of its own routine.
    pub fn add_entry_point(&mut self, addr: Address, state: RegisterState) {
        self.call_graph.add_entry_point(addr);
        if !self.entries.contains(&addr) {
            self.entries.push(addr);
        }
        self.worklist.push_back(WorkItem {
            addr,
            state,
            routine: addr,
        });
    }

    /// Add an entry point and drain the worklist.
    pub fn analyze_from(&mut self, addr: Address, state: RegisterState) {
        self.add_entry_point(addr, state);
        self.run();
    }

    /// Process work items until none remain.
    pub fn run(&mut self) {
        let _span = trace_span!("worklist").entered();
        let mut blocks = 0usize;
        while let Some(item) = self.worklist.pop_front() {
            blocks += 1;
            self.trace_block(item);
        }
        trace!(blocks, visited = self.visited.len(), "worklist drained");
    }

    pub const fn visited(&self) -> &FxHashMap<Address, RegisterState> {
        &self.visited
    }

    pub fn state_at(&self, addr: Address) -> Option<&RegisterState> {
        self.visited.get(&addr)
    }

    pub fn pending(&self) -> usize {
        self.worklist.len()
    }

    pub const fn return_states(&self) -> &ReturnStates {
        &self.return_states
    }

    pub fn cross_refs(&self) -> &[CrossRef] {
        &self.cross_refs
    }

    pub const fn call_graph(&self) -> &CallGraph {
        &self.call_graph
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Drain remaining work, finalize the call graph, and report entry
    /// points that were never reached.
    pub fn finish(mut self) -> TrackerOutput {
        self.run();
        self.call_graph.finalize();

        for &entry in &self.entries {
            if !self.visited.contains_key(&entry) {
                let label = self.label(entry);
                self.diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::UnreachedEntry,
                    entry,
                    format!("Entry point {label} was never visited"),
                ));
            }
        }

        debug!(
            visited = self.visited.len(),
            cross_refs = self.cross_refs.len(),
            routines = self.return_states.len(),
            diagnostics = self.diagnostics.len(),
            "width tracking complete"
        );

        TrackerOutput {
            visited: self.visited,
            return_states: self.return_states,
            cross_refs: self.cross_refs,
            call_graph: self.call_graph,
            diagnostics: self.diagnostics,
        }
    }

    fn label(&self, addr: Address) -> String {
        self.labels
            .map_or_else(|| addr.to_string(), |labels| labels.render(addr))
    }

    fn enqueue(&mut self, addr: Address, state: RegisterState, routine: Address) {
        self.worklist.push_back(WorkItem {
            addr,
            state,
            routine,
        });
    }

    fn record_ref(&mut self, xref: CrossRef) {
        self.cross_refs.push(xref);
        self.call_graph.add_reference(xref);
    }

    fn trace_block(&mut self, item: WorkItem) {
        let WorkItem {
            mut addr,
            mut state,
            routine,
        } = item;
        trace!(%addr, %routine, %state, "trace block");

        loop {
            if let Some(existing) = self.visited.get(&addr) {
                if !existing.compatible(&state) {
                    let existing = existing.clone();
                    self.report_mismatch(addr, &existing, &state);
                }
                return;
            }

            let Some(insn) = Instruction::decode(self.rom, addr, &state) else {
                return;
            };
            self.visited.insert(addr, state.clone());

            if insn.kind.ends_block() {
                self.end_block(&insn, state, routine);
                return;
            }

            match insn.kind {
                OpKind::ClearFlags => {
                    if let Some(mask) = insn.operand_byte(self.rom, 0) {
                        state.apply_rep(mask);
                    }
                }
                OpKind::SetFlags => {
                    if let Some(mask) = insn.operand_byte(self.rom, 0) {
                        state.apply_sep(mask);
                    }
                }
                OpKind::RestoreFlags => {
                    state.record_stack_op(addr, StackMnemonic::Plp);
                    state.restore_flags();
                }
                OpKind::ExchangeMode => state.exchange_mode(),
                OpKind::Push | OpKind::Pull => {
                    if let Some(mnemonic) = StackMnemonic::from_opcode(insn.opcode) {
                        state.record_stack_op(addr, mnemonic);
                    }
                }
                OpKind::Call => self.handle_call(&insn, &mut state, routine),
                OpKind::Branch => {
                    if let Some(target) = insn.branch_target(self.rom) {
                        self.record_branch(&insn, target, routine);
                        self.enqueue(target, state.clone(), routine);
                    }
                }
                _ => {}
            }

            addr = insn.next();
        }
    }

    /// Finish a block at an instruction that never falls through.
    fn end_block(&mut self, insn: &Instruction, state: RegisterState, routine: Address) {
        match insn.kind {
            OpKind::Return => self.handle_return(insn, state, routine),
            OpKind::Jump => self.handle_jump(insn, state, routine),
            OpKind::BranchAlways => {
                if let Some(target) = insn.branch_target(self.rom) {
                    self.record_branch(insn, target, routine);
                    self.enqueue(target, state, routine);
                }
            }
            _ => trace!(addr = %insn.addr, mnemonic = insn.mnemonic(), "halt"),
        }
    }

    fn handle_call(&mut self, insn: &Instruction, state: &mut RegisterState, routine: Address) {
        if let Some(mnemonic) = StackMnemonic::from_opcode(insn.opcode) {
            state.record_stack_op(insn.addr, mnemonic);
        }
        let Some(target) = insn.control_target(self.rom) else {
            trace!(addr = %insn.addr, mnemonic = insn.mnemonic(), "indirect call");
            return;
        };
        self.record_ref(CrossRef {
            from: insn.addr,
            to: target,
            kind: RefKind::Call,
            routine,
            tail_call: false,
        });
        // Widths survive the call; the callee starts a fresh stack history.
        self.enqueue(target, state.enter_routine(), target);
    }

    fn handle_jump(&mut self, insn: &Instruction, state: RegisterState, routine: Address) {
        let Some(target) = insn.control_target(self.rom) else {
            trace!(addr = %insn.addr, mnemonic = insn.mnemonic(), "unresolved jump");
            return;
        };
        let tail_call = self.call_graph.is_entry_point(target) || self.call_graph.is_call_target(target);
        self.record_ref(CrossRef {
            from: insn.addr,
            to: target,
            kind: RefKind::Jump,
            routine,
            tail_call,
        });
        self.enqueue(target, state, routine);
    }

    fn record_branch(&mut self, insn: &Instruction, target: Address, routine: Address) {
        self.record_ref(CrossRef {
            from: insn.addr,
            to: target,
            kind: RefKind::Branch,
            routine,
            tail_call: false,
        });
    }

    fn handle_return(&mut self, insn: &Instruction, mut state: RegisterState, routine: Address) {
        if let Some(mnemonic) = StackMnemonic::from_opcode(insn.opcode) {
            state.record_stack_op(insn.addr, mnemonic);
            if mnemonic == StackMnemonic::Rti {
                state.restore_flags();
            }
        }
        let label = self.label(insn.addr);
        self.diagnostics
            .extend(check_stack_balance(insn.addr, &label, &state));
        self.return_states
            .entry(routine)
            .or_default()
            .push((insn.addr, state));
    }

    fn report_mismatch(&mut self, addr: Address, existing: &RegisterState, incoming: &RegisterState) {
        if !self.mismatched.insert(addr) {
            return;
        }
        let issues: Vec<String> = existing
            .conflicts(incoming)
            .into_iter()
            .map(|flag| {
                format!(
                    "{flag} flag mismatch: expected {}, got {}",
                    existing.width(flag),
                    incoming.width(flag)
                )
            })
            .collect();
        let label = self.label(addr);
        self.diagnostics.push(
            Diagnostic::warning(
                DiagnosticKind::StateMismatch,
                addr,
                format!("State mismatch at {label}: {}", issues.join("; ")),
            )
            .with_context("expected", existing)
            .with_context("actual", incoming),
        );
    }
}
