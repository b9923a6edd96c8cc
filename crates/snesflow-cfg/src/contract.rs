//! Hook boundary contracts and their validation against a finished run.

use std::fmt;

use snesflow_isa::WidthFlag;
use snesflow_rom::Address;

use crate::{Diagnostic, DiagnosticKind, RefKind, RegisterState, SourceLocation, TrackerOutput};

/// How a hook is entered.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum HookKind {
    #[default]
    Jsl,
    Jsr,
    Jml,
    Jmp,
    Patch,
    /// Data, not code; never validated.
    Data,
    Other(String),
}

impl HookKind {
    /// Parse a manifest kind string (case-insensitive).
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "jsl" => Self::Jsl,
            "jsr" => Self::Jsr,
            "jml" => Self::Jml,
            "jmp" => Self::Jmp,
            "patch" => Self::Patch,
            "data" => Self::Data,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Jsl => "jsl",
            Self::Jsr => "jsr",
            Self::Jml => "jml",
            Self::Jmp => "jmp",
            Self::Patch => "patch",
            Self::Data => "data",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Externally declared address with an optional width contract.
///
/// Flags left `Unknown` in an expected state are unconstrained.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HookInfo {
    pub name: String,
    pub address: Address,
    pub kind: HookKind,
    pub expected_entry: Option<RegisterState>,
    pub expected_exit: Option<RegisterState>,
    pub skip_validation: bool,
    pub source: Option<SourceLocation>,
}

impl HookInfo {
    pub fn new(name: impl Into<String>, address: Address, kind: HookKind) -> Self {
        Self {
            name: name.into(),
            address,
            kind,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_entry(mut self, state: RegisterState) -> Self {
        self.expected_entry = Some(state);
        self
    }

    #[must_use]
    pub fn with_exit(mut self, state: RegisterState) -> Self {
        self.expected_exit = Some(state);
        self
    }

    /// Whether the contract pass looks at this hook.
    pub fn is_validated(&self) -> bool {
        !self.skip_validation && self.kind != HookKind::Data
    }
}

/// Compare a finished run against hook contracts.
///
/// Entry mismatches are reported at each call or jump site whose traced
/// state reaches the hook; a hook only entered as a seed is checked at its
/// own address. Exit mismatches are reported at each traced return.
pub fn validate_contracts(hooks: &[HookInfo], output: &TrackerOutput) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for hook in hooks.iter().filter(|h| h.is_validated()) {
        validate_hook(hook, output, &mut diagnostics);
    }
    diagnostics
}

fn validate_hook(hook: &HookInfo, output: &TrackerOutput, out: &mut Vec<Diagnostic>) {
    let name = &hook.name;
    let Some(actual) = output.visited.get(&hook.address) else {
        // Unvisited entry points are already reported by the tracker.
        if !output.call_graph.is_entry_point(hook.address) {
            out.push(
                Diagnostic::warning(
                    DiagnosticKind::UnreachedEntry,
                    hook.address,
                    format!(
                        "Hook '{name}' at {} was not reached during analysis",
                        hook.address
                    ),
                )
                .with_source(hook.source.clone()),
            );
        }
        return;
    };

    if let Some(expected) = &hook.expected_entry {
        let mut sites: Vec<(Address, &RegisterState)> = output
            .call_graph
            .callers(hook.address)
            .iter()
            .filter(|r| matches!(r.kind, RefKind::Call | RefKind::Jump))
            .filter_map(|r| output.visited.get(&r.from).map(|s| (r.from, s)))
            .collect();
        sites.sort_by_key(|&(addr, _)| addr);
        sites.dedup_by_key(|&mut (addr, _)| addr);
        if sites.is_empty() {
            sites.push((hook.address, actual));
        }
        for (site, state) in sites {
            if let Some(issues) = describe_conflicts(expected, state) {
                out.push(
                    Diagnostic::error(
                        DiagnosticKind::ContractViolation,
                        site,
                        format!("Hook '{name}' entry state mismatch: {issues}"),
                    )
                    .with_context("hook", hook.address)
                    .with_context("expected", expected)
                    .with_context("actual", state)
                    .with_source(hook.source.clone()),
                );
            }
        }
    }

    for flag in WidthFlag::BOTH {
        if !actual.width(flag).is_known() {
            out.push(
                Diagnostic::warning(
                    DiagnosticKind::UnknownWidth,
                    hook.address,
                    format!("Hook '{name}': {flag} flag unknown at entry - may cause width mismatch"),
                )
                .with_context("entry_state", actual)
                .with_source(hook.source.clone()),
            );
        }
    }

    if let Some(expected) = &hook.expected_exit {
        validate_exit(hook, expected, output, out);
    }
}

fn validate_exit(
    hook: &HookInfo,
    expected: &RegisterState,
    output: &TrackerOutput,
    out: &mut Vec<Diagnostic>,
) {
    let name = &hook.name;
    let returns = output
        .return_states
        .get(&hook.address)
        .map_or(&[][..], Vec::as_slice);
    if returns.is_empty() {
        out.push(
            Diagnostic::warning(
                DiagnosticKind::MissingReturnState,
                hook.address,
                format!("Hook '{name}' has no recorded return states for exit check"),
            )
            .with_source(hook.source.clone()),
        );
        return;
    }

    for (ret, state) in returns {
        if let Some(issues) = describe_conflicts(expected, state) {
            out.push(
                Diagnostic::error(
                    DiagnosticKind::ContractViolation,
                    *ret,
                    format!("Hook '{name}' exit state mismatch at {ret}: {issues}"),
                )
                .with_context("hook", hook.address)
                .with_context("expected", expected)
                .with_context("actual", state)
                .with_source(hook.source.clone()),
            );
        }
        for flag in WidthFlag::BOTH {
            if expected.width(flag).is_known() && !state.width(flag).is_known() {
                out.push(
                    Diagnostic::warning(
                        DiagnosticKind::UnknownWidth,
                        *ret,
                        format!("Hook '{name}': {flag} flag unknown at exit {ret}"),
                    )
                    .with_context("exit_state", state)
                    .with_source(hook.source.clone()),
                );
            }
        }
    }
}

/// "X flag: expected 16-bit, got 8-bit" for each contradicted flag.
fn describe_conflicts(expected: &RegisterState, actual: &RegisterState) -> Option<String> {
    let conflicts = expected.conflicts(actual);
    if conflicts.is_empty() {
        return None;
    }
    let parts: Vec<String> = conflicts
        .into_iter()
        .map(|flag| {
            format!(
                "{flag} flag: expected {}, got {}",
                expected.width(flag),
                actual.width(flag)
            )
        })
        .collect();
    Some(parts.join("; "))
}
