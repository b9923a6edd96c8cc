//! Stack balance check at routine returns.

use snesflow_isa::StackMnemonic;
use snesflow_rom::Address;

use crate::{Diagnostic, DiagnosticKind, RegisterState};

/// Local operations listed in an imbalance report.
const CONTEXT_OPS: usize = 10;

/// Check the local stack history of `state` at the return at `addr`.
///
/// Calls and returns are excluded. Reports a nonzero net delta, and
/// independently every push/pull pair whose counts differ.
pub fn check_stack_balance(addr: Address, label: &str, state: &RegisterState) -> Vec<Diagnostic> {
    let local: Vec<_> = state.local_ops().collect();
    if local.is_empty() {
        return Vec::new();
    }

    let mut diagnostics = Vec::new();
    let balance: i32 = local.iter().map(|op| op.delta).sum();
    if balance != 0 {
        let recent: Vec<String> = local
            .iter()
            .skip(local.len().saturating_sub(CONTEXT_OPS))
            .map(ToString::to_string)
            .collect();
        diagnostics.push(
            Diagnostic::warning(
                DiagnosticKind::StackImbalance,
                addr,
                format!("Stack imbalance at return {label}: depth={balance}"),
            )
            .with_context("balance", balance)
            .with_context("operations", recent.join(", ")),
        );
    }

    let count = |mnemonic: StackMnemonic| local.iter().filter(|op| op.mnemonic == mnemonic).count();
    for (push, pull) in StackMnemonic::PAIRS {
        let (pushes, pulls) = (count(push), count(pull));
        if pushes != pulls {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::UnbalancedPair,
                    addr,
                    format!(
                        "Unbalanced {push}/{pull} at return {label}: pushes={pushes}, pulls={pulls}"
                    ),
                )
                .with_context("pair", format!("{push}/{pull}"))
                .with_context("pushes", pushes)
                .with_context("pulls", pulls),
            );
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Width;

    fn state_with(ops: &[StackMnemonic], m: Width) -> RegisterState {
        let mut state = RegisterState::new(m, Width::Bits8);
        let mut addr = Address::new(0x02_8000);
        for &op in ops {
            state.record_stack_op(addr, op);
            addr = addr.advance(1);
        }
        state
    }

    #[test]
    fn test_balanced() {
        use StackMnemonic::{Jsl, Pha, Php, Pla, Plp};
        let state = state_with(&[Php, Pha, Jsl, Pla, Plp], Width::Bits16);
        assert!(check_stack_balance(Address::new(0x02_8010), "r", &state).is_empty());
    }

    #[test]
    fn test_missing_pull() {
        let state = state_with(&[StackMnemonic::Php], Width::Bits8);
        let diags = check_stack_balance(Address::new(0x02_8006), "$028006", &state);
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].kind, DiagnosticKind::StackImbalance);
        assert_eq!(diags[0].context["balance"], "1");
        assert_eq!(diags[1].kind, DiagnosticKind::UnbalancedPair);
        assert_eq!(diags[1].context["pair"], "PHP/PLP");
    }

    #[test]
    fn test_compensating_wrong_pair() {
        use StackMnemonic::{Pha, Plx};
        let state = state_with(&[Pha, Plx], Width::Bits8);
        let diags = check_stack_balance(Address::new(0x02_8006), "r", &state);
        assert!(diags.iter().all(|d| d.kind == DiagnosticKind::UnbalancedPair));
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn test_width_mismatch_pull() {
        use StackMnemonic::{Pha, Pla};
        let mut state = state_with(&[Pha], Width::Bits16);
        state.m = Width::Bits8;
        state.record_stack_op(Address::new(0x02_8001), Pla);
        let diags = check_stack_balance(Address::new(0x02_8002), "r", &state);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].context["balance"], "1");
    }
}
