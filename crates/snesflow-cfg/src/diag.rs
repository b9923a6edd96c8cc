//! Diagnostics produced by the analysis passes.

use std::collections::BTreeMap;
use std::fmt;

use snesflow_rom::Address;

/// Diagnostic severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a diagnostic is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Two paths reach one address with contradictory widths.
    StateMismatch,
    /// Nonzero net local stack movement at a return.
    StackImbalance,
    /// Push/pull counts of one register pair differ at a return.
    UnbalancedPair,
    /// Actual width differs from a hook's declared contract.
    ContractViolation,
    /// Width unknown at a hook boundary.
    UnknownWidth,
    /// Declared entry point or hook never visited.
    UnreachedEntry,
    /// Exit contract declared but no return was traced.
    MissingReturnState,
    /// Routines that call each other in a cycle.
    Recursion,
    /// Call or jump into another bank.
    CrossBank,
    /// Hook entry width differs between two builds.
    StateDrift,
}

/// `file:line` position in assembly source.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl SourceLocation {
    /// Parse `file:line`; the line number follows the last colon.
    pub fn parse(s: &str) -> Option<Self> {
        let (file, line) = s.rsplit_once(':')?;
        if file.is_empty() {
            return None;
        }
        Some(Self {
            file: file.to_string(),
            line: line.trim().parse().ok()?,
        })
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One analysis finding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub address: Address,
    pub source: Option<SourceLocation>,
    /// Free-form rendering context, sorted by key.
    pub context: BTreeMap<String, String>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        kind: DiagnosticKind,
        address: Address,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            address,
            source: None,
            context: BTreeMap::new(),
        }
    }

    pub fn error(kind: DiagnosticKind, address: Address, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, kind, address, message)
    }

    pub fn warning(kind: DiagnosticKind, address: Address, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, kind, address, message)
    }

    pub fn info(kind: DiagnosticKind, address: Address, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, kind, address, message)
    }

    #[must_use]
    pub fn with_context(mut self, key: &str, value: impl ToString) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: Option<SourceLocation>) -> Self {
        self.source = source;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.address, self.message)?;
        if let Some(source) = &self.source {
            write!(f, " ({source})")?;
        }
        Ok(())
    }
}
