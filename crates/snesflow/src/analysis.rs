//! Analysis driver and report.

use std::path::Path;

use rustc_hash::FxHashMap;
use snesflow_cfg::{
    CallGraph, CrossRef, Diagnostic, DiagnosticKind, HookInfo, HookKind, Labels, RegisterState,
    ReturnStates, Severity, StateTracker, validate_contracts,
};
use snesflow_rom::{Address, RomImage, Vector};
use tracing::{debug, info_span};

use crate::{AnalysisConfig, Manifest, Result, find_jsl_hooks, load_symbols};

/// Addresses the tracker starts from before any hook: explicit entry points,
/// else the hardware vectors when enabled.
pub fn root_entry_points(rom: &RomImage, config: &AnalysisConfig) -> Vec<Address> {
    if !config.entry_points.is_empty() {
        return config.entry_points.clone();
    }
    if !config.seed_vectors {
        return Vec::new();
    }
    let mut roots = Vec::new();
    for addr in Vector::ALL.into_iter().filter_map(|v| rom.vector(v)) {
        if !roots.contains(&addr) {
            roots.push(addr);
        }
    }
    roots
}

/// Configured analysis of one ROM image.
pub struct Analyzer<'a> {
    rom: &'a RomImage,
    config: AnalysisConfig,
    labels: Labels,
    manifest: Option<Manifest>,
}

impl<'a> Analyzer<'a> {
    pub fn new(rom: &'a RomImage, config: AnalysisConfig) -> Self {
        Self {
            rom,
            config,
            labels: Labels::new(),
            manifest: None,
        }
    }

    #[must_use]
    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// Use declared hooks and contracts instead of JSL detection.
    #[must_use]
    pub fn with_manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Declare hooks directly.
    #[must_use]
    pub fn with_hooks(self, hooks: Vec<HookInfo>) -> Self {
        self.with_manifest(Manifest {
            hooks,
            ..Manifest::default()
        })
    }

    /// Run the analysis to completion.
    pub fn run(self) -> AnalysisReport {
        let _span = info_span!("analyze", rom_size = self.rom.len()).entered();
        let (hooks, critical) = match self.manifest {
            Some(manifest) => (manifest.hooks, manifest.critical),
            None if self.config.detect_hooks => (find_jsl_hooks(self.rom, &self.labels), Vec::new()),
            None => (Vec::new(), Vec::new()),
        };

        let mut tracker = StateTracker::new(self.rom).with_labels(&self.labels);
        for addr in root_entry_points(self.rom, &self.config) {
            tracker.analyze_from(addr, self.config.default_state.clone());
        }
        // Hooks already reached by traced code are judged by the contract
        // pass; seeding them again would only repeat the mismatch.
        for hook in hooks.iter().filter(|h| h.kind != HookKind::Data) {
            if tracker.state_at(hook.address).is_some() {
                continue;
            }
            let state = hook
                .expected_entry
                .clone()
                .unwrap_or_else(|| self.config.default_state.clone());
            tracker.analyze_from(hook.address, state);
        }
        let output = tracker.finish();

        let mut diagnostics = output.diagnostics.clone();
        let contracts: Vec<HookInfo> = hooks.iter().chain(&critical).cloned().collect();
        diagnostics.extend(validate_contracts(&contracts, &output));
        diagnostics.extend(structural_findings(&output.call_graph, &self.labels));

        debug!(
            hooks = hooks.len(),
            critical = critical.len(),
            diagnostics = diagnostics.len(),
            "analysis complete"
        );

        AnalysisReport {
            diagnostics,
            visited: output.visited,
            return_states: output.return_states,
            cross_refs: output.cross_refs,
            call_graph: output.call_graph,
            hooks,
            critical,
            labels: self.labels,
        }
    }
}

/// Recursion cycles as warnings, cross-bank transfers as info.
fn structural_findings(graph: &CallGraph, labels: &Labels) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for cycle in graph.find_cycles() {
        let members: Vec<String> = cycle.iter().map(|&a| labels.render(a)).collect();
        let path = members.join(" -> ");
        out.push(
            Diagnostic::warning(
                DiagnosticKind::Recursion,
                cycle[0],
                format!("Recursive call cycle: {path}"),
            )
            .with_context("routines", cycle.len()),
        );
    }
    for xref in graph.cross_bank_refs() {
        out.push(
            Diagnostic::info(
                DiagnosticKind::CrossBank,
                xref.from,
                format!(
                    "Cross-bank {} from {} to {}",
                    xref.kind,
                    labels.render(xref.from),
                    labels.render(xref.to)
                ),
            )
            .with_context("from_bank", format!("${:02X}", xref.from_bank()))
            .with_context("to_bank", format!("${:02X}", xref.to_bank())),
        );
    }
    out
}

/// Load a ROM with optional symbol and manifest files and analyze it.
pub fn analyze_file(
    rom_path: &Path,
    symbols: Option<&Path>,
    manifest: Option<&Path>,
    config: AnalysisConfig,
) -> Result<AnalysisReport> {
    let rom = RomImage::load(rom_path, config.mapping)?;
    let mut analyzer = Analyzer::new(&rom, config);
    if let Some(path) = symbols {
        analyzer = analyzer.with_labels(load_symbols(path)?);
    }
    if let Some(path) = manifest {
        analyzer = analyzer.with_manifest(Manifest::load(path)?);
    }
    Ok(analyzer.run())
}

/// Result of one analysis run.
#[derive(Clone, Debug, Default)]
pub struct AnalysisReport {
    pub diagnostics: Vec<Diagnostic>,
    pub visited: FxHashMap<Address, RegisterState>,
    pub return_states: ReturnStates,
    pub cross_refs: Vec<CrossRef>,
    pub call_graph: CallGraph,
    pub hooks: Vec<HookInfo>,
    pub critical: Vec<HookInfo>,
    pub labels: Labels,
}

impl AnalysisReport {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.with_severity(Severity::Warning)
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.severity == severity)
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    /// No error diagnostics.
    pub fn success(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn state_at(&self, addr: Address) -> Option<&RegisterState> {
        self.visited.get(&addr)
    }
}
