//! Analysis configuration.

use snesflow_cfg::RegisterState;
use snesflow_rom::{Address, Mapping};

/// Analysis configuration.
#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    /// Cartridge mapping used when loading ROM files.
    pub mapping: Mapping,
    /// State assumed at entry points and at hooks without an entry contract.
    pub default_state: RegisterState,
    /// Explicit entry points, each analyzed as its own routine.
    pub entry_points: Vec<Address>,
    /// Seed from the reset/NMI/IRQ vectors when no entry points are given.
    pub seed_vectors: bool,
    /// Derive hooks from labeled JSL targets when no manifest is given.
    pub detect_hooks: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mapping: Mapping::LoRom,
            default_state: RegisterState::native8(),
            entry_points: Vec::new(),
            seed_vectors: true,
            detect_hooks: true,
        }
    }
}

impl AnalysisConfig {
    pub fn new(mapping: Mapping) -> Self {
        Self {
            mapping,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_entry_point(mut self, addr: Address) -> Self {
        self.entry_points.push(addr);
        self
    }

    #[must_use]
    pub fn with_entry_points(mut self, addrs: impl IntoIterator<Item = Address>) -> Self {
        self.entry_points.extend(addrs);
        self
    }

    #[must_use]
    pub fn with_default_state(mut self, state: RegisterState) -> Self {
        self.default_state = state;
        self
    }

    #[must_use]
    pub fn with_vector_seeding(mut self, enabled: bool) -> Self {
        self.seed_vectors = enabled;
        self
    }

    #[must_use]
    pub fn with_hook_detection(mut self, enabled: bool) -> Self {
        self.detect_hooks = enabled;
        self
    }
}
