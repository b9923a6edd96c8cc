//! Address to label mapping used when rendering diagnostics.

use rustc_hash::FxHashMap;
use snesflow_rom::Address;

/// Symbol names keyed by address.
#[derive(Clone, Debug, Default)]
pub struct Labels {
    names: FxHashMap<Address, String>,
}

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a label; a later name for the same address wins.
    pub fn insert(&mut self, addr: Address, name: impl Into<String>) {
        self.names.insert(addr, name.into());
    }

    pub fn get(&self, addr: Address) -> Option<&str> {
        self.names.get(&addr).map(String::as_str)
    }

    pub fn contains(&self, addr: Address) -> bool {
        self.names.contains_key(&addr)
    }

    /// Label name, or the hex address when unlabeled.
    pub fn render(&self, addr: Address) -> String {
        self.get(addr)
            .map_or_else(|| addr.to_string(), ToString::to_string)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Address, &str)> {
        self.names.iter().map(|(&addr, name)| (addr, name.as_str()))
    }
}

impl<S: Into<String>> FromIterator<(Address, S)> for Labels {
    fn from_iter<I: IntoIterator<Item = (Address, S)>>(iter: I) -> Self {
        let mut labels = Self::new();
        for (addr, name) in iter {
            labels.insert(addr, name);
        }
        labels
    }
}
