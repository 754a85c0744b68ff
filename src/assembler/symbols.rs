//! Label name to address mapping, filled in by the layout pass.
use std::collections::btree_map::{self, BTreeMap};

#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct SymbolTable {
    labels: BTreeMap<String, u16>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable { labels: BTreeMap::new() }
    }

    /// Binds `name` to `addr`. A second definition of the same name replaces
    /// the first; the previous address is returned.
    pub fn define(&mut self, name: &str, addr: u16) -> Option<u16> {
        self.labels.insert(name.to_string(), addr)
    }

    pub fn get(&self, name: &str) -> Option<u16> {
        self.labels.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<String, u16> {
        self.labels.iter()
    }
}
