// Symbols and Symbol Storage
//
// Symbols are addressed by SymbolId so identity comparison is O(1). The
// home-package link is a non-owning back-reference resolved through the
// registry.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Unique identifier for a symbol (index into the symbol table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

/// Unique identifier for a package (index into the registry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageId(pub u32);

const NO_PACKAGE: u32 = u32::MAX;

/// A symbol: an immutable name plus its current home package
#[derive(Debug)]
pub struct Symbol {
    name: Arc<str>,
    home: AtomicU32,
}

impl Symbol {
    pub fn new(name: &str, package: Option<PackageId>) -> Self {
        Self {
            name: Arc::from(name),
            home: AtomicU32::new(package.map_or(NO_PACKAGE, |p| p.0)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// The home package (None for uninterned symbols)
    pub fn home_package(&self) -> Option<PackageId> {
        match self.home.load(Ordering::Acquire) {
            NO_PACKAGE => None,
            id => Some(PackageId(id)),
        }
    }

    pub fn is_uninterned(&self) -> bool {
        self.home_package().is_none()
    }

    /// Claim `package` as home if the symbol has none. Returns true if claimed.
    pub(crate) fn claim_home(&self, package: PackageId) -> bool {
        self.home
            .compare_exchange(NO_PACKAGE, package.0, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Clear the home package, but only if it is still `package`.
    pub(crate) fn release_home(&self, package: PackageId) -> bool {
        self.home
            .compare_exchange(package.0, NO_PACKAGE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Append-only storage for every symbol the registry has allocated
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: RwLock<Vec<Arc<Symbol>>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh symbol
    pub fn alloc(&self, name: &str, package: Option<PackageId>) -> SymbolId {
        let mut symbols = self.symbols.write();
        let id = SymbolId(symbols.len() as u32);
        symbols.push(Arc::new(Symbol::new(name, package)));
        log::trace!("allocated symbol {} as {:?}", name, id);
        id
    }

    pub fn get(&self, id: SymbolId) -> Option<Arc<Symbol>> {
        self.symbols.read().get(id.0 as usize).cloned()
    }

    pub fn name(&self, id: SymbolId) -> Option<Arc<str>> {
        self.symbols.read().get(id.0 as usize).map(|s| s.shared_name())
    }

    pub fn home_package(&self, id: SymbolId) -> Option<PackageId> {
        self.symbols
            .read()
            .get(id.0 as usize)
            .and_then(|s| s.home_package())
    }

    /// Get the total number of symbols ever allocated
    pub fn len(&self) -> usize {
        self.symbols.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
