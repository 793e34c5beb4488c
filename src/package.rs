// Package Entity
//
// A package owns two disjoint name -> symbol tables (internal and external),
// an optional shadow-set, its use / used-by edges and its nicknames.
//
// Readers go straight to the concurrent tables. Writers serialize on the
// per-package mutation lock (`lock`), which the registry takes for the full
// duration of every mutating operation.

use crate::conditions::{PackageError, PackageResult};
use crate::fastmap::{self, ConcurrentMap, HashMap};
use crate::symbol::{PackageId, SymbolId};
use parking_lot::{Mutex, MutexGuard, RwLock};
use smallvec::SmallVec;
use std::sync::atomic::{AtomicBool, Ordering};

/// How a name resolves in a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locality {
    External,
    Internal,
    Inherited,
}

impl Locality {
    /// The keyword a Lisp caller sees as the second value of FIND-SYMBOL
    pub fn keyword(self) -> &'static str {
        match self {
            Locality::External => ":EXTERNAL",
            Locality::Internal => ":INTERNAL",
            Locality::Inherited => ":INHERITED",
        }
    }

    /// Present means stored in the package's own tables
    pub fn is_present(self) -> bool {
        !matches!(self, Locality::Inherited)
    }
}

/// A successful lookup: the symbol and how it was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoundSymbol {
    pub symbol: SymbolId,
    pub locality: Locality,
}

pub type UseList = SmallVec<[PackageId; 4]>;

#[derive(Debug)]
pub struct Package {
    id: PackageId,
    name: RwLock<String>,
    /// Most recent first
    nicknames: RwLock<Vec<String>>,
    internal: ConcurrentMap<String, SymbolId>,
    external: ConcurrentMap<String, SymbolId>,
    shadowing: RwLock<HashMap<String, SymbolId>>,
    use_list: RwLock<UseList>,
    used_by: RwLock<Vec<PackageId>>,
    local_nicknames: RwLock<HashMap<String, PackageId>>,
    /// Symbols interned here are exported immediately (the keyword package)
    auto_export: bool,
    deleted: AtomicBool,
    lock: Mutex<()>,
}

impl Package {
    pub(crate) fn new(id: PackageId, name: &str, capacity: usize, auto_export: bool) -> Self {
        Self {
            id,
            name: RwLock::new(name.to_string()),
            nicknames: RwLock::new(Vec::new()),
            internal: fastmap::concurrent_map(capacity),
            external: fastmap::concurrent_map(capacity),
            shadowing: RwLock::new(HashMap::default()),
            use_list: RwLock::new(UseList::new()),
            used_by: RwLock::new(Vec::new()),
            local_nicknames: RwLock::new(HashMap::default()),
            auto_export,
            deleted: AtomicBool::new(false),
            lock: Mutex::new(()),
        }
    }

    pub fn id(&self) -> PackageId {
        self.id
    }

    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    pub fn nicknames(&self) -> Vec<String> {
        self.nicknames.read().clone()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::Acquire)
    }

    pub fn auto_exports(&self) -> bool {
        self.auto_export
    }

    // ---- lock-free reads -------------------------------------------------

    pub fn find_external(&self, name: &str) -> Option<SymbolId> {
        if self.is_deleted() {
            return None;
        }
        self.external.get(name).map(|entry| *entry.value())
    }

    pub fn find_internal(&self, name: &str) -> Option<SymbolId> {
        if self.is_deleted() {
            return None;
        }
        self.internal.get(name).map(|entry| *entry.value())
    }

    /// Look only at the package's own tables, external first
    pub fn find_present(&self, name: &str) -> Option<FoundSymbol> {
        if let Some(symbol) = self.find_external(name) {
            return Some(FoundSymbol {
                symbol,
                locality: Locality::External,
            });
        }
        self.find_internal(name).map(|symbol| FoundSymbol {
            symbol,
            locality: Locality::Internal,
        })
    }

    pub fn shadowing_symbol(&self, name: &str) -> Option<SymbolId> {
        self.shadowing.read().get(name).copied()
    }

    pub fn is_shadowing(&self, name: &str) -> bool {
        self.shadowing.read().contains_key(name)
    }

    pub fn uses(&self, other: PackageId) -> bool {
        self.use_list.read().contains(&other)
    }

    /// Snapshot of the use-list, in precedence order
    pub fn use_list(&self) -> UseList {
        self.use_list.read().clone()
    }

    pub fn used_by(&self) -> Vec<PackageId> {
        self.used_by.read().clone()
    }

    pub fn external_entries(&self) -> Vec<(String, SymbolId)> {
        if self.is_deleted() {
            return Vec::new();
        }
        self.external
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    pub fn internal_entries(&self) -> Vec<(String, SymbolId)> {
        if self.is_deleted() {
            return Vec::new();
        }
        self.internal
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    pub fn shadowing_entries(&self) -> Vec<(String, SymbolId)> {
        self.shadowing
            .read()
            .iter()
            .map(|(name, sym)| (name.clone(), *sym))
            .collect()
    }

    pub fn local_nickname(&self, nickname: &str) -> Option<PackageId> {
        self.local_nicknames.read().get(nickname).copied()
    }

    pub fn local_nicknames(&self) -> Vec<(String, PackageId)> {
        self.local_nicknames
            .read()
            .iter()
            .map(|(nick, pkg)| (nick.clone(), *pkg))
            .collect()
    }

    pub fn external_count(&self) -> usize {
        self.external.len()
    }

    pub fn internal_count(&self) -> usize {
        self.internal.len()
    }

    // ---- mutation (callers hold `lock`) -----------------------------------

    /// Enter the exclusive mutation section
    pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock()
    }

    /// Lock two packages in id order; a package paired with itself is locked once
    pub(crate) fn lock_pair<'a>(
        first: &'a Package,
        second: &'a Package,
    ) -> (MutexGuard<'a, ()>, Option<MutexGuard<'a, ()>>) {
        if first.id == second.id {
            (first.lock(), None)
        } else if first.id < second.id {
            let guard = first.lock();
            (guard, Some(second.lock()))
        } else {
            let guard = second.lock();
            (guard, Some(first.lock()))
        }
    }

    pub(crate) fn check_live(&self) -> PackageResult<()> {
        if self.is_deleted() {
            Err(PackageError::unknown_package(&self.name()).with_package(self.id))
        } else {
            Ok(())
        }
    }

    pub(crate) fn set_deleted(&self, deleted: bool) {
        self.deleted.store(deleted, Ordering::Release);
    }

    pub(crate) fn set_name(&self, name: &str) {
        *self.name.write() = name.to_string();
    }

    pub(crate) fn push_nickname(&self, nickname: &str) {
        self.nicknames.write().insert(0, nickname.to_string());
    }

    pub(crate) fn take_nicknames(&self) -> Vec<String> {
        std::mem::take(&mut *self.nicknames.write())
    }

    pub(crate) fn put_internal(&self, name: &str, symbol: SymbolId) {
        self.internal.insert(name.to_string(), symbol);
    }

    pub(crate) fn put_external(&self, name: &str, symbol: SymbolId) {
        self.external.insert(name.to_string(), symbol);
    }

    /// Move `name` from the internal table to the external one. The external
    /// entry lands first so concurrent readers never see the name vanish.
    pub(crate) fn promote(&self, name: &str, symbol: SymbolId) {
        self.external.insert(name.to_string(), symbol);
        self.internal.remove(name);
    }

    pub(crate) fn demote(&self, name: &str, symbol: SymbolId) {
        self.internal.insert(name.to_string(), symbol);
        self.external.remove(name);
    }

    /// Remove `name` from both tables and the shadow-set
    pub(crate) fn remove_name(&self, name: &str) {
        self.internal.remove(name);
        self.external.remove(name);
        self.shadowing.write().remove(name);
    }

    pub(crate) fn add_shadowing(&self, name: &str, symbol: SymbolId) {
        self.shadowing.write().insert(name.to_string(), symbol);
    }

    pub(crate) fn push_use(&self, other: PackageId) {
        let mut use_list = self.use_list.write();
        if !use_list.contains(&other) {
            use_list.push(other);
        }
    }

    pub(crate) fn remove_use(&self, other: PackageId) -> bool {
        let mut use_list = self.use_list.write();
        let before = use_list.len();
        use_list.retain(|p| *p != other);
        use_list.len() != before
    }

    pub(crate) fn add_user(&self, user: PackageId) {
        let mut used_by = self.used_by.write();
        if !used_by.contains(&user) {
            used_by.push(user);
        }
    }

    pub(crate) fn remove_user(&self, user: PackageId) {
        self.used_by.write().retain(|p| *p != user);
    }

    pub(crate) fn set_local_nickname(&self, nickname: &str, target: PackageId) {
        self.local_nicknames
            .write()
            .insert(nickname.to_string(), target);
    }

    pub(crate) fn remove_local_nickname(&self, nickname: &str) -> bool {
        self.local_nicknames.write().remove(nickname).is_some()
    }

    pub(crate) fn remove_local_nicknames_for(&self, target: PackageId) {
        self.local_nicknames.write().retain(|_, p| *p != target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package() -> Package {
        Package::new(PackageId(0), "TEST", 16, false)
    }

    #[test]
    fn test_promote_and_demote_keep_tables_disjoint() {
        let pkg = package();
        pkg.put_internal("X", SymbolId(1));
        assert_eq!(
            pkg.find_present("X"),
            Some(FoundSymbol { symbol: SymbolId(1), locality: Locality::Internal })
        );

        pkg.promote("X", SymbolId(1));
        assert_eq!(pkg.find_internal("X"), None);
        assert_eq!(pkg.find_external("X"), Some(SymbolId(1)));

        pkg.demote("X", SymbolId(1));
        assert_eq!(pkg.find_external("X"), None);
        assert_eq!(pkg.find_internal("X"), Some(SymbolId(1)));
    }

    #[test]
    fn test_remove_name_clears_shadowing() {
        let pkg = package();
        pkg.put_internal("Y", SymbolId(2));
        pkg.add_shadowing("Y", SymbolId(2));
        assert!(pkg.is_shadowing("Y"));
        pkg.remove_name("Y");
        assert!(!pkg.is_shadowing("Y"));
        assert!(pkg.find_present("Y").is_none());
    }

    #[test]
    fn test_use_list_has_no_duplicates() {
        let pkg = package();
        pkg.push_use(PackageId(3));
        pkg.push_use(PackageId(4));
        pkg.push_use(PackageId(3));
        assert_eq!(pkg.use_list().as_slice(), &[PackageId(3), PackageId(4)]);
        assert!(pkg.remove_use(PackageId(3)));
        assert!(!pkg.remove_use(PackageId(3)));
        assert!(!pkg.uses(PackageId(3)));
    }

    #[test]
    fn test_deleted_package_yields_nothing() {
        let pkg = package();
        pkg.put_external("Z", SymbolId(5));
        pkg.set_deleted(true);
        assert!(pkg.find_external("Z").is_none());
        assert!(pkg.external_entries().is_empty());
        assert!(pkg.check_live().is_err());
    }

    #[test]
    fn test_nicknames_most_recent_first() {
        let pkg = package();
        pkg.push_nickname("A");
        pkg.push_nickname("B");
        assert_eq!(pkg.nicknames(), vec!["B".to_string(), "A".to_string()]);
        assert_eq!(pkg.take_nicknames().len(), 2);
        assert!(pkg.nicknames().is_empty());
    }

    #[test]
    fn test_locality_keywords() {
        assert_eq!(Locality::External.keyword(), ":EXTERNAL");
        assert!(Locality::Internal.is_present());
        assert!(!Locality::Inherited.is_present());
    }
}
