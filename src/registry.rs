// Package Registry
//
// The process-wide directory of packages. Every package name and nickname maps
// to exactly one PackageId; packages themselves live in an append-only vector so
// ids stay stable after deletion.
//
// Lock order: directory -> package vector. A package's mutation lock may be held
// while taking the directory, never the reverse.

use crate::conditions::{PackageError, PackageResult};
use crate::config::RegistryConfig;
use crate::counters::{AtomicCounters, PackageCounters};
use crate::fastmap::{HashMap, HashSet};
use crate::package::Package;
use crate::symbol::{PackageId, Symbol, SymbolId, SymbolTable};
use parking_lot::RwLock;
use std::sync::Arc;

pub const COMMON_LISP: &str = "COMMON-LISP";
pub const COMMON_LISP_USER: &str = "COMMON-LISP-USER";

#[derive(Debug)]
pub struct Registry {
    config: RegistryConfig,
    pub(crate) symbols: SymbolTable,
    packages: RwLock<Vec<Arc<Package>>>,
    /// Package name or nickname -> PackageId
    directory: RwLock<HashMap<String, PackageId>>,
    pub(crate) counters: AtomicCounters,
}

impl Registry {
    /// A registry holding the standard packages
    pub fn new() -> Self {
        Self::build(RegistryConfig::default())
    }

    /// Fails if the standard packages cannot all be created under `config`
    pub fn with_config(config: RegistryConfig) -> PackageResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: RegistryConfig) -> Self {
        let registry = Self {
            config,
            symbols: SymbolTable::new(),
            packages: RwLock::new(Vec::new()),
            directory: RwLock::new(HashMap::default()),
            counters: AtomicCounters::default(),
        };
        if registry.config.standard_packages {
            registry.create_standard_packages();
        }
        registry
    }

    /// KEYWORD, COMMON-LISP and COMMON-LISP-USER on an empty registry. The
    /// configuration has been validated, so no name can collide.
    fn create_standard_packages(&self) {
        let mut directory = self.directory.write();
        let mut packages = self.packages.write();
        let keyword = self.config.keyword_package.clone();
        self.insert_package(&mut directory, &mut packages, &keyword, &[]);
        let cl = self.insert_package(&mut directory, &mut packages, COMMON_LISP, &["CL"]);
        let cl_user =
            self.insert_package(&mut directory, &mut packages, COMMON_LISP_USER, &["CL-USER"]);
        cl_user.push_use(cl.id());
        cl.add_user(cl_user.id());
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Create a new package
    pub fn create_package(&self, name: &str, nicknames: &[&str]) -> PackageResult<PackageId> {
        let mut directory = self.directory.write();

        let mut requested = HashSet::default();
        for candidate in std::iter::once(name).chain(nicknames.iter().copied()) {
            if directory.contains_key(candidate) || !requested.insert(candidate) {
                return Err(self.reject(PackageError::already_exists(candidate)));
            }
        }

        let mut packages = self.packages.write();
        let package = self.insert_package(&mut directory, &mut packages, name, nicknames);
        Ok(package.id())
    }

    /// Register a package under names the caller has checked are free
    fn insert_package(
        &self,
        directory: &mut HashMap<String, PackageId>,
        packages: &mut Vec<Arc<Package>>,
        name: &str,
        nicknames: &[&str],
    ) -> Arc<Package> {
        let id = PackageId(packages.len() as u32);
        let package = Arc::new(Package::new(
            id,
            name,
            self.config.table_capacity,
            name == self.config.keyword_package,
        ));

        directory.insert(name.to_string(), id);
        for nick in nicknames {
            directory.insert(nick.to_string(), id);
            package.push_nickname(nick);
        }
        packages.push(Arc::clone(&package));

        log::debug!("created package {} as {:?}", name, id);
        package
    }

    /// Find a live package by name or nickname
    pub fn find_package(&self, name: &str) -> Option<PackageId> {
        self.counters.find_package();
        self.directory.read().get(name).copied()
    }

    /// Find a package as seen from `from`: its local nicknames win over global names
    pub fn find_package_from(&self, from: PackageId, name: &str) -> Option<PackageId> {
        let local = self
            .get_package(from)
            .and_then(|package| package.local_nickname(name));
        match local {
            Some(target) => {
                self.counters.find_package();
                Some(target)
            }
            None => self.find_package(name),
        }
    }

    /// Get a package by id, deleted or not
    pub fn get_package(&self, id: PackageId) -> Option<Arc<Package>> {
        self.packages.read().get(id.0 as usize).cloned()
    }

    /// Get a live package by id
    pub fn package(&self, id: PackageId) -> PackageResult<Arc<Package>> {
        match self.get_package(id) {
            Some(package) if !package.is_deleted() => Ok(package),
            Some(package) => Err(PackageError::unknown_package(&package.name()).with_package(id)),
            None => Err(PackageError::unknown_package(&format!("#<package {}>", id.0))),
        }
    }

    /// The package's primary name, None once deleted
    pub fn package_name(&self, id: PackageId) -> Option<String> {
        self.package(id).ok().map(|package| package.name())
    }

    pub fn package_nicknames(&self, id: PackageId) -> Vec<String> {
        self.package(id)
            .map(|package| package.nicknames())
            .unwrap_or_default()
    }

    /// Snapshot of all live packages
    pub fn list_all_packages(&self) -> Vec<PackageId> {
        self.live_packages().iter().map(|p| p.id()).collect()
    }

    pub(crate) fn live_packages(&self) -> Vec<Arc<Package>> {
        self.packages
            .read()
            .iter()
            .filter(|p| !p.is_deleted())
            .cloned()
            .collect()
    }

    pub fn package_count(&self) -> usize {
        self.live_packages().len()
    }

    /// Add a global nickname (most recent first)
    pub fn add_nickname(&self, id: PackageId, nickname: &str) -> PackageResult<()> {
        let package = self.package(id)?;
        let _guard = package.lock();
        package.check_live()?;

        let mut directory = self.directory.write();
        match directory.get(nickname) {
            Some(&owner) if owner == id => return Ok(()),
            Some(_) => return Err(self.reject(PackageError::already_exists(nickname))),
            None => {}
        }
        directory.insert(nickname.to_string(), id);
        package.push_nickname(nickname);
        log::debug!("package {} nicknamed {}", package.name(), nickname);
        Ok(())
    }

    /// Make `nickname` name `target` when looked up from `id` only
    pub fn add_local_nickname(
        &self,
        id: PackageId,
        nickname: &str,
        target: PackageId,
    ) -> PackageResult<()> {
        let package = self.package(id)?;
        let target_package = self.package(target)?;
        let _guard = package.lock();
        package.check_live()?;

        if let Some(existing) = package.local_nickname(nickname) {
            if existing != target {
                let other = self
                    .package_name(existing)
                    .unwrap_or_else(|| format!("#<package {}>", existing.0));
                return Err(self.reject(PackageError::name_conflict(
                    id,
                    format!(
                        "{} is already a local nickname for {} in package {}.",
                        nickname,
                        other,
                        package.name()
                    ),
                )));
            }
        }
        package.set_local_nickname(nickname, target);
        log::debug!(
            "package {} locally nicknames {} as {}",
            package.name(),
            target_package.name(),
            nickname
        );
        Ok(())
    }

    pub fn remove_local_nickname(&self, id: PackageId, nickname: &str) -> PackageResult<bool> {
        let package = self.package(id)?;
        let _guard = package.lock();
        package.check_live()?;
        Ok(package.remove_local_nickname(nickname))
    }

    pub fn local_nicknames(&self, id: PackageId) -> Vec<(String, PackageId)> {
        self.package(id)
            .map(|package| package.local_nicknames())
            .unwrap_or_default()
    }

    /// All live packages holding a local nickname for `target`
    pub fn packages_nicknaming(&self, target: PackageId) -> Vec<PackageId> {
        self.live_packages()
            .iter()
            .filter(|p| p.local_nicknames().iter().any(|(_, t)| *t == target))
            .map(|p| p.id())
            .collect()
    }

    /// Delete a package. Returns false if it was already deleted.
    pub fn delete_package(&self, id: PackageId) -> bool {
        let Some(package) = self.get_package(id) else {
            return false;
        };
        let _guard = package.lock();
        if package.is_deleted() {
            return false;
        }

        self.unlink_all(&package);
        {
            let mut directory = self.directory.write();
            self.release_names(&package, &mut directory);
        }
        package.set_deleted(true);

        for other in self.live_packages() {
            other.remove_local_nicknames_for(id);
        }

        log::debug!("deleted package {} ({:?})", package.name(), id);
        true
    }

    /// Rename a package. The old identity is dropped first: the package keeps
    /// its symbols but loses its use/used-by edges and old nicknames. A deleted
    /// package is revived.
    pub fn rename_package(
        &self,
        id: PackageId,
        new_name: &str,
        new_nicknames: &[&str],
    ) -> PackageResult<()> {
        let package = self
            .get_package(id)
            .ok_or_else(|| PackageError::unknown_package(&format!("#<package {}>", id.0)))?;
        let _guard = package.lock();
        let mut directory = self.directory.write();

        let old_name = package.name();
        if let Some(&owner) = directory.get(new_name) {
            if owner != id {
                return Err(self.reject(PackageError::name_conflict(
                    id,
                    format!(
                        "Cannot rename package {} to {} as it is already a package.",
                        old_name, new_name
                    ),
                )));
            }
        }
        let mut requested = HashSet::default();
        requested.insert(new_name);
        for &nick in new_nicknames {
            let taken = matches!(directory.get(nick), Some(&owner) if owner != id);
            if taken || !requested.insert(nick) {
                return Err(self.reject(PackageError::already_exists(nick)));
            }
        }

        if !package.is_deleted() {
            self.release_names(&package, &mut directory);
            self.unlink_all(&package);
        }

        package.set_name(new_name);
        directory.insert(new_name.to_string(), id);
        for nick in new_nicknames {
            directory.insert(nick.to_string(), id);
            package.push_nickname(nick);
        }
        package.set_deleted(false);

        log::debug!("renamed package {} to {}", old_name, new_name);
        Ok(())
    }

    fn release_names(&self, package: &Package, directory: &mut HashMap<String, PackageId>) {
        let id = package.id();
        let name = package.name();
        if directory.get(&name) == Some(&id) {
            directory.remove(&name);
        }
        for nick in package.take_nicknames() {
            if directory.get(&nick) == Some(&id) {
                directory.remove(&nick);
            }
        }
    }

    /// Drop every use and used-by edge touching `package`
    fn unlink_all(&self, package: &Package) {
        for used in package.use_list() {
            self.unlink_use(package, used);
        }
        for user in package.used_by() {
            match self.get_package(user) {
                Some(user_package) => {
                    self.unlink_use(&user_package, package.id());
                }
                None => package.remove_user(user),
            }
        }
    }

    // ---- symbols ---------------------------------------------------------

    /// Create an uninterned symbol
    pub fn make_symbol(&self, name: &str) -> SymbolId {
        self.symbols.alloc(name, None)
    }

    pub fn symbol(&self, id: SymbolId) -> Option<Arc<Symbol>> {
        self.symbols.get(id)
    }

    pub fn symbol_name(&self, id: SymbolId) -> Option<Arc<str>> {
        self.symbols.name(id)
    }

    /// Get the home package of a symbol. A deleted home reads as None until
    /// the package is revived by a rename.
    pub fn symbol_package(&self, id: SymbolId) -> Option<PackageId> {
        self.symbols
            .home_package(id)
            .filter(|&home| self.get_package(home).is_some_and(|p| !p.is_deleted()))
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub(crate) fn symbol_ref(&self, package: PackageId, id: SymbolId) -> PackageResult<Arc<Symbol>> {
        self.symbols.get(id).ok_or_else(|| {
            PackageError::not_accessible(package, format!("#<symbol {}> is not a symbol.", id.0))
                .with_symbols(&[id])
        })
    }

    // ---- bookkeeping -----------------------------------------------------

    pub fn counters(&self) -> PackageCounters {
        self.counters.snapshot()
    }

    pub fn reset_counters(&self) {
        self.counters.reset();
    }

    /// Count and log a rejected operation
    pub(crate) fn reject(&self, err: PackageError) -> PackageError {
        self.counters.conflict();
        log::debug!("{}: {}", err.kind(), err);
        err
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
