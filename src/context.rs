use crate::conditions::{PackageError, PackageResult};
use crate::config::RegistryConfig;
use crate::package::FoundSymbol;
use crate::registry::{Registry, COMMON_LISP_USER};
use crate::symbol::{PackageId, SymbolId};
use parking_lot::RwLock;

/// A registry together with the package currently in effect (`*PACKAGE*`)
pub struct GlobalContext {
    pub registry: Registry,
    current_package: RwLock<Option<PackageId>>,
}

impl GlobalContext {
    pub fn new() -> Self {
        Self::from_registry(Registry::new())
    }

    pub fn with_config(config: RegistryConfig) -> PackageResult<Self> {
        Registry::with_config(config).map(Self::from_registry)
    }

    /// Start in COMMON-LISP-USER when the registry has one
    pub fn from_registry(registry: Registry) -> Self {
        let current = registry.find_package(COMMON_LISP_USER);
        Self {
            registry,
            current_package: RwLock::new(current),
        }
    }

    /// Get the current package; fails once it has been deleted
    pub fn current_package(&self) -> PackageResult<PackageId> {
        let current = *self.current_package.read();
        match current {
            Some(id) => self.registry.package(id).map(|package| package.id()),
            None => Err(PackageError::unknown_package("NIL")),
        }
    }

    /// Set the current package
    pub fn set_current_package(&self, pkg: PackageId) -> PackageResult<()> {
        self.registry.package(pkg)?;
        *self.current_package.write() = Some(pkg);
        Ok(())
    }

    /// IN-PACKAGE by name, honoring local nicknames of the current package
    pub fn in_package(&self, name: &str) -> PackageResult<PackageId> {
        let pkg = self
            .find_package(name)
            .ok_or_else(|| PackageError::unknown_package(name))?;
        self.set_current_package(pkg)?;
        Ok(pkg)
    }

    pub fn find_package(&self, name: &str) -> Option<PackageId> {
        match self.current_package() {
            Ok(current) => self.registry.find_package_from(current, name),
            Err(_) => self.registry.find_package(name),
        }
    }

    /// Intern a symbol in the current package
    pub fn intern(&self, name: &str) -> PackageResult<SymbolId> {
        self.registry.intern(self.current_package()?, name)
    }

    pub fn find_symbol(&self, name: &str) -> PackageResult<Option<FoundSymbol>> {
        Ok(self.registry.find_symbol(self.current_package()?, name))
    }

    /// Symbol name as printed with the current package in effect
    pub fn print_name(&self, sym: SymbolId) -> String {
        match self.current_package() {
            Ok(current) => self.registry.print_name_in(sym, current),
            Err(_) => self.registry.qualified_name(sym),
        }
    }
}

impl Default for GlobalContext {
    fn default() -> Self {
        Self::new()
    }
}
