// Symbol Resolution and Interning
//
// Name lookup follows ANSI CL: a package's external symbols, then its internal
// symbols, then the external symbols of each used package in use-list order.
// Lookups never check for conflicts; every mutation keeps the accessible names
// unambiguous instead.

use crate::conditions::{PackageError, PackageResult};
use crate::fastmap::HashSet;
use crate::package::{FoundSymbol, Locality, Package};
use crate::registry::Registry;
use crate::symbol::{PackageId, SymbolId};

impl Registry {
    /// FIND-SYMBOL: the symbol accessible under `name` and how it is reached
    pub fn find_symbol(&self, pkg: PackageId, name: &str) -> Option<FoundSymbol> {
        self.counters.find_symbol();
        let package = self.get_package(pkg)?;
        self.lookup(&package, name)
    }

    pub fn find_accessible(&self, pkg: PackageId, name: &str) -> Option<SymbolId> {
        self.find_symbol(pkg, name).map(|found| found.symbol)
    }

    pub(crate) fn lookup(&self, package: &Package, name: &str) -> Option<FoundSymbol> {
        if let Some(found) = package.find_present(name) {
            return Some(found);
        }
        // First used package wins
        for used in package.use_list() {
            let inherited = self
                .get_package(used)
                .and_then(|used_package| used_package.find_external(name));
            if let Some(symbol) = inherited {
                return Some(FoundSymbol {
                    symbol,
                    locality: Locality::Inherited,
                });
            }
        }
        None
    }

    /// Intern a symbol in a specific package
    pub fn intern(&self, pkg: PackageId, name: &str) -> PackageResult<SymbolId> {
        self.intern_with_status(pkg, name).map(|(symbol, _)| symbol)
    }

    /// INTERN with its second value: None when the symbol was just created
    pub fn intern_with_status(
        &self,
        pkg: PackageId,
        name: &str,
    ) -> PackageResult<(SymbolId, Option<Locality>)> {
        self.counters.intern();
        let package = self.package(pkg)?;
        let _guard = package.lock();
        package.check_live()?;

        if let Some(found) = self.lookup(&package, name) {
            return Ok((found.symbol, Some(found.locality)));
        }
        Ok((self.add_symbol(&package, name), None))
    }

    /// Allocate a symbol homed in `package` and store it there
    pub(crate) fn add_symbol(&self, package: &Package, name: &str) -> SymbolId {
        let symbol = self.symbols.alloc(name, Some(package.id()));
        self.counters.symbol_created();
        // Keywords are automatically external
        if package.auto_exports() {
            package.put_external(name, symbol);
        } else {
            package.put_internal(name, symbol);
        }
        symbol
    }

    /// Intern `name` and make sure the result is external
    pub fn intern_and_export(&self, pkg: PackageId, name: &str) -> PackageResult<SymbolId> {
        self.counters.intern();
        let package = self.package(pkg)?;
        let _guard = package.lock();
        package.check_live()?;

        match self.lookup(&package, name) {
            Some(found) => {
                self.export_found(&package, name, found)?;
                Ok(found.symbol)
            }
            None => {
                self.check_export_conflicts(&package, name, None)?;
                let symbol = self.symbols.alloc(name, Some(pkg));
                self.counters.symbol_created();
                package.put_external(name, symbol);
                Ok(symbol)
            }
        }
    }

    /// IMPORT: make `sym` present in `pkg`
    pub fn import(&self, pkg: PackageId, sym: SymbolId) -> PackageResult<()> {
        let package = self.package(pkg)?;
        let _guard = package.lock();
        package.check_live()?;
        let symbol = self.symbol_ref(pkg, sym)?;
        let name = symbol.name();

        match self.lookup(&package, name) {
            Some(found) if found.symbol != sym => Err(self.reject(
                PackageError::name_conflict(
                    pkg,
                    format!(
                        "The symbol {}, or {}, is already accessible in package {}.",
                        name,
                        self.qualified_name(found.symbol),
                        package.name()
                    ),
                )
                .with_symbols(&[sym, found.symbol]),
            )),
            Some(found) if found.locality.is_present() => Ok(()),
            _ => {
                package.put_internal(name, sym);
                symbol.claim_home(pkg);
                Ok(())
            }
        }
    }

    /// The names under which `sym` is accessible in `pkg`
    pub fn local_names(&self, pkg: PackageId, sym: SymbolId) -> Vec<String> {
        let (Some(package), Some(symbol)) = (self.get_package(pkg), self.symbols.get(sym)) else {
            return Vec::new();
        };
        match self.lookup(&package, symbol.name()) {
            Some(found) if found.symbol == sym => vec![symbol.name().to_string()],
            _ => Vec::new(),
        }
    }

    pub fn internal_symbols(&self, pkg: PackageId) -> Vec<SymbolId> {
        self.get_package(pkg)
            .map(|p| p.internal_entries().into_iter().map(|(_, s)| s).collect())
            .unwrap_or_default()
    }

    pub fn external_symbols(&self, pkg: PackageId) -> Vec<SymbolId> {
        self.get_package(pkg)
            .map(|p| p.external_entries().into_iter().map(|(_, s)| s).collect())
            .unwrap_or_default()
    }

    /// External symbols of used packages that are neither shadowed nor present here
    pub fn inherited_symbols(&self, pkg: PackageId) -> Vec<SymbolId> {
        let Some(package) = self.get_package(pkg) else {
            return Vec::new();
        };
        let mut seen = HashSet::default();
        let mut result = Vec::new();
        for used in package.use_list() {
            let Some(used_package) = self.get_package(used) else {
                continue;
            };
            for (name, symbol) in used_package.external_entries() {
                if package.is_shadowing(&name) || package.find_present(&name).is_some() {
                    continue;
                }
                if seen.insert(name) {
                    result.push(symbol);
                }
            }
        }
        result
    }

    /// Every symbol accessible in `pkg`: present ones first, then inherited
    pub fn accessible_symbols(&self, pkg: PackageId) -> Vec<SymbolId> {
        let mut result = self.internal_symbols(pkg);
        result.extend(self.external_symbols(pkg));
        result.extend(self.inherited_symbols(pkg));
        result
    }

    pub fn shadowing_symbols(&self, pkg: PackageId) -> Vec<SymbolId> {
        self.get_package(pkg)
            .map(|p| p.shadowing_entries().into_iter().map(|(_, s)| s).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::PackageErrorKind;
    use crate::config::RegistryConfig;

    fn bare() -> Registry {
        Registry::with_config(RegistryConfig::bare()).unwrap()
    }

    #[test]
    fn test_intern_symbol() {
        let registry = bare();
        let pkg = registry.create_package("P", &[]).unwrap();
        let sym1 = registry.intern(pkg, "FOO").unwrap();
        let sym2 = registry.intern(pkg, "FOO").unwrap();
        assert_eq!(sym1, sym2); // Same symbol

        let sym3 = registry.intern(pkg, "BAR").unwrap();
        assert_ne!(sym1, sym3); // Different symbols
        assert_eq!(registry.symbol_package(sym1), Some(pkg));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let registry = bare();
        let pkg = registry.create_package("P", &[]).unwrap();
        let upper = registry.intern(pkg, "FOO").unwrap();
        let lower = registry.intern(pkg, "foo").unwrap();
        assert_ne!(upper, lower);
    }

    #[test]
    fn test_intern_status() {
        let registry = bare();
        let pkg = registry.create_package("P", &[]).unwrap();
        let (sym, status) = registry.intern_with_status(pkg, "X").unwrap();
        assert_eq!(status, None);
        let (again, status) = registry.intern_with_status(pkg, "X").unwrap();
        assert_eq!(again, sym);
        assert_eq!(status, Some(Locality::Internal));
    }

    #[test]
    fn test_keyword() {
        let registry = Registry::new();
        let kw = registry.find_package("KEYWORD").unwrap();
        let test = registry.intern(kw, "TEST").unwrap();
        assert_eq!(
            registry.find_symbol(kw, "TEST").unwrap().locality,
            Locality::External
        );
        assert_eq!(registry.symbol_package(test), Some(kw));
    }

    #[test]
    fn test_inheritance() {
        let registry = Registry::new();
        let cl = registry.find_package("CL").unwrap();
        let cl_user = registry.find_package("CL-USER").unwrap();

        let foo_cl = registry.intern(cl, "FOO").unwrap();
        registry.export(cl, foo_cl).unwrap();

        // Should find inherited FOO
        let foo_user = registry.intern(cl_user, "FOO").unwrap();
        assert_eq!(foo_cl, foo_user, "FOO should be inherited from CL");
        assert_eq!(
            registry.find_symbol(cl_user, "FOO").unwrap().locality,
            Locality::Inherited
        );
        assert_eq!(registry.inherited_symbols(cl_user), vec![foo_cl]);
    }

    #[test]
    fn test_intern_and_export_promotes_internal() {
        let registry = bare();
        let pkg = registry.create_package("A", &[]).unwrap();
        let y = registry.intern(pkg, "Y").unwrap();
        assert_eq!(registry.intern_and_export(pkg, "Y").unwrap(), y);
        assert_eq!(registry.external_symbols(pkg), vec![y]);
        assert!(registry.internal_symbols(pkg).is_empty());

        let fresh = registry.intern_and_export(pkg, "Z").unwrap();
        assert_eq!(
            registry.find_symbol(pkg, "Z").unwrap().locality,
            Locality::External
        );
        assert_eq!(registry.symbol_package(fresh), Some(pkg));
    }

    #[test]
    fn test_intern_and_export_reexports_inherited() {
        let registry = bare();
        let base = registry.create_package("BASE", &[]).unwrap();
        let mid = registry.create_package("MID", &[]).unwrap();
        let x = registry.intern_and_export(base, "X").unwrap();
        registry.use_package(mid, base).unwrap();

        assert_eq!(registry.intern_and_export(mid, "X").unwrap(), x);
        assert_eq!(
            registry.find_symbol(mid, "X").unwrap().locality,
            Locality::External
        );
        assert_eq!(registry.symbol_package(x), Some(base)); // Home unchanged
    }

    #[test]
    fn test_import() {
        let registry = bare();
        let a = registry.create_package("A", &[]).unwrap();
        let b = registry.create_package("B", &[]).unwrap();
        let x = registry.intern(a, "X").unwrap();

        registry.import(b, x).unwrap();
        assert_eq!(
            registry.find_symbol(b, "X"),
            Some(FoundSymbol { symbol: x, locality: Locality::Internal })
        );
        assert_eq!(registry.symbol_package(x), Some(a)); // Already homed
        registry.import(b, x).unwrap(); // Present: no-op

        let other = registry.intern(a, "Y").unwrap();
        registry.intern(b, "Y").unwrap();
        let err = registry.import(b, other).unwrap_err();
        assert_eq!(err.kind(), PackageErrorKind::NameConflict);
        assert_eq!(err.package(), Some(b));
        assert_eq!(err.symbols()[0], other);
    }

    #[test]
    fn test_import_of_inherited_symbol() {
        let registry = bare();
        let base = registry.create_package("BASE", &[]).unwrap();
        let user = registry.create_package("USER", &[]).unwrap();
        let x = registry.intern_and_export(base, "X").unwrap();
        registry.use_package(user, base).unwrap();
        assert_eq!(
            registry.find_symbol(user, "X").unwrap().locality,
            Locality::Inherited
        );

        registry.import(user, x).unwrap();
        assert_eq!(
            registry.find_symbol(user, "X"),
            Some(FoundSymbol { symbol: x, locality: Locality::Internal })
        );
        assert_eq!(registry.symbol_package(x), Some(base));

        // A different Y while BASE's Y is still inherited
        let y = registry.intern_and_export(base, "Y").unwrap();
        let other = registry.create_package("OTHER", &[]).unwrap();
        let other_y = registry.intern(other, "Y").unwrap();
        let err = registry.import(user, other_y).unwrap_err();
        assert_eq!(err.kind(), PackageErrorKind::NameConflict);
        assert_eq!(registry.find_accessible(user, "Y"), Some(y));
        assert!(registry.internal_symbols(user).iter().all(|s| *s != other_y));
    }

    #[test]
    fn test_import_claims_homeless_symbol() {
        let registry = bare();
        let a = registry.create_package("A", &[]).unwrap();
        let g = registry.make_symbol("G1");
        registry.import(a, g).unwrap();
        assert_eq!(registry.symbol_package(g), Some(a));
        assert_eq!(registry.find_accessible(a, "G1"), Some(g));
    }

    #[test]
    fn test_local_names() {
        let registry = bare();
        let a = registry.create_package("A", &[]).unwrap();
        let b = registry.create_package("B", &[]).unwrap();
        let x = registry.intern(a, "X").unwrap();
        assert_eq!(registry.local_names(a, x), vec!["X".to_string()]);
        assert!(registry.local_names(b, x).is_empty());
    }

    #[test]
    fn test_deleted_package_refuses_intern() {
        let registry = bare();
        let a = registry.create_package("A", &[]).unwrap();
        registry.intern(a, "X").unwrap();
        registry.delete_package(a);
        assert!(registry.find_symbol(a, "X").is_none());
        assert_eq!(
            registry.intern(a, "X").unwrap_err().kind(),
            PackageErrorKind::UnknownPackage
        );
    }
}
