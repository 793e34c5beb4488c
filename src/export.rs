// Export / Unexport
//
// Exporting is all-or-nothing: every package that uses this one is checked for
// a clashing symbol before either table is touched.

use crate::conditions::{PackageError, PackageResult};
use crate::package::{FoundSymbol, Locality, Package};
use crate::registry::Registry;
use crate::symbol::{PackageId, SymbolId};

impl Registry {
    /// Export a symbol accessible in `pkg`
    pub fn export(&self, pkg: PackageId, sym: SymbolId) -> PackageResult<()> {
        let package = self.package(pkg)?;
        let _guard = package.lock();
        package.check_live()?;
        let symbol = self.symbol_ref(pkg, sym)?;
        let name = symbol.name();

        match self.lookup(&package, name) {
            Some(found) if found.symbol == sym => self.export_found(&package, name, found),
            _ => Err(self.reject(
                PackageError::not_accessible(
                    pkg,
                    format!(
                        "The symbol {} is not accessible in package {}.",
                        self.qualified_name(sym),
                        package.name()
                    ),
                )
                .with_symbols(&[sym]),
            )),
        }
    }

    /// Export an already-resolved symbol. Caller holds the package lock.
    pub(crate) fn export_found(
        &self,
        package: &Package,
        name: &str,
        found: FoundSymbol,
    ) -> PackageResult<()> {
        match found.locality {
            // Symbol is already exported; there's nothing to do.
            Locality::External => Ok(()),
            Locality::Internal => {
                self.check_export_conflicts(package, name, Some(found.symbol))?;
                package.promote(name, found.symbol);
                Ok(())
            }
            // Import and export in one step
            Locality::Inherited => {
                self.check_export_conflicts(package, name, Some(found.symbol))?;
                package.put_external(name, found.symbol);
                Ok(())
            }
        }
    }

    /// Fail if exporting `symbol` (None for a not-yet-allocated one) under
    /// `name` would clash in any package using `package`.
    pub(crate) fn check_export_conflicts(
        &self,
        package: &Package,
        name: &str,
        symbol: Option<SymbolId>,
    ) -> PackageResult<()> {
        for user in package.used_by() {
            let Some(user_package) = self.get_package(user) else {
                continue;
            };
            if user_package.is_shadowing(name) {
                continue;
            }
            let Some(existing) = self.lookup(&user_package, name) else {
                continue;
            };
            if Some(existing.symbol) == symbol {
                continue;
            }

            let exported = match symbol {
                Some(sym) => self.qualified_name(sym),
                None => format!("{}::{}", package.name(), name),
            };
            let mut symbols = vec![existing.symbol];
            symbols.extend(symbol);
            return Err(self.reject(
                PackageError::export_conflict(
                    user,
                    format!(
                        "Exporting {} from {} conflicts with {}, already accessible in package {}.",
                        exported,
                        package.name(),
                        self.qualified_name(existing.symbol),
                        user_package.name()
                    ),
                )
                .with_symbols(&symbols),
            ));
        }
        Ok(())
    }

    /// Move an external symbol back to the internal table
    pub fn unexport(&self, pkg: PackageId, sym: SymbolId) -> PackageResult<()> {
        let package = self.package(pkg)?;
        let _guard = package.lock();
        package.check_live()?;
        let symbol = self.symbol_ref(pkg, sym)?;
        let name = symbol.name();

        if package.find_external(name) == Some(sym) {
            package.demote(name, sym);
            return Ok(());
        }
        match self.lookup(&package, name) {
            Some(found) if found.symbol == sym => Ok(()),
            _ => Err(self.reject(
                PackageError::not_accessible(
                    pkg,
                    format!(
                        "The symbol {} is not accessible in package {}.",
                        self.qualified_name(sym),
                        package.name()
                    ),
                )
                .with_symbols(&[sym]),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::conditions::PackageErrorKind;
    use crate::config::RegistryConfig;
    use crate::package::Locality;
    use crate::registry::Registry;

    fn bare() -> Registry {
        Registry::with_config(RegistryConfig::bare()).unwrap()
    }

    #[test]
    fn test_export_then_inherit() {
        let registry = bare();
        let a = registry.create_package("A", &[]).unwrap();
        let b = registry.create_package("B", &[]).unwrap();
        let x = registry.intern(a, "X").unwrap();
        registry.export(a, x).unwrap();
        registry.export(a, x).unwrap(); // Already external
        registry.use_package(b, a).unwrap();

        let found = registry.find_symbol(b, "X").unwrap();
        assert_eq!(found.symbol, x);
        assert_eq!(found.locality, Locality::Inherited);
    }

    #[test]
    fn test_export_not_accessible() {
        let registry = bare();
        let a = registry.create_package("A", &[]).unwrap();
        let b = registry.create_package("B", &[]).unwrap();
        let x = registry.intern(a, "X").unwrap();

        let err = registry.export(b, x).unwrap_err();
        assert_eq!(err.kind(), PackageErrorKind::NameNotAccessible);
        assert_eq!(err.symbols(), &[x]);
        assert!(registry.external_symbols(b).is_empty());
    }

    #[test]
    fn test_export_conflict_is_atomic() {
        let registry = bare();
        let a = registry.create_package("A", &[]).unwrap();
        let b = registry.create_package("B", &[]).unwrap();
        registry.use_package(b, a).unwrap();

        let xa = registry.intern(a, "X").unwrap();
        let xb = registry.intern(b, "X").unwrap();

        let err = registry.export(a, xa).unwrap_err();
        assert_eq!(err.kind(), PackageErrorKind::ExportConflict);
        assert_eq!(err.package(), Some(b));
        assert_eq!(err.symbols(), &[xb, xa]);

        assert_eq!(registry.internal_symbols(a), vec![xa]);
        assert!(registry.external_symbols(a).is_empty());
        assert_eq!(registry.find_accessible(b, "X"), Some(xb));
    }

    #[test]
    fn test_export_allowed_when_user_shadows() {
        let registry = bare();
        let a = registry.create_package("A", &[]).unwrap();
        let b = registry.create_package("B", &[]).unwrap();
        registry.use_package(b, a).unwrap();
        let xb = registry.shadow(b, "X").unwrap();
        let xa = registry.intern(a, "X").unwrap();

        registry.export(a, xa).unwrap();
        assert_eq!(registry.find_accessible(b, "X"), Some(xb));
    }

    #[test]
    fn test_export_conflict_through_second_used_package() {
        let registry = bare();
        let a = registry.create_package("A", &[]).unwrap();
        let c = registry.create_package("C", &[]).unwrap();
        let b = registry.create_package("B", &[]).unwrap();
        registry.intern_and_export(c, "X").unwrap();
        registry.use_package(b, a).unwrap();
        registry.use_package(b, c).unwrap();

        let xa = registry.intern(a, "X").unwrap();
        let err = registry.export(a, xa).unwrap_err();
        assert_eq!(err.kind(), PackageErrorKind::ExportConflict);
    }

    #[test]
    fn test_unexport() {
        let registry = bare();
        let a = registry.create_package("A", &[]).unwrap();
        let b = registry.create_package("B", &[]).unwrap();
        let x = registry.intern_and_export(a, "X").unwrap();
        registry.use_package(b, a).unwrap();

        registry.unexport(a, x).unwrap();
        assert_eq!(
            registry.find_symbol(a, "X").unwrap().locality,
            Locality::Internal
        );
        assert!(registry.find_symbol(b, "X").is_none());

        let stranger = registry.make_symbol("X");
        let err = registry.unexport(a, stranger).unwrap_err();
        assert_eq!(err.kind(), PackageErrorKind::NameNotAccessible);
    }
}
