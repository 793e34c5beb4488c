// Persisted Package References
//
// Serialized data never holds a PackageId: ids are only meaningful inside one
// registry. A reference stores the package name and is resolved again on load.

use crate::conditions::{PackageError, PackageResult};
use crate::registry::Registry;
use crate::symbol::{PackageId, SymbolId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageRef {
    pub name: String,
}

impl PackageRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A symbol by home package and name; `package: None` for uninterned symbols
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolRef {
    pub package: Option<PackageRef>,
    pub name: String,
}

impl Registry {
    pub fn package_ref(&self, pkg: PackageId) -> PackageResult<PackageRef> {
        Ok(PackageRef::new(self.package(pkg)?.name()))
    }

    /// Resolve a restored reference by name
    pub fn resolve(&self, package: &PackageRef) -> PackageResult<PackageId> {
        self.find_package(&package.name)
            .ok_or_else(|| PackageError::unknown_package(&package.name))
    }

    pub fn symbol_ref_of(&self, sym: SymbolId) -> Option<SymbolRef> {
        let symbol = self.symbols.get(sym)?;
        let package = match symbol.home_package() {
            Some(home) => self.package_ref(home).ok(),
            None => None,
        };
        Some(SymbolRef {
            package,
            name: symbol.name().to_string(),
        })
    }

    /// Resolve a restored symbol. An interned symbol must still be accessible
    /// in its package; an uninterned one is recreated fresh.
    pub fn resolve_symbol(&self, symbol: &SymbolRef) -> PackageResult<SymbolId> {
        let Some(package_ref) = &symbol.package else {
            return Ok(self.make_symbol(&symbol.name));
        };
        let pkg = self.resolve(package_ref)?;
        self.find_accessible(pkg, &symbol.name).ok_or_else(|| {
            PackageError::not_accessible(
                pkg,
                format!(
                    "No symbol named {} is accessible in package {}.",
                    symbol.name, package_ref.name
                ),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::PackageErrorKind;

    #[test]
    fn test_package_ref_round_trip() {
        let registry = Registry::new();
        let cl = registry.find_package("CL").unwrap();
        let stored = registry.package_ref(cl).unwrap();
        assert_eq!(stored.name, "COMMON-LISP");

        let json = serde_json::to_string(&stored).unwrap();
        let restored: PackageRef = serde_json::from_str(&json).unwrap();
        assert_eq!(registry.resolve(&restored).unwrap(), cl);
    }

    #[test]
    fn test_resolve_missing_package() {
        let registry = Registry::new();
        let err = registry.resolve(&PackageRef::new("GONE")).unwrap_err();
        assert_eq!(err.kind(), PackageErrorKind::UnknownPackage);
    }

    #[test]
    fn test_symbol_refs() {
        let registry = Registry::new();
        let cl = registry.find_package("CL").unwrap();
        let car = registry.intern_and_export(cl, "CAR").unwrap();
        let stored = registry.symbol_ref_of(car).unwrap();
        assert_eq!(registry.resolve_symbol(&stored).unwrap(), car);

        let gensym = registry.make_symbol("G7");
        let stored = registry.symbol_ref_of(gensym).unwrap();
        assert!(stored.package.is_none());
        let fresh = registry.resolve_symbol(&stored).unwrap();
        assert_ne!(fresh, gensym);
        assert_eq!(registry.symbol_name(fresh).as_deref(), Some("G7"));
    }
}
