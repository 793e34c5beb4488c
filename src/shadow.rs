// Shadowing and Uninterning
//
// A shadowing symbol is a present symbol that wins over any same-named symbol
// inherited through the use-list. Removing one must not leave two different
// inherited symbols competing for its name.

use crate::conditions::{PackageError, PackageResult};
use crate::package::Package;
use crate::registry::Registry;
use crate::symbol::{PackageId, SymbolId};
use smallvec::SmallVec;

impl Registry {
    /// SHADOW: ensure a present symbol named `name` and mark it shadowing
    pub fn shadow(&self, pkg: PackageId, name: &str) -> PackageResult<SymbolId> {
        let package = self.package(pkg)?;
        let _guard = package.lock();
        package.check_live()?;

        let symbol = match package.find_present(name) {
            Some(found) => found.symbol,
            None => self.add_symbol(&package, name),
        };
        package.add_shadowing(name, symbol);
        Ok(symbol)
    }

    /// SHADOWING-IMPORT: install `sym` as the shadowing symbol for its name,
    /// uninterning whatever different symbol was present there.
    pub fn shadowing_import(&self, pkg: PackageId, sym: SymbolId) -> PackageResult<()> {
        let package = self.package(pkg)?;
        let _guard = package.lock();
        package.check_live()?;
        let symbol = self.symbol_ref(pkg, sym)?;
        let name = symbol.name();

        match package.find_present(name) {
            Some(found) if found.symbol == sym => {}
            Some(found) => {
                package.remove_name(name);
                if let Some(previous) = self.symbols.get(found.symbol) {
                    previous.release_home(pkg);
                }
                package.put_internal(name, sym);
            }
            None => package.put_internal(name, sym),
        }
        symbol.claim_home(pkg);
        package.add_shadowing(name, sym);
        Ok(())
    }

    /// UNINTERN. Returns false if `sym` is not present in `pkg`.
    pub fn unintern(&self, pkg: PackageId, sym: SymbolId) -> PackageResult<bool> {
        let package = self.package(pkg)?;
        let _guard = package.lock();
        package.check_live()?;
        let Some(symbol) = self.symbols.get(sym) else {
            return Ok(false);
        };

        let names: SmallVec<[String; 1]> = self
            .local_names(pkg, sym)
            .into_iter()
            .filter(|name| package.find_present(name).map(|f| f.symbol) == Some(sym))
            .collect();
        if names.is_empty() {
            return Ok(false);
        }

        // Check every name before removing any
        for name in &names {
            if package.shadowing_symbol(name) == Some(sym) {
                self.check_unshadow(&package, name, sym)?;
            }
        }

        for name in &names {
            package.remove_name(name);
        }
        symbol.release_home(pkg);
        Ok(true)
    }

    /// Fail if dropping the shadowing symbol `sym` would expose two distinct
    /// inherited symbols named `name`.
    fn check_unshadow(&self, package: &Package, name: &str, sym: SymbolId) -> PackageResult<()> {
        let mut first: Option<SymbolId> = None;
        for used in package.use_list() {
            let Some(candidate) = self.get_package(used).and_then(|p| p.find_external(name)) else {
                continue;
            };
            match first {
                None => first = Some(candidate),
                Some(seen) if seen != candidate => {
                    return Err(self.reject(
                        PackageError::unintern_conflict(
                            package.id(),
                            format!(
                                "Uninterning the symbol {} causes a name conflict between {} and {}.",
                                self.qualified_name(sym),
                                self.qualified_name(seen),
                                self.qualified_name(candidate)
                            ),
                        )
                        .with_symbols(&[sym, seen, candidate]),
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}
