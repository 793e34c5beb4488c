// Symbol Name Rendering
//
// Package-qualified names for symbols. Deciding when to print them, and how to
// escape them, belongs to the printer proper.

use crate::registry::Registry;
use crate::symbol::{PackageId, SymbolId};

impl Registry {
    /// Fully qualified name: `#:X`, `:X`, `PKG:X` or `PKG::X`
    pub fn qualified_name(&self, sym: SymbolId) -> String {
        let Some(symbol) = self.symbols.get(sym) else {
            return format!("#<symbol:{}>", sym.0);
        };
        let name = symbol.name();
        let home = symbol
            .home_package()
            .and_then(|id| self.get_package(id))
            .filter(|package| !package.is_deleted());
        match home {
            None => format!("#:{}", name),
            Some(package) if package.auto_exports() => format!(":{}", name),
            Some(package) if package.find_external(name) == Some(sym) => {
                format!("{}:{}", package.name(), name)
            }
            Some(package) => format!("{}::{}", package.name(), name),
        }
    }

    /// The name as it should read with `pkg` current: bare when `sym` is
    /// accessible there under its own name, qualified otherwise.
    pub fn print_name_in(&self, sym: SymbolId, pkg: PackageId) -> String {
        let Some(symbol) = self.symbols.get(sym) else {
            return self.qualified_name(sym);
        };
        let keyword = symbol
            .home_package()
            .and_then(|id| self.get_package(id))
            .is_some_and(|package| package.auto_exports() && !package.is_deleted());
        if !keyword {
            if let Some(package) = self.get_package(pkg) {
                if self.lookup(&package, symbol.name()).map(|f| f.symbol) == Some(sym) {
                    return symbol.name().to_string();
                }
            }
        }
        self.qualified_name(sym)
    }
}
