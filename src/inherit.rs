// Package Inheritance (USE-PACKAGE / UNUSE-PACKAGE)
//
// `use_package` checks every external symbol of the target against what is
// already accessible before linking; `unuse_package` only removes visibility
// and needs no check.
//
// Linking holds both packages' locks (taken in id order) so neither side can
// be deleted between the liveness check and the new edge. Conflict detection
// stays best-effort: an export from another package the user inherits from
// can still race the scan.

use crate::conditions::{PackageError, PackageResult};
use crate::package::Package;
use crate::registry::Registry;
use crate::symbol::PackageId;

impl Registry {
    /// Make the external symbols of `target` accessible in `pkg`
    pub fn use_package(&self, pkg: PackageId, target: PackageId) -> PackageResult<()> {
        let package = self.package(pkg)?;
        let used = self.package(target)?;
        let _guards = Package::lock_pair(&package, &used);
        package.check_live()?;
        used.check_live()?;

        if package.uses(target) {
            return Ok(());
        }

        for (name, symbol) in used.external_entries() {
            if package.is_shadowing(&name) {
                continue;
            }
            match self.lookup(&package, &name) {
                Some(existing) if existing.symbol != symbol => {
                    return Err(self.reject(
                        PackageError::name_conflict(
                            pkg,
                            format!(
                                "Using package {} makes {} conflict with {}, already accessible in package {}.",
                                used.name(),
                                self.qualified_name(symbol),
                                self.qualified_name(existing.symbol),
                                package.name()
                            ),
                        )
                        .with_symbols(&[symbol, existing.symbol]),
                    ));
                }
                _ => {}
            }
        }

        package.push_use(target);
        used.add_user(pkg);
        log::debug!("package {} now uses {}", package.name(), used.name());
        Ok(())
    }

    pub fn unuse_package(&self, pkg: PackageId, target: PackageId) -> PackageResult<()> {
        let package = self.package(pkg)?;
        let _guard = package.lock();
        package.check_live()?;
        if self.unlink_use(&package, target) {
            log::debug!("package {} no longer uses {:?}", package.name(), target);
        }
        Ok(())
    }

    /// Remove the `user` -> `target` edge from both sides. Returns true if
    /// `user` was using `target`.
    pub(crate) fn unlink_use(&self, user: &Package, target: PackageId) -> bool {
        let removed = user.remove_use(target);
        if let Some(target_package) = self.get_package(target) {
            target_package.remove_user(user.id());
        }
        removed
    }

    pub fn uses(&self, pkg: PackageId, target: PackageId) -> bool {
        self.get_package(pkg).is_some_and(|p| p.uses(target))
    }

    /// The use-list in precedence order
    pub fn use_list(&self, pkg: PackageId) -> Vec<PackageId> {
        self.get_package(pkg)
            .map(|p| p.use_list().to_vec())
            .unwrap_or_default()
    }

    pub fn used_by_list(&self, pkg: PackageId) -> Vec<PackageId> {
        self.get_package(pkg)
            .map(|p| p.used_by())
            .unwrap_or_default()
    }
}
