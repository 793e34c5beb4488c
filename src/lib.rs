// Package System Core for a Common Lisp Runtime
//
// Maps names to unique symbols through packages: internal/external tables,
// USE-PACKAGE inheritance, shadowing, and conflict detection, behind a
// process-wide package registry.
//
// Mutations are linearizable per package. Operations that consult a second
// package (export's used-by scan, use's external-symbol scan) do not lock it,
// so cross-package conflict checks are best-effort under concurrent mutation.

pub mod conditions;
pub mod config;
pub mod context;
pub mod counters;
pub mod fastmap;
pub mod package;
pub mod persist;
pub mod registry;
pub mod symbol;

mod export;
mod inherit;
mod intern;
mod printer;
mod shadow;

pub use conditions::{PackageError, PackageErrorKind, PackageResult};
pub use config::RegistryConfig;
pub use context::GlobalContext;
pub use package::{FoundSymbol, Locality, Package};
pub use persist::{PackageRef, SymbolRef};
pub use registry::Registry;
pub use symbol::{PackageId, Symbol, SymbolId};
