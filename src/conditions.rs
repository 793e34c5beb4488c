// Package System Conditions
//
// The package-error taxonomy. Every condition is recoverable: the operation
// that raised it has not mutated anything, and the caller decides whether to
// retry, report, or hand it to the outer condition system.

use crate::symbol::{PackageId, SymbolId};
use smallvec::SmallVec;
use std::fmt;

/// Which package-error a condition is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageErrorKind {
    /// Two distinct symbols would become accessible under one name
    NameConflict,
    /// Exporting would collide with a symbol in a using package
    ExportConflict,
    /// Removing a shadowing symbol would expose an ambiguous inherited name
    UninternConflict,
    /// The symbol is not accessible in the role the operation needs
    NameNotAccessible,
    /// A package name or nickname is already taken
    PackageAlreadyExists,
    /// No live package answers to the given name or id
    UnknownPackage,
}

impl PackageErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PackageErrorKind::NameConflict => "name-conflict",
            PackageErrorKind::ExportConflict => "export-conflict",
            PackageErrorKind::UninternConflict => "unintern-conflict",
            PackageErrorKind::NameNotAccessible => "name-not-accessible",
            PackageErrorKind::PackageAlreadyExists => "package-already-exists",
            PackageErrorKind::UnknownPackage => "unknown-package",
        }
    }
}

impl fmt::Display for PackageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A package-error condition instance
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PackageError {
    kind: PackageErrorKind,
    message: String,
    package: Option<PackageId>,
    symbols: SmallVec<[SymbolId; 2]>,
}

pub type PackageResult<T> = Result<T, PackageError>;

impl PackageError {
    pub fn new(kind: PackageErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            package: None,
            symbols: SmallVec::new(),
        }
    }

    pub fn with_package(mut self, package: PackageId) -> Self {
        self.package = Some(package);
        self
    }

    pub fn with_symbols(mut self, symbols: &[SymbolId]) -> Self {
        self.symbols.extend_from_slice(symbols);
        self
    }

    pub fn name_conflict(package: PackageId, message: impl Into<String>) -> Self {
        Self::new(PackageErrorKind::NameConflict, message).with_package(package)
    }

    pub fn export_conflict(package: PackageId, message: impl Into<String>) -> Self {
        Self::new(PackageErrorKind::ExportConflict, message).with_package(package)
    }

    pub fn unintern_conflict(package: PackageId, message: impl Into<String>) -> Self {
        Self::new(PackageErrorKind::UninternConflict, message).with_package(package)
    }

    pub fn not_accessible(package: PackageId, message: impl Into<String>) -> Self {
        Self::new(PackageErrorKind::NameNotAccessible, message).with_package(package)
    }

    pub fn already_exists(name: &str) -> Self {
        Self::new(
            PackageErrorKind::PackageAlreadyExists,
            format!("A package named {} already exists.", name),
        )
    }

    pub fn unknown_package(name: &str) -> Self {
        Self::new(
            PackageErrorKind::UnknownPackage,
            format!("{} is not the name of a package.", name),
        )
    }

    pub fn kind(&self) -> PackageErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The package the condition is reported against
    pub fn package(&self) -> Option<PackageId> {
        self.package
    }

    /// The symbols involved, offending symbol first
    pub fn symbols(&self) -> &[SymbolId] {
        &self.symbols
    }
}
