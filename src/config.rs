// Registry configuration

use crate::conditions::{PackageError, PackageResult};
use crate::registry::{COMMON_LISP, COMMON_LISP_USER};
use serde::{Deserialize, Serialize};

/// Names the standard packages claim besides the keyword package
const RESERVED_NAMES: [&str; 4] = [COMMON_LISP, "CL", COMMON_LISP_USER, "CL-USER"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Create KEYWORD, COMMON-LISP and COMMON-LISP-USER on startup
    pub standard_packages: bool,
    /// Name of the package whose symbols are exported as soon as they are interned
    pub keyword_package: String,
    /// Initial capacity of each package's symbol tables
    pub table_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            standard_packages: true,
            keyword_package: "KEYWORD".to_string(),
            table_capacity: 16,
        }
    }
}

impl RegistryConfig {
    /// A registry with no packages at all
    pub fn bare() -> Self {
        Self {
            standard_packages: false,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check that the standard packages can all be created
    pub fn validate(&self) -> PackageResult<()> {
        if self.standard_packages && RESERVED_NAMES.contains(&self.keyword_package.as_str()) {
            return Err(PackageError::already_exists(&self.keyword_package));
        }
        Ok(())
    }
}
