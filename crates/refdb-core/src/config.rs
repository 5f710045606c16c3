use crate::error::{InternalError, RequestError};
use serde::{Deserialize, Serialize};

/// Registry source served when none is configured.
pub const DEFAULT_SOURCE: &str = "TEST";

///
/// RegistryConfig
///
/// Runtime configuration for reference reads and cascading deletes.
/// Every field has a default; unknown keys are rejected.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Registry source name accepted on requests (matched case-insensitively).
    pub source: String,
    pub tree: TreeConfig,
    pub delete: DeleteConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            tree: TreeConfig::default(),
            delete: DeleteConfig::default(),
        }
    }
}

impl RegistryConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, InternalError> {
        let config: Self = toml::from_str(input)
            .map_err(|err| InternalError::config_invalid(format!("invalid config: {err}")))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), InternalError> {
        if self.source.trim().is_empty() {
            return Err(InternalError::config_invalid("source must not be empty"));
        }
        if self.tree.max_depth == 0 {
            return Err(InternalError::config_invalid(
                "tree.max_depth must be at least 1",
            ));
        }
        if self.tree.max_nodes == 0 {
            return Err(InternalError::config_invalid(
                "tree.max_nodes must be at least 1",
            ));
        }
        if self.delete.max_support_set == 0 {
            return Err(InternalError::config_invalid(
                "delete.max_support_set must be at least 1",
            ));
        }

        Ok(())
    }

    /// Reject requests addressed to a different registry source.
    pub fn check_source(&self, source: &str) -> Result<(), RequestError> {
        if source.trim().eq_ignore_ascii_case(&self.source) {
            Ok(())
        } else {
            Err(RequestError::InvalidSource {
                source_name: source.to_string(),
            })
        }
    }
}

///
/// TreeConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TreeConfig {
    /// Nodes this deep below the root render as leaves.
    pub max_depth: usize,

    /// Node budget for one tree; once spent, pending children render as leaves.
    pub max_nodes: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_nodes: 10_000,
        }
    }
}

///
/// DeleteConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeleteConfig {
    /// Upper bound on records removed by one cascading delete.
    pub max_support_set: usize,

    /// Re-check the support set against the store right before commit.
    pub revalidate: bool,
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self {
            max_support_set: 1000,
            revalidate: true,
        }
    }
}

///
/// TESTS
///
