//! Database configuration.

use std::path::Path;

use arcstr::ArcStr;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::flatten::{FlattenOpts, TerminalPolicy};

/// Database-wide settings, usually loaded from a TOML file.
///
/// # Example
///
/// ```
/// # use designdb::config::DatabaseConfig;
/// let config = DatabaseConfig::from_toml(r#"
///     grid = 5
///
///     [flatten]
///     no_clock_flatten = true
///     terminal_policy = "all-components"
///     excluded = ["scan_en"]
/// "#).unwrap();
/// assert_eq!(config.grid, 5);
/// assert!(config.flatten.no_clock_flatten);
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// The manufacturing grid, in database units.
    ///
    /// Used when shrinking abutment boxes.
    pub grid: i64,
    /// Default options for net flattening.
    pub flatten: FlattenConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            grid: 1,
            flatten: FlattenConfig::default(),
        }
    }
}

/// The `[flatten]` table of a [`DatabaseConfig`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlattenConfig {
    /// Skip clock nets.
    pub no_clock_flatten: bool,
    /// How terminals are collapsed onto flattened nets.
    pub terminal_policy: TerminalPolicy,
    /// Report terminals reached through unplaced instances.
    pub warn_on_unplaced: bool,
    /// Occurrence names of nets that are never flattened.
    pub excluded: Vec<ArcStr>,
}

impl DatabaseConfig {
    /// Parses a configuration from a TOML document.
    pub fn from_toml(toml: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml)?;
        tracing::debug!(?config, "parsed database configuration");
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// A missing file yields the default configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(toml) => Self::from_toml(&toml),
            Err(err) => {
                tracing::debug!(path = %path.display(), %err, "using default database configuration");
                Ok(Self::default())
            }
        }
    }

    /// The flattening options described by the `[flatten]` table.
    pub fn flatten_opts(&self) -> FlattenOpts {
        FlattenOpts {
            no_clock_flatten: self.flatten.no_clock_flatten,
            terminal_policy: self.flatten.terminal_policy,
            warn_on_unplaced: self.flatten.warn_on_unplaced,
            excluded: self.flatten.excluded.iter().cloned().collect::<IndexSet<_>>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(DatabaseConfig::from_toml("").unwrap(), DatabaseConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = DatabaseConfig::from_toml("grdi = 5").unwrap_err();
        assert!(!err.is_structural());
        assert!(!err.is_format());
    }

    #[test]
    fn flatten_table_maps_to_opts() {
        let config = DatabaseConfig::from_toml(
            r#"
            [flatten]
            terminal_policy = "biggest-area"
            warn_on_unplaced = true
            excluded = ["a.b", "c"]
            "#,
        )
        .unwrap();
        let opts = config.flatten_opts();
        assert_eq!(opts.terminal_policy, TerminalPolicy::BiggestArea);
        assert!(opts.warn_on_unplaced);
        assert!(!opts.no_clock_flatten);
        assert!(opts.excluded.contains("a.b"));
        assert_eq!(opts.excluded.len(), 2);
    }
}
