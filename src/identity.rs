use crate::error::{DevstatsError, Result};
use std::collections::HashMap;
use std::path::Path;

/// Maps raw author names to canonical developer identities.
///
/// The alias table is fixed at construction. Lookups are total: a name with
/// no alias entry resolves to itself. Several aliases may map to the same
/// canonical name; configuring the same alias twice keeps the last write.
#[derive(Debug, Clone, Default)]
pub struct IdentityResolver {
    aliases: HashMap<String, String>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_aliases(aliases: HashMap<String, String>) -> Self {
        Self { aliases }
    }

    /// Load an alias table from a JSON object of `alias: canonical` strings.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let aliases: HashMap<String, String> = serde_json::from_str(&raw)?;
        Ok(Self { aliases })
    }

    pub fn insert_alias(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        self.aliases.insert(alias.into(), canonical.into());
    }

    /// Parse and insert a `raw=canonical` pair as given on the command line.
    pub fn insert_pair(&mut self, pair: &str) -> Result<()> {
        match pair.split_once('=') {
            Some((alias, canonical)) if !alias.is_empty() && !canonical.is_empty() => {
                self.insert_alias(alias, canonical);
                Ok(())
            }
            _ => Err(DevstatsError::Parse(format!(
                "Invalid alias '{pair}': expected RAW=CANONICAL"
            ))),
        }
    }

    pub fn resolve<'a>(&'a self, raw_name: &'a str) -> &'a str {
        self.aliases.get(raw_name).map(String::as_str).unwrap_or(raw_name)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
