use std::path::{Path, PathBuf};
use crate::core::{ContextError, RelationId, Result, UnitId};
use crate::env::MemoryEnvironment;

pub const SNAPSHOT_VAR: &str = "RELCTX_SNAPSHOT";
pub const UNIT_VAR: &str = "RELCTX_UNIT";
pub const PEER_RELATION_VAR: &str = "RELCTX_PEER_RELATION";

/// Environment configuration for the `relctx` binary
///
/// Points at a JSON snapshot of a hook environment and optionally
/// overrides who the local unit is and which relation is the peer one.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvConfig {
    /// JSON snapshot file backing the environment
    pub snapshot_path: Option<PathBuf>,

    /// Run as this unit instead of the snapshot's local unit
    pub local_unit: Option<String>,

    /// Use this relation id as the peer relation
    pub peer_relation: Option<String>,

    /// Persist writes back to the snapshot file
    pub write_back: bool,
}

impl EnvConfig {
    pub fn new(snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: Some(snapshot_path.into()),
            ..Self::default()
        }
    }

    /// Read `RELCTX_SNAPSHOT`, `RELCTX_UNIT` and `RELCTX_PEER_RELATION`
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());
        Self {
            snapshot_path: non_empty(SNAPSHOT_VAR).map(PathBuf::from),
            local_unit: non_empty(UNIT_VAR),
            peer_relation: non_empty(PEER_RELATION_VAR),
            write_back: true,
        }
    }

    /// Set the snapshot path
    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Set the local unit override
    pub fn local_unit(mut self, unit: &str) -> Self {
        self.local_unit = Some(unit.to_string());
        self
    }

    /// Set the peer relation override
    pub fn peer_relation(mut self, relid: &str) -> Self {
        self.peer_relation = Some(relid.to_string());
        self
    }

    pub fn write_back(mut self, write_back: bool) -> Self {
        self.write_back = write_back;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.snapshot_path.is_none() {
            return Err(ContextError::Config(format!(
                "no snapshot path (set {} or pass --snapshot)",
                SNAPSHOT_VAR
            )));
        }
        if let Some(unit) = &self.local_unit {
            UnitId::parse(unit)
                .map_err(|_| ContextError::Config(format!("invalid unit override '{}'", unit)))?;
        }
        if let Some(relid) = &self.peer_relation {
            RelationId::parse(relid).map_err(|_| {
                ContextError::Config(format!("invalid peer relation override '{}'", relid))
            })?;
        }
        Ok(())
    }

    pub fn path(&self) -> Result<&Path> {
        self.snapshot_path
            .as_deref()
            .ok_or_else(|| ContextError::Config("no snapshot path".to_string()))
    }

    /// Load the snapshot and apply the overrides for this run only
    pub fn open(&self) -> Result<MemoryEnvironment> {
        self.validate()?;
        let env = MemoryEnvironment::load(self.path()?)?;
        if let Some(unit) = &self.local_unit {
            env.override_local_unit(unit);
        }
        if let Some(relid) = &self.peer_relation {
            env.override_peer_relation(relid);
        }
        Ok(env)
    }

    /// Write the environment back if `write_back` is set
    pub fn persist(&self, env: &MemoryEnvironment) -> Result<()> {
        if self.write_back {
            env.save(self.path()?)?;
        }
        Ok(())
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            local_unit: None,
            peer_relation: None,
            write_back: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = EnvConfig::default();
        assert!(config.snapshot_path.is_none());
        assert!(config.write_back);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder_pattern() {
        let config = EnvConfig::new("env.json")
            .local_unit("foo/2")
            .peer_relation("cluster:0")
            .write_back(false);

        assert_eq!(config.snapshot_path, Some(PathBuf::from("env.json")));
        assert_eq!(config.local_unit.as_deref(), Some("foo/2"));
        assert_eq!(config.peer_relation.as_deref(), Some("cluster:0"));
        assert!(!config.write_back);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (SNAPSHOT_VAR, "/tmp/env.json"),
            (UNIT_VAR, "foo/3"),
            (PEER_RELATION_VAR, ""),
        ]
        .into_iter()
        .collect();
        let config = EnvConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.snapshot_path, Some(PathBuf::from("/tmp/env.json")));
        assert_eq!(config.local_unit.as_deref(), Some("foo/3"));
        assert_eq!(config.peer_relation, None);
    }

    #[test]
    fn test_validate_rejects_bad_overrides() {
        let bad_unit = EnvConfig::new("env.json").local_unit("foo");
        assert!(matches!(bad_unit.validate(), Err(ContextError::Config(_))));

        let bad_peer = EnvConfig::new("env.json").peer_relation("cluster");
        assert!(matches!(bad_peer.validate(), Err(ContextError::Config(_))));
    }
}
