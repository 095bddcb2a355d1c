use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};
use super::record::{LazyRecord, write_through};
use crate::core::{ContextError, Result, Value};
use crate::env::{HookEnvironment, Settings};

/// Cluster-wide settings, readable by every unit and writable only by the
/// leader.
///
/// Settings are fetched on first read and cached for the life of the
/// instance. Leadership is asked for again on every write.
pub struct LeaderSettings {
    env: Rc<dyn HookEnvironment>,
    cache: LazyRecord,
}

impl LeaderSettings {
    pub fn new(env: Rc<dyn HookEnvironment>) -> Self {
        Self {
            env,
            cache: LazyRecord::new(),
        }
    }

    /// Current leadership, straight from the environment
    pub fn is_leader(&self) -> Result<bool> {
        self.env.is_leader()
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.is_loaded()
    }

    fn fetch(&self) -> Result<Settings> {
        let data = self.env.get_leader_settings()?;
        debug!(keys = data.len(), "fetched leader settings");
        Ok(data)
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.cache.get(key, || self.fetch())
    }

    /// Like `get`, but an unset key is `ContextError::NotFound`
    pub fn require(&self, key: &str) -> Result<String> {
        self.get(key)?
            .ok_or_else(|| ContextError::NotFound(key.to_string()))
    }

    pub fn contains_key(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        self.cache
            .with_loaded(|| self.fetch(), |data| data.keys().cloned().collect())
    }

    pub fn len(&self) -> Result<usize> {
        self.cache.with_loaded(|| self.fetch(), Settings::len)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn to_map(&self) -> Result<Settings> {
        self.cache.with_loaded(|| self.fetch(), Settings::clone)
    }

    /// Write `key`. `Value::Null` removes it.
    ///
    /// The value is checked first, then leadership; a refused write makes
    /// no change anywhere.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        write_through(
            &self.cache,
            key,
            value.into(),
            || self.ensure_leader(key),
            |update| self.env.set_leader_settings(update),
        )?;
        debug!(key, "wrote leader setting");
        Ok(())
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        self.set(key, Value::Null)
    }

    fn ensure_leader(&self, key: &str) -> Result<()> {
        if self.env.is_leader()? {
            return Ok(());
        }
        warn!(key, "refusing leader settings write: not the leader");
        Err(ContextError::PermissionDenied(format!(
            "not the leader, cannot change leader setting '{}'",
            key
        )))
    }
}

impl fmt::Debug for LeaderSettings {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LeaderSettings")
            .field("loaded", &self.cache.is_loaded())
            .finish()
    }
}
