use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};
use super::record::{LazyRecord, write_through};
use crate::core::{ContextError, RelationId, Result, UnitId, Value};
use crate::env::{HookEnvironment, Settings};

/// One unit's key-value record on one relation id.
///
/// Data is fetched on first read and cached for the life of the
/// instance. Only the record of the local unit is writable; the flag is
/// fixed when the record is built and checked on every write.
///
/// Not meant to be shared across threads: the cache is a `RefCell`.
pub struct UnitRecord {
    env: Rc<dyn HookEnvironment>,
    relid: RelationId,
    unit: UnitId,
    writable: bool,
    cache: LazyRecord,
}

impl UnitRecord {
    /// Open the record of `unit` on `relid`, asking the environment for
    /// the local unit to decide writability.
    pub fn open(env: Rc<dyn HookEnvironment>, relid: &str, unit: &str) -> Result<Self> {
        let local = UnitId::parse(&env.local_unit()?)?;
        Ok(Self::with_local(
            env,
            RelationId::parse(relid)?,
            UnitId::parse(unit)?,
            &local,
        ))
    }

    pub(crate) fn with_local(
        env: Rc<dyn HookEnvironment>,
        relid: RelationId,
        unit: UnitId,
        local: &UnitId,
    ) -> Self {
        let writable = &unit == local;
        Self {
            env,
            relid,
            unit,
            writable,
            cache: LazyRecord::new(),
        }
    }

    pub fn relid(&self) -> &str {
        self.relid.as_str()
    }

    pub fn relname(&self) -> &str {
        self.relid.name()
    }

    pub fn unit(&self) -> &str {
        self.unit.as_str()
    }

    pub fn service(&self) -> &str {
        self.unit.service()
    }

    pub fn number(&self) -> u64 {
        self.unit.number()
    }

    /// True for the local unit's own record
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Whether the record has been fetched yet
    pub fn is_loaded(&self) -> bool {
        self.cache.is_loaded()
    }

    fn fetch(&self) -> Result<Settings> {
        let data = self
            .env
            .get_relation_data(self.relid.as_str(), self.unit.as_str())?;
        debug!(record = %self, keys = data.len(), "fetched relation data");
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

    /// Copy of the whole record
    pub fn to_map(&self) -> Result<Settings> {
        self.cache.with_loaded(|| self.fetch(), Settings::clone)
    }

    /// Write `key` on the local unit's record. `Value::Null` removes it.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        if !self.writable {
            warn!(record = %self, key, "refusing write to remote unit record");
            return Err(ContextError::ReadOnly {
                record: self.to_string(),
                key: key.to_string(),
            });
        }
        write_through(
            &self.cache,
            key,
            value.into(),
            || Ok(()),
            |update| self.env.set_relation_data(self.relid.as_str(), update),
        )?;
        debug!(record = %self, key, "wrote relation data");
        Ok(())
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        self.set(key, Value::Null)
    }
}

impl fmt::Display for UnitRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.relid, self.unit)
    }
}

impl fmt::Debug for UnitRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("UnitRecord")
            .field("relid", &self.relid.as_str())
            .field("unit", &self.unit.as_str())
            .field("writable", &self.writable)
            .field("loaded", &self.cache.is_loaded())
            .finish()
    }
}
