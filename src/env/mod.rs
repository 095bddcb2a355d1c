pub mod memory;

pub use memory::MemoryEnvironment;

use std::collections::BTreeMap;
use crate::core::{RelationName, Result};

/// A unit's key-value record, or the leader settings.
pub type Settings = BTreeMap<String, String>;

/// A batch of writes. `None` is the removal sentinel.
pub type SettingsUpdate = BTreeMap<String, Option<String>>;

/// Hook environment trait - the capabilities the context layer consumes.
///
/// Implementations bind these to a real hook environment, or keep
/// everything in process (`MemoryEnvironment`). Any failure is reported
/// as `ContextError::Transport` and is passed to callers unchanged.
pub trait HookEnvironment {
    /// Every relation name the local unit participates in
    fn list_relation_types(&self) -> Result<Vec<RelationName>>;

    /// Relation ids for one relation name, in transport order
    fn list_relation_ids(&self, name: &str) -> Result<Vec<String>>;

    /// Units on the other side of a relation id, in transport order
    fn list_related_units(&self, relid: &str) -> Result<Vec<String>>;

    /// The unit this process runs as
    fn local_unit(&self) -> Result<String>;

    /// Relation id of the peer relation, if the service declares one
    fn peer_relation_id(&self) -> Result<Option<String>>;

    /// Full record of `unit` on `relid`
    fn get_relation_data(&self, relid: &str, unit: &str) -> Result<Settings>;

    /// Write to the local unit's record on `relid`
    fn set_relation_data(&self, relid: &str, data: &SettingsUpdate) -> Result<()>;

    /// Whether the local unit currently holds leadership
    fn is_leader(&self) -> Result<bool>;

    fn get_leader_settings(&self) -> Result<Settings>;

    fn set_leader_settings(&self, data: &SettingsUpdate) -> Result<()>;
}
