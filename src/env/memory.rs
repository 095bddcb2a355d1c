use super::{HookEnvironment, Settings, SettingsUpdate};
use crate::core::{ContextError, RelationId, RelationName, Result, UnitId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Environment capabilities, used to count calls and inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvOp {
    ListRelationTypes,
    ListRelationIds,
    ListRelatedUnits,
    LocalUnit,
    PeerRelationId,
    GetRelationData,
    SetRelationData,
    IsLeader,
    GetLeaderSettings,
    SetLeaderSettings,
}

impl EnvOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ListRelationTypes => "list_relation_types",
            Self::ListRelationIds => "list_relation_ids",
            Self::ListRelatedUnits => "list_related_units",
            Self::LocalUnit => "local_unit",
            Self::PeerRelationId => "peer_relation_id",
            Self::GetRelationData => "get_relation_data",
            Self::SetRelationData => "set_relation_data",
            Self::IsLeader => "is_leader",
            Self::GetLeaderSettings => "get_leader_settings",
            Self::SetLeaderSettings => "set_leader_settings",
        }
    }
}

/// One relation id as seen from the local unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationSnapshot {
    /// Remote units, in the order the environment reports them
    #[serde(default)]
    pub units: Vec<String>,
    /// Records keyed by unit, the local unit's own record included
    #[serde(default)]
    pub data: BTreeMap<String, Settings>,
}

/// Serializable state behind a `MemoryEnvironment`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub local_unit: String,
    #[serde(default)]
    pub peer_relation: Option<String>,
    #[serde(default)]
    pub is_leader: bool,
    /// Relation ids in insertion order; relation names follow first appearance
    #[serde(default)]
    pub relations: IndexMap<String, RelationSnapshot>,
    #[serde(default)]
    pub leader_settings: Settings,
}

/// In-process hook environment.
///
/// Keeps the whole environment in memory, counts every capability call
/// and can fail a chosen capability once. Serves as the backing store of
/// the `relctx` binary (through JSON snapshots) and as the test double
/// for the context layer.
#[derive(Debug, Default)]
pub struct MemoryEnvironment {
    state: RefCell<EnvironmentSnapshot>,
    calls: RefCell<HashMap<EnvOp, usize>>,
    failures: RefCell<HashSet<EnvOp>>,
    overrides: RefCell<Identity>,
}

/// Identity answered in place of the stored one. Never part of a snapshot.
#[derive(Debug, Default)]
struct Identity {
    local_unit: Option<String>,
    peer_relation: Option<String>,
}

impl MemoryEnvironment {
    pub fn new(local_unit: &str) -> Self {
        Self::from_snapshot(EnvironmentSnapshot {
            local_unit: local_unit.to_string(),
            ..EnvironmentSnapshot::default()
        })
    }

    pub fn from_snapshot(snapshot: EnvironmentSnapshot) -> Self {
        Self {
            state: RefCell::new(snapshot),
            calls: RefCell::new(HashMap::new()),
            failures: RefCell::new(HashSet::new()),
            overrides: RefCell::new(Identity::default()),
        }
    }

    /// Add a relation id with its remote units
    pub fn with_relation(self, relid: &str, units: &[&str]) -> Self {
        self.state
            .borrow_mut()
            .relations
            .entry(relid.to_string())
            .or_default()
            .units = units.iter().map(|u| u.to_string()).collect();
        self
    }

    /// Set the peer relation id
    pub fn with_peer_relation(self, relid: &str) -> Self {
        self.set_peer_relation(Some(relid));
        self
    }

    /// Seed one unit's record on a relation
    pub fn with_unit_data(self, relid: &str, unit: &str, data: &[(&str, &str)]) -> Self {
        {
            let mut state = self.state.borrow_mut();
            let record = state
                .relations
                .entry(relid.to_string())
                .or_default()
                .data
                .entry(unit.to_string())
                .or_default();
            for (key, value) in data {
                record.insert(key.to_string(), value.to_string());
            }
        }
        self
    }

    pub fn with_leadership(self, is_leader: bool) -> Self {
        self.set_leader(is_leader);
        self
    }

    pub fn with_leader_setting(self, key: &str, value: &str) -> Self {
        self.state
            .borrow_mut()
            .leader_settings
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn set_leader(&self, is_leader: bool) {
        self.state.borrow_mut().is_leader = is_leader;
    }

    pub fn set_peer_relation(&self, relid: Option<&str>) {
        self.state.borrow_mut().peer_relation = relid.map(str::to_string);
    }

    /// Act as `unit` without changing the stored local unit
    pub fn override_local_unit(&self, unit: &str) {
        self.overrides.borrow_mut().local_unit = Some(unit.to_string());
    }

    /// Report `relid` as the peer relation without changing the stored one
    pub fn override_peer_relation(&self, relid: &str) {
        self.overrides.borrow_mut().peer_relation = Some(relid.to_string());
    }

    fn effective_local_unit(&self) -> String {
        match &self.overrides.borrow().local_unit {
            Some(unit) => unit.clone(),
            None => self.state.borrow().local_unit.clone(),
        }
    }

    /// Number of calls made to `op` so far
    pub fn calls(&self, op: EnvOp) -> usize {
        self.calls.borrow().get(&op).copied().unwrap_or(0)
    }

    /// Make the next call to `op` fail with a transport error
    pub fn fail_next(&self, op: EnvOp) {
        self.failures.borrow_mut().insert(op);
    }

    /// Stored record of `unit` on `relid`, bypassing call accounting
    pub fn unit_data(&self, relid: &str, unit: &str) -> Option<Settings> {
        self.state
            .borrow()
            .relations
            .get(relid)
            .and_then(|rel| rel.data.get(unit))
            .cloned()
    }

    /// Stored leader settings, bypassing call accounting
    pub fn leader_data(&self) -> Settings {
        self.state.borrow().leader_settings.clone()
    }

    pub fn snapshot(&self) -> EnvironmentSnapshot {
        self.state.borrow().clone()
    }

    // ------------------------------------------------------------------
    // JSON snapshots
    // ------------------------------------------------------------------

    pub fn from_json_str(json: &str) -> Result<Self> {
        let snapshot: EnvironmentSnapshot = serde_json::from_str(json)?;
        validate_snapshot(&snapshot)?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&*self.state.borrow())?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Count the call and consume an injected failure, if any
    fn record(&self, op: EnvOp) -> Result<()> {
        *self.calls.borrow_mut().entry(op).or_insert(0) += 1;
        if self.failures.borrow_mut().remove(&op) {
            return Err(ContextError::transport(op.name(), "injected failure"));
        }
        Ok(())
    }
}

fn validate_snapshot(snapshot: &EnvironmentSnapshot) -> Result<()> {
    UnitId::parse(&snapshot.local_unit)?;
    if let Some(peer) = &snapshot.peer_relation {
        RelationId::parse(peer)?;
    }
    for (relid, relation) in &snapshot.relations {
        RelationId::parse(relid)?;
        for unit in relation.units.iter().chain(relation.data.keys()) {
            UnitId::parse(unit)?;
        }
    }
    Ok(())
}

fn apply_update(target: &mut Settings, update: &SettingsUpdate) {
    for (key, value) in update {
        match value {
            Some(value) => {
                target.insert(key.clone(), value.clone());
            }
            None => {
                target.remove(key);
            }
        }
    }
}

impl HookEnvironment for MemoryEnvironment {
    fn list_relation_types(&self) -> Result<Vec<RelationName>> {
        self.record(EnvOp::ListRelationTypes)?;
        let state = self.state.borrow();
        let mut names: Vec<RelationName> = Vec::new();
        for relid in state.relations.keys() {
            let name = relid.split(':').next().unwrap_or(relid);
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn list_relation_ids(&self, name: &str) -> Result<Vec<String>> {
        self.record(EnvOp::ListRelationIds)?;
        Ok(self
            .state
            .borrow()
            .relations
            .keys()
            .filter(|relid| relid.split(':').next() == Some(name))
            .cloned()
            .collect())
    }

    fn list_related_units(&self, relid: &str) -> Result<Vec<String>> {
        self.record(EnvOp::ListRelatedUnits)?;
        self.state
            .borrow()
            .relations
            .get(relid)
            .map(|rel| rel.units.clone())
            .ok_or_else(|| {
                ContextError::transport(
                    EnvOp::ListRelatedUnits.name(),
                    format!("relation '{}' not found", relid),
                )
            })
    }

    fn local_unit(&self) -> Result<String> {
        self.record(EnvOp::LocalUnit)?;
        Ok(self.effective_local_unit())
    }

    fn peer_relation_id(&self) -> Result<Option<String>> {
        self.record(EnvOp::PeerRelationId)?;
        if let Some(relid) = &self.overrides.borrow().peer_relation {
            return Ok(Some(relid.clone()));
        }
        Ok(self.state.borrow().peer_relation.clone())
    }

    fn get_relation_data(&self, relid: &str, unit: &str) -> Result<Settings> {
        self.record(EnvOp::GetRelationData)?;
        let state = self.state.borrow();
        let relation = state.relations.get(relid).ok_or_else(|| {
            ContextError::transport(
                EnvOp::GetRelationData.name(),
                format!("relation '{}' not found", relid),
            )
        })?;
        Ok(relation.data.get(unit).cloned().unwrap_or_default())
    }

    fn set_relation_data(&self, relid: &str, data: &SettingsUpdate) -> Result<()> {
        self.record(EnvOp::SetRelationData)?;
        let local_unit = self.effective_local_unit();
        let mut state = self.state.borrow_mut();
        let relation = state.relations.get_mut(relid).ok_or_else(|| {
            ContextError::transport(
                EnvOp::SetRelationData.name(),
                format!("relation '{}' not found", relid),
            )
        })?;
        apply_update(relation.data.entry(local_unit).or_default(), data);
        Ok(())
    }

    fn is_leader(&self) -> Result<bool> {
        self.record(EnvOp::IsLeader)?;
        Ok(self.state.borrow().is_leader)
    }

    fn get_leader_settings(&self) -> Result<Settings> {
        self.record(EnvOp::GetLeaderSettings)?;
        Ok(self.state.borrow().leader_settings.clone())
    }

    fn set_leader_settings(&self, data: &SettingsUpdate) -> Result<()> {
        self.record(EnvOp::SetLeaderSettings)?;
        let mut state = self.state.borrow_mut();
        if !state.is_leader {
            return Err(ContextError::transport(
                EnvOp::SetLeaderSettings.name(),
                "cannot write leader settings: not the leader",
            ));
        }
        apply_update(&mut state.leader_settings, data);
        Ok(())
    }
}
