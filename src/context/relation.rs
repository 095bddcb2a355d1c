use std::fmt;
use std::ops::Index;
use std::rc::Rc;
use indexmap::IndexMap;
use tracing::trace;
use super::UnitRecord;
use crate::core::{RelationId, Result, UnitId};
use crate::env::HookEnvironment;

pub type UnitMap = IndexMap<String, UnitRecord>;

/// One relation id: the remote units on it, the local unit's record and,
/// when the service has a peer relation, the peers' records on it.
///
/// The instance itself maps remote unit ids to their records, ordered by
/// unit number.
pub struct RelationInstance {
    relid: RelationId,
    service: String,
    local: UnitRecord,
    units: UnitMap,
    peers: Option<UnitMap>,
}

impl RelationInstance {
    pub fn new(env: Rc<dyn HookEnvironment>, relid: &str) -> Result<Self> {
        let local = UnitId::parse(&env.local_unit()?)?;
        let peer_relid = env
            .peer_relation_id()?
            .map(|id| RelationId::parse(&id))
            .transpose()?;
        Self::build(env, RelationId::parse(relid)?, &local, peer_relid.as_ref())
    }

    pub(crate) fn build(
        env: Rc<dyn HookEnvironment>,
        relid: RelationId,
        local: &UnitId,
        peer_relid: Option<&RelationId>,
    ) -> Result<Self> {
        // By unit number alone; ties keep transport order.
        let mut remote = parse_units(env.list_related_units(relid.as_str())?)?;
        remote.sort_by_key(UnitId::number);

        let units: UnitMap = remote
            .into_iter()
            .map(|unit| {
                let key = unit.as_str().to_string();
                (key, UnitRecord::with_local(env.clone(), relid.clone(), unit, local))
            })
            .collect();

        let service = units
            .values()
            .next()
            .map(|record| record.service().to_string())
            .unwrap_or_else(|| local.service().to_string());

        // On the peer relation itself the remote units already are the peers.
        let peers = match peer_relid {
            Some(peer_relid) if peer_relid != &relid => {
                let members = parse_units(env.list_related_units(peer_relid.as_str())?)?;
                Some(
                    members
                        .into_iter()
                        .filter(|unit| unit != local)
                        .map(|unit| {
                            let key = unit.as_str().to_string();
                            (key, UnitRecord::with_local(env.clone(), relid.clone(), unit, local))
                        })
                        .collect::<UnitMap>(),
                )
            }
            _ => None,
        };

        let local = UnitRecord::with_local(env, relid.clone(), local.clone(), local);
        let instance = Self {
            relid,
            service,
            local,
            units,
            peers,
        };
        trace!(
            relation = %instance,
            units = instance.units.len(),
            peers = ?instance.peers.as_ref().map(IndexMap::len),
            "built relation instance"
        );
        Ok(instance)
    }

    pub fn relid(&self) -> &str {
        self.relid.as_str()
    }

    pub fn relname(&self) -> &str {
        self.relid.name()
    }

    /// Service on the remote side, or the local service when no remote
    /// unit has joined yet
    pub fn service(&self) -> &str {
        &self.service
    }

    /// The local unit's own, writable record on this relation
    pub fn local(&self) -> &UnitRecord {
        &self.local
    }

    /// Peers' records on this relation.
    ///
    /// `None` when there is no peer relation, or when this is the peer
    /// relation. An empty map means the peer relation exists but no peer
    /// has joined.
    pub fn peers(&self) -> Option<&UnitMap> {
        self.peers.as_ref()
    }

    pub fn get(&self, unit: &str) -> Option<&UnitRecord> {
        self.units.get(unit)
    }

    pub fn contains_unit(&self, unit: &str) -> bool {
        self.units.contains_key(unit)
    }

    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, UnitRecord> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

fn parse_units(raw: Vec<String>) -> Result<Vec<UnitId>> {
    raw.iter().map(|unit| UnitId::parse(unit)).collect()
}

impl Index<&str> for RelationInstance {
    type Output = UnitRecord;

    fn index(&self, unit: &str) -> &UnitRecord {
        &self.units[unit]
    }
}

impl<'a> IntoIterator for &'a RelationInstance {
    type Item = (&'a String, &'a UnitRecord);
    type IntoIter = indexmap::map::Iter<'a, String, UnitRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}

impl fmt::Display for RelationInstance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.relid, self.service)
    }
}

impl fmt::Debug for RelationInstance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RelationInstance")
            .field("relid", &self.relid.as_str())
            .field("service", &self.service)
            .field("local", &self.local)
            .field("units", &self.units.keys().collect::<Vec<_>>())
            .field(
                "peers",
                &self.peers.as_ref().map(|p| p.keys().collect::<Vec<_>>()),
            )
            .finish()
    }
}
