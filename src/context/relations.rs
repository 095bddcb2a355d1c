use std::fmt;
use std::ops::Index;
use std::rc::Rc;
use indexmap::IndexMap;
use tracing::{debug, trace};
use super::RelationInstance;
use crate::core::{RelationId, RelationName, Result, UnitId};
use crate::env::HookEnvironment;

/// Every instance of one relation name, ordered by instance number
/// (`rel:9` before `rel:10`).
pub struct RelationType {
    name: RelationName,
    instances: IndexMap<String, RelationInstance>,
}

impl RelationType {
    pub fn new(env: Rc<dyn HookEnvironment>, name: &str) -> Result<Self> {
        let local = UnitId::parse(&env.local_unit()?)?;
        let peer_relid = env
            .peer_relation_id()?
            .map(|id| RelationId::parse(&id))
            .transpose()?;
        Self::build(env, name, &local, peer_relid.as_ref())
    }

    pub(crate) fn build(
        env: Rc<dyn HookEnvironment>,
        name: &str,
        local: &UnitId,
        peer_relid: Option<&RelationId>,
    ) -> Result<Self> {
        let mut relids = env
            .list_relation_ids(name)?
            .iter()
            .map(|relid| RelationId::parse(relid))
            .collect::<Result<Vec<_>>>()?;
        relids.sort();
        trace!(relation = name, ids = relids.len(), "enumerated relation ids");

        let mut instances = IndexMap::with_capacity(relids.len());
        for relid in relids {
            let key = relid.as_str().to_string();
            let instance = RelationInstance::build(env.clone(), relid, local, peer_relid)?;
            instances.insert(key, instance);
        }

        Ok(Self {
            name: name.to_string(),
            instances,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, relid: &str) -> Option<&RelationInstance> {
        self.instances.get(relid)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.instances.keys().map(String::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, RelationInstance> {
        self.instances.iter()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Every relation the local unit takes part in, ordered by name.
///
/// Building a set enumerates relation names, relation ids and related
/// units. No unit's data is fetched until a record is read. The set is a
/// snapshot of one logical operation; build a new one to see changes.
pub struct RelationSet {
    relation_types: IndexMap<RelationName, RelationType>,
}

impl RelationSet {
    pub fn new(env: Rc<dyn HookEnvironment>) -> Result<Self> {
        let local = UnitId::parse(&env.local_unit()?)?;
        let peer_relid = env
            .peer_relation_id()?
            .map(|id| RelationId::parse(&id))
            .transpose()?;

        let mut names = env.list_relation_types()?;
        names.sort();
        names.dedup();

        let mut relation_types = IndexMap::with_capacity(names.len());
        for name in names {
            let relation_type = RelationType::build(env.clone(), &name, &local, peer_relid.as_ref())?;
            relation_types.insert(name, relation_type);
        }

        debug!(
            unit = local.as_str(),
            relations = relation_types.len(),
            "built relation set"
        );
        Ok(Self { relation_types })
    }

    pub fn get(&self, name: &str) -> Option<&RelationType> {
        self.relation_types.get(name)
    }

    /// Look up an instance by its relation id
    pub fn instance(&self, relid: &str) -> Option<&RelationInstance> {
        let name = relid.split_once(':').map_or(relid, |(name, _)| name);
        self.get(name)?.get(relid)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.relation_types.keys().map(String::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, RelationType> {
        self.relation_types.iter()
    }

    pub fn len(&self) -> usize {
        self.relation_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relation_types.is_empty()
    }
}

impl Index<&str> for RelationType {
    type Output = RelationInstance;

    fn index(&self, relid: &str) -> &RelationInstance {
        &self.instances[relid]
    }
}

impl Index<&str> for RelationSet {
    type Output = RelationType;

    fn index(&self, name: &str) -> &RelationType {
        &self.relation_types[name]
    }
}

impl<'a> IntoIterator for &'a RelationType {
    type Item = (&'a String, &'a RelationInstance);
    type IntoIter = indexmap::map::Iter<'a, String, RelationInstance>;

    fn into_iter(self) -> Self::IntoIter {
        self.instances.iter()
    }
}

impl<'a> IntoIterator for &'a RelationSet {
    type Item = (&'a String, &'a RelationType);
    type IntoIter = indexmap::map::Iter<'a, String, RelationType>;

    fn into_iter(self) -> Self::IntoIter {
        self.relation_types.iter()
    }
}

impl fmt::Debug for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.instances.iter()).finish()
    }
}

impl fmt::Debug for RelationSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.relation_types.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MemoryEnvironment;

    #[test]
    fn test_instance_lookup_by_relid() {
        let env = Rc::new(
            MemoryEnvironment::new("foo/1")
                .with_relation("db:4", &["pg/0"])
                .with_relation("cache:1", &[]),
        );
        let rels = RelationSet::new(env).unwrap();
        assert_eq!(rels.instance("db:4").unwrap().service(), "pg");
        assert!(rels.instance("db:5").is_none());
        assert!(rels.instance("nope").is_none());
    }

    #[test]
    fn test_relation_type_standalone() {
        let env = Rc::new(
            MemoryEnvironment::new("foo/1")
                .with_relation("db:11", &[])
                .with_relation("db:2", &[]),
        );
        let db = RelationType::new(env, "db").unwrap();
        assert_eq!(db.name(), "db");
        assert_eq!(db.keys().collect::<Vec<_>>(), vec!["db:2", "db:11"]);
    }

    #[test]
    fn test_empty_set() {
        let env = Rc::new(MemoryEnvironment::new("foo/1"));
        let rels = RelationSet::new(env).unwrap();
        assert!(rels.is_empty());
        assert_eq!(rels.len(), 0);
    }
}
