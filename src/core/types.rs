use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use super::{ContextError, Result};

pub type RelationName = String;

/// Relation instance identifier, `<name>:<n>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationId {
    raw: String,
    name_len: usize,
    number: u64,
}

impl RelationId {
    pub fn parse(raw: &str) -> Result<Self> {
        let (name, number) = split_numbered(raw, ':')?;
        Ok(Self {
            raw: raw.to_string(),
            name_len: name.len(),
            number,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Relation name, the part before `:`.
    pub fn name(&self) -> &str {
        &self.raw[..self.name_len]
    }

    pub fn number(&self) -> u64 {
        self.number
    }
}

/// Unit identifier, `<service>/<n>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitId {
    raw: String,
    service_len: usize,
    number: u64,
}

impl UnitId {
    pub fn parse(raw: &str) -> Result<Self> {
        let (service, number) = split_numbered(raw, '/')?;
        Ok(Self {
            raw: raw.to_string(),
            service_len: service.len(),
            number,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn service(&self) -> &str {
        &self.raw[..self.service_len]
    }

    pub fn number(&self) -> u64 {
        self.number
    }
}

fn split_numbered(raw: &str, separator: char) -> Result<(&str, u64)> {
    let (prefix, suffix) = raw
        .split_once(separator)
        .ok_or_else(|| ContextError::MalformedId(raw.to_string()))?;
    if prefix.is_empty() {
        return Err(ContextError::MalformedId(raw.to_string()));
    }
    let number = suffix
        .parse::<u64>()
        .map_err(|_| ContextError::MalformedId(raw.to_string()))?;
    Ok((prefix, number))
}

// Numeric ordering on the instance counter: `rel:9` < `rel:10`.
impl Ord for RelationId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name()
            .cmp(other.name())
            .then(self.number.cmp(&other.number))
    }
}

impl PartialOrd for RelationId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for RelationId {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl FromStr for UnitId {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_id_parts() {
        let relid = RelationId::parse("db:12").unwrap();
        assert_eq!(relid.name(), "db");
        assert_eq!(relid.number(), 12);
        assert_eq!(relid.to_string(), "db:12");
    }

    #[test]
    fn test_unit_id_parts() {
        let unit = UnitId::parse("svc_rel/9").unwrap();
        assert_eq!(unit.service(), "svc_rel");
        assert_eq!(unit.number(), 9);
    }

    #[test]
    fn test_numeric_ordering() {
        let mut ids: Vec<RelationId> = ["rel:10", "rel:9", "rel:100"]
            .iter()
            .map(|s| RelationId::parse(s).unwrap())
            .collect();
        ids.sort();
        let ordered: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(ordered, vec!["rel:9", "rel:10", "rel:100"]);
    }

    #[test]
    fn test_malformed_ids() {
        assert!(RelationId::parse("rel").is_err());
        assert!(RelationId::parse(":3").is_err());
        assert!(RelationId::parse("rel:x").is_err());
        assert!(UnitId::parse("svc-3").is_err());
        assert!(matches!(
            UnitId::parse("svc/-1"),
            Err(ContextError::MalformedId(_))
        ));
    }
}
