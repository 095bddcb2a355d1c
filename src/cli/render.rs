use anyhow::Result;
use relctx::{RelationSet, Settings};
use std::io::Write;

/// Print the relation tree without touching any unit's data.
pub fn relation_set(rels: &RelationSet, out: &mut impl Write) -> Result<()> {
    if rels.is_empty() {
        writeln!(out, "(no relations)")?;
        return Ok(());
    }

    for (name, relation_type) in rels {
        writeln!(out, "{}", name)?;
        for (_, instance) in relation_type {
            writeln!(out, "  {}", instance)?;
            writeln!(out, "    local: {}", instance.local().unit())?;
            let units: Vec<&str> = instance.units().collect();
            writeln!(out, "    units: {}", join_or_dash(&units))?;
            match instance.peers() {
                Some(peers) => {
                    let peers: Vec<&str> = peers.keys().map(String::as_str).collect();
                    writeln!(out, "    peers: {}", join_or_dash(&peers))?;
                }
                None => writeln!(out, "    peers: no peer relation")?,
            }
        }
    }
    Ok(())
}

pub fn settings(data: &Settings, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(data)?)?;
    Ok(())
}

fn join_or_dash(items: &[&str]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relctx::{EnvOp, MemoryEnvironment};
    use std::rc::Rc;

    #[test]
    fn test_relation_tree_is_lazy() {
        let env = Rc::new(
            MemoryEnvironment::new("app/0")
                .with_relation("db:3", &["postgresql/1", "postgresql/0"])
                .with_relation("cluster:0", &[])
                .with_peer_relation("cluster:0")
                .with_unit_data("db:3", "postgresql/0", &[("host", "10.0.0.5")]),
        );
        let rels = RelationSet::new(env.clone()).unwrap();
        let mut out = Vec::new();
        relation_set(&rels, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "cluster\n\
             \x20 cluster:0 (app)\n\
             \x20   local: app/0\n\
             \x20   units: -\n\
             \x20   peers: no peer relation\n\
             db\n\
             \x20 db:3 (postgresql)\n\
             \x20   local: app/0\n\
             \x20   units: postgresql/0, postgresql/1\n\
             \x20   peers: -\n"
        );
        assert_eq!(env.calls(EnvOp::GetRelationData), 0);
    }

    #[test]
    fn test_empty_tree() {
        let env = Rc::new(MemoryEnvironment::new("app/0"));
        let rels = RelationSet::new(env).unwrap();
        let mut out = Vec::new();
        relation_set(&rels, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "(no relations)\n");
    }
}
