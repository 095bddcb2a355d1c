use super::render;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use relctx::{EnvConfig, HookContext, MemoryEnvironment};
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::info;

#[derive(Parser)]
#[command(name = "relctx")]
#[command(about = "Inspect and edit relation data and leader settings of a hook environment snapshot")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// JSON environment snapshot (defaults to $RELCTX_SNAPSHOT)
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Act as this unit instead of the snapshot's local unit
    #[arg(long, global = true)]
    pub unit: Option<String>,

    /// Treat this relation id as the peer relation
    #[arg(long, global = true)]
    pub peer_relation: Option<String>,

    /// Do not write changes back to the snapshot
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print every relation, its instances, units and peers
    Relations,
    /// Read one unit's record on a relation, or a single key of it
    RelationGet {
        relid: String,
        unit: String,
        key: Option<String>,
    },
    /// Write a key on the local unit's record; omit the value to delete
    RelationSet {
        relid: String,
        key: String,
        value: Option<String>,
    },
    /// Read the leader settings, or a single key of them
    LeaderGet { key: Option<String> },
    /// Write a leader setting; omit the value to delete
    LeaderSet { key: String, value: Option<String> },
}

impl Command {
    fn writes(&self) -> bool {
        matches!(self, Self::RelationSet { .. } | Self::LeaderSet { .. })
    }
}

pub struct App {
    config: EnvConfig,
    env: Rc<MemoryEnvironment>,
}

impl App {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = EnvConfig::from_env().write_back(!cli.dry_run);
        if let Some(path) = &cli.snapshot {
            config = config.snapshot_path(path);
        }
        if let Some(unit) = &cli.unit {
            config = config.local_unit(unit);
        }
        if let Some(relid) = &cli.peer_relation {
            config = config.peer_relation(relid);
        }
        Self::open(config)
    }

    pub fn open(config: EnvConfig) -> Result<Self> {
        let env = config.open().with_context(|| {
            format!("failed to open environment snapshot {:?}", config.snapshot_path)
        })?;
        Ok(Self {
            config,
            env: Rc::new(env),
        })
    }

    pub fn run(&self, command: &Command, out: &mut impl Write) -> Result<()> {
        let ctx = HookContext::new(self.env.clone());

        match command {
            Command::Relations => {
                let rels = ctx.relations()?;
                render::relation_set(&rels, out)?;
            }
            Command::RelationGet { relid, unit, key } => {
                let record = ctx.unit_record(relid, unit)?;
                match key {
                    Some(key) => writeln!(out, "{}", record.require(key)?)?,
                    None => render::settings(&record.to_map()?, out)?,
                }
            }
            Command::RelationSet { relid, key, value } => {
                let relation = ctx.relation(relid)?;
                let local = relation.local();
                local
                    .set(key, value.as_deref())
                    .with_context(|| format!("failed to write '{}' on {}", key, local))?;
            }
            Command::LeaderGet { key } => {
                let leader = ctx.leader();
                match key {
                    Some(key) => writeln!(out, "{}", leader.require(key)?)?,
                    None => render::settings(&leader.to_map()?, out)?,
                }
            }
            Command::LeaderSet { key, value } => {
                ctx.leader()
                    .set(key, value.as_deref())
                    .with_context(|| format!("failed to write leader setting '{}'", key))?;
            }
        }

        if command.writes() {
            self.config.persist(&self.env)?;
            if self.config.write_back {
                info!(snapshot = ?self.config.snapshot_path, "saved environment snapshot");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relctx::Settings;

    const SNAPSHOT: &str = r#"{
        "local_unit": "app/0",
        "peer_relation": "cluster:0",
        "is_leader": false,
        "relations": {
            "db:3": {
                "units": ["postgresql/0"],
                "data": {"postgresql/0": {"host": "10.0.0.5"}}
            },
            "cluster:0": {"units": ["app/1"]}
        },
        "leader_settings": {"cluster-id": "c1"}
    }"#;

    fn app(dir: &tempfile::TempDir) -> App {
        let path = dir.path().join("env.json");
        std::fs::write(&path, SNAPSHOT).unwrap();
        App::open(EnvConfig::new(path)).unwrap()
    }

    fn run(app: &App, command: Command) -> Result<String> {
        let mut out = Vec::new();
        app.run(&command, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_relation_get_key() {
        let dir = tempfile::tempdir().unwrap();
        let out = run(
            &app(&dir),
            Command::RelationGet {
                relid: "db:3".into(),
                unit: "postgresql/0".into(),
                key: Some("host".into()),
            },
        )
        .unwrap();
        assert_eq!(out, "10.0.0.5\n");
    }

    #[test]
    fn test_relation_set_persists() {
        let dir = tempfile::tempdir().unwrap();
        run(
            &app(&dir),
            Command::RelationSet {
                relid: "db:3".into(),
                key: "database".into(),
                value: Some("app".into()),
            },
        )
        .unwrap();

        let reloaded = MemoryEnvironment::load(dir.path().join("env.json")).unwrap();
        let mut expected = Settings::new();
        expected.insert("database".into(), "app".into());
        assert_eq!(reloaded.unit_data("db:3", "app/0"), Some(expected));
    }

    #[test]
    fn test_leader_set_refused_when_not_leader() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(
            &app(&dir),
            Command::LeaderSet {
                key: "k".into(),
                value: Some("v".into()),
            },
        )
        .unwrap_err();
        let cause = err.downcast_ref::<relctx::ContextError>().unwrap();
        assert!(cause.is_permission_denied());
    }

    #[test]
    fn test_leader_get_all() {
        let dir = tempfile::tempdir().unwrap();
        let out = run(&app(&dir), Command::LeaderGet { key: None }).unwrap();
        assert!(out.contains("\"cluster-id\": \"c1\""));
    }
}
