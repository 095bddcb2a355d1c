// ============================================================================
// relctx Library
// ============================================================================

pub mod core;
pub mod env;
pub mod context;
pub mod config;
pub mod prelude;

// Re-export main types for convenience
pub use crate::core::{ContextError, RelationId, Result, UnitId, Value};
pub use crate::env::{HookEnvironment, MemoryEnvironment, Settings, SettingsUpdate};
pub use crate::env::memory::{EnvOp, EnvironmentSnapshot, RelationSnapshot};
pub use crate::context::{LeaderSettings, RelationInstance, RelationSet, RelationType, UnitRecord};
pub use crate::config::EnvConfig;

// ============================================================================
// Hook context
// ============================================================================

use std::rc::Rc;

/// Entry point for one logical operation (one hook run, one CLI command).
///
/// Holds the environment handle and hands out fresh views over it. Views
/// cache what they fetch, so build a new one when fresh data is needed.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use relctx::{HookContext, MemoryEnvironment};
///
/// # fn main() -> relctx::Result<()> {
/// let env = Rc::new(
///     MemoryEnvironment::new("app/0")
///         .with_relation("db:3", &["postgresql/0"])
///         .with_unit_data("db:3", "postgresql/0", &[("host", "10.0.0.5")]),
/// );
/// let ctx = HookContext::new(env);
///
/// let rels = ctx.relations()?;
/// let db = &rels["db"]["db:3"];
/// assert_eq!(db.to_string(), "db:3 (postgresql)");
/// assert_eq!(db["postgresql/0"].get("host")?.as_deref(), Some("10.0.0.5"));
///
/// db.local().set("database", "app")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HookContext {
    env: Rc<dyn HookEnvironment>,
}

impl HookContext {
    pub fn new(env: Rc<dyn HookEnvironment>) -> Self {
        Self { env }
    }

    pub fn env(&self) -> &Rc<dyn HookEnvironment> {
        &self.env
    }

    /// Enumerate every relation, without fetching any unit data
    pub fn relations(&self) -> Result<RelationSet> {
        RelationSet::new(self.env.clone())
    }

    /// A single relation instance
    pub fn relation(&self, relid: &str) -> Result<RelationInstance> {
        RelationInstance::new(self.env.clone(), relid)
    }

    /// One unit's record on one relation instance
    pub fn unit_record(&self, relid: &str, unit: &str) -> Result<UnitRecord> {
        UnitRecord::open(self.env.clone(), relid, unit)
    }

    pub fn leader(&self) -> LeaderSettings {
        LeaderSettings::new(self.env.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> (Rc<MemoryEnvironment>, HookContext) {
        let env = Rc::new(
            MemoryEnvironment::new("app/0")
                .with_relation("db:3", &["postgresql/0"])
                .with_leader_setting("cluster-id", "c1"),
        );
        (env.clone(), HookContext::new(env))
    }

    #[test]
    fn test_context_views_share_environment() {
        let (env, ctx) = ctx();
        let rels = ctx.relations().unwrap();
        assert_eq!(rels.keys().collect::<Vec<_>>(), vec!["db"]);
        assert_eq!(ctx.leader().require("cluster-id").unwrap(), "c1");
        assert_eq!(env.calls(EnvOp::GetLeaderSettings), 1);
    }

    #[test]
    fn test_context_unit_record() {
        let (_, ctx) = ctx();
        let record = ctx.unit_record("db:3", "app/0").unwrap();
        assert!(record.is_writable());
        assert_eq!(ctx.relation("db:3").unwrap().len(), 1);
    }
}
