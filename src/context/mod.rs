//! Ordered views over relation data and leader settings.
//!
//! `RelationSet` → `RelationType` → `RelationInstance` → `UnitRecord`,
//! plus the independent `LeaderSettings`. Everything shares one
//! `Rc<dyn HookEnvironment>` and is confined to the thread that built it.

mod record;

pub mod leader;
pub mod relation;
pub mod relations;
pub mod unit;

pub use leader::LeaderSettings;
pub use relation::{RelationInstance, UnitMap};
pub use relations::{RelationSet, RelationType};
pub use unit::UnitRecord;
