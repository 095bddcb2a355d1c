//! Everything a hook needs in one import.
//!
//! ```
//! use relctx::prelude::*;
//! ```

pub use crate::context::{LeaderSettings, RelationInstance, RelationSet, RelationType, UnitRecord};
pub use crate::core::{ContextError, Result, Value};
pub use crate::env::{HookEnvironment, MemoryEnvironment};
pub use crate::HookContext;
