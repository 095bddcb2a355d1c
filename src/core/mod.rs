pub mod error;
pub mod types;
pub mod value;

pub use error::{ContextError, Result};
pub use types::{RelationId, RelationName, UnitId};
pub use value::{Value, validate_value};
