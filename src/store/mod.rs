//! Store access: the connection manager, the prepare gate and statement
//! templates.

pub mod gate;
pub mod manager;
pub mod template;

pub use gate::PrepareGate;
pub use manager::{ConnectionManager, WriteMode, WriteOutcome};
pub use template::{BoundInsert, SUMMARIES_TABLE, SUMMARY_COLUMNS, StatementTemplate};
