pub mod phase;
pub mod queue;

pub use phase::Phase;
pub use queue::{CachedQueue, PendingRow, Queue};
