pub mod engine;

pub use engine::{EntityCounts, SyncEngine, SyncSummary};
