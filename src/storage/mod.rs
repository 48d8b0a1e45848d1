//! Storage module for crawl session membership
//!
//! The only shared mutable record a crawl keeps is the set of URLs already
//! claimed. Two in-memory backends are provided:
//! - `MemoryVisitStore`: one mutex around a `HashSet` (the default)
//! - `ShardedVisitStore`: a `DashSet` for heavily concurrent crawls

mod memory;
mod sharded;
mod traits;

pub use memory::MemoryVisitStore;
pub use sharded::ShardedVisitStore;
pub use traits::VisitStore;
