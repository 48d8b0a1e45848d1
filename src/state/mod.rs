//! State module for tracking crawl targets
//!
//! - `TargetState`: the lifecycle of a single URL within a crawl session

mod target_state;

pub use target_state::TargetState;
