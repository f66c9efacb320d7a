//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `RegionState`: lifecycle of one region's pagination walk
//! - `DomainState`: per-domain request history used for pacing
//! - `CheckpointStore`: the persisted work list and completed-regions set

mod checkpoint;
mod domain_state;
mod region_state;

// Re-export main types
pub use checkpoint::{
    load_region_states, CheckpointError, CheckpointResult, CheckpointStore, CompletedRegions,
    RegionCheckpoint,
};
pub use domain_state::DomainState;
pub use region_state::RegionState;
