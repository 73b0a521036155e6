//! # Integration Flows
//!
//! Drive the state container the way a beacon node does across slots, epochs
//! and forks, checking the cached root against a full rehash at every step.

pub mod concurrency;
pub mod state_lifecycle;
