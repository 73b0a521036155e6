//! # bn-04-beacon-state
//!
//! Beacon chain state container with an incrementally maintained SSZ root.
//!
//! ## Role in System
//!
//! - **Single Source of Truth**: Holds the 20 top-level fields of the beacon state
//! - **Incremental Commitment**: Caches a binary merkle tree over the field roots so
//!   a mutation rehashes one leaf and its `ceil(log2(20)) = 5` ancestors
//! - **Fork Choice Support**: Cheap snapshots share collection values and copy only
//!   the small tree
//!
//! ## Tree Layout
//!
//! ```text
//! layer 5   root
//! layer 4   [0..16)  H([16..20), Z3)
//! layer 3   [0..8)   [8..16)  H([16..20), Z2)
//! layer 2   [0..4)   [4..8)   [8..12)  [12..16)  [16..20)
//! layer 1   [0,1] [2,3] ... [18,19]                   (10 nodes)
//! layer 0   L0 L1 ... L19                             (field roots)
//! ```
//!
//! `Zk` is the root of an all-zero subtree of depth `k`.
//!
//! Missing right siblings at layer `k` hash as the root of an all-zero subtree of
//! depth `k`, so the root equals canonical SSZ merkleization of the container.
//!
//! ## Concurrency
//!
//! [`StateContainer`] guards state and tree with one `parking_lot::RwLock`.
//! Any number of readers, one writer, and no reader ever sees a leaf without its
//! recomputed ancestors.

pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;

pub use config::*;
pub use domain::*;
pub use ports::*;
