//! # Beacon State Metrics
//!
//! Prometheus counters for state mutation traffic.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! bn-04-beacon-state = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `beacon_state_field_updates_total` - Counter of applied field updates (by field)
//! - `beacon_state_field_rejections_total` - Counter of rejected field updates (by field)
//! - `beacon_state_batch_commits_total` - Counter of committed multi-field batches
//! - `beacon_state_snapshots_total` - Counter of snapshots taken
//! - `beacon_state_root_mismatches_total` - Counter of failed full-rehash verifications

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Applied field updates, labeled by field name
    pub static ref FIELD_UPDATES: IntCounterVec = register_int_counter_vec!(
        "beacon_state_field_updates_total",
        "Total number of applied state field updates",
        &["field"]
    )
    .expect("Failed to create FIELD_UPDATES metric");

    /// Rejected field updates, labeled by field name
    pub static ref FIELD_REJECTIONS: IntCounterVec = register_int_counter_vec!(
        "beacon_state_field_rejections_total",
        "Total number of rejected state field updates",
        &["field"]
    )
    .expect("Failed to create FIELD_REJECTIONS metric");

    pub static ref BATCH_COMMITS: IntCounter = register_int_counter!(
        "beacon_state_batch_commits_total",
        "Total number of committed field batches"
    )
    .expect("Failed to create BATCH_COMMITS metric");

    pub static ref SNAPSHOTS: IntCounter = register_int_counter!(
        "beacon_state_snapshots_total",
        "Total number of state snapshots taken"
    )
    .expect("Failed to create SNAPSHOTS metric");

    pub static ref ROOT_MISMATCHES: IntCounter = register_int_counter!(
        "beacon_state_root_mismatches_total",
        "Total number of cached roots that diverged from a full rehash"
    )
    .expect("Failed to create ROOT_MISMATCHES metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_field_update(field: &str) {
    FIELD_UPDATES.with_label_values(&[field]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_field_rejected(field: &str) {
    FIELD_REJECTIONS.with_label_values(&[field]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_batch_commit() {
    BATCH_COMMITS.inc();
}

#[cfg(feature = "metrics")]
pub fn record_snapshot() {
    SNAPSHOTS.inc();
}

#[cfg(feature = "metrics")]
pub fn record_root_mismatch() {
    ROOT_MISMATCHES.inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_field_update(_field: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_field_rejected(_field: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_batch_commit() {}

#[cfg(not(feature = "metrics"))]
pub fn record_snapshot() {}

#[cfg(not(feature = "metrics"))]
pub fn record_root_mismatch() {}
