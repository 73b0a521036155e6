//! # Beacon State Benchmarks
//!
//! | Subsystem | Claim | Target |
//! |-----------|-------|--------|
//! | bn-04 Beacon State | Single field update | O(log 20) hashes, independent of registry size |
//! | bn-04 Beacon State | Snapshot | Constant in registry size |

use bn_tests::benchmarks::bn_04_beacon_state;
use criterion::{criterion_group, criterion_main};

criterion_group!(benches, bn_04_beacon_state::register_benchmarks);

criterion_main!(benches);
