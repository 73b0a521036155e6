//! Driving ports.

pub mod api;

pub use api::*;
