//! # Domain Entities for the Beacon State
//!
//! Composite records stored in the beacon state fields.
//!
//! ## Type Decisions
//!
//! - Epochs, slots, balances and indices are plain `u64`, matching their
//!   SSZ `uint64` encoding.
//! - Bitfields use `bitvec` with `Lsb0` ordering so that bit `i` lands in
//!   byte `i / 8` at position `i % 8`, which is the SSZ packing order.

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

pub type Hash = [u8; 32];
pub type Version = [u8; 4];
pub type BlsPubkey = [u8; 48];

/// The 32-byte zero chunk.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Epoch value for "not scheduled".
pub const FAR_FUTURE_EPOCH: u64 = u64::MAX;

/// Number of bits in the justification bitvector.
pub const JUSTIFICATION_BITS_LENGTH: usize = 4;

/// Justification bits (`Bitvector[4]`). Only the low four bits are meaningful.
pub type JustificationBits = BitArray<[u8; 1], Lsb0>;

/// Attestation aggregation bits (`Bitlist[MAX_VALIDATORS_PER_COMMITTEE]`).
pub type AggregationBits = BitVec<u8, Lsb0>;

/// Fork versioning data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fork {
    pub previous_version: Version,
    pub current_version: Version,
    /// Epoch at which `current_version` activates.
    pub epoch: u64,
}

/// A (epoch, block root) pair used for finality bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checkpoint {
    pub epoch: u64,
    pub root: Hash,
}

impl Checkpoint {
    pub fn new(epoch: u64, root: Hash) -> Self {
        Self { epoch, root }
    }
}

/// Header of the most recently processed block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconBlockHeader {
    pub slot: u64,
    pub parent_root: Hash,
    pub state_root: Hash,
    pub body_root: Hash,
}

/// Deposit contract snapshot voted on by proposers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eth1Data {
    pub deposit_root: Hash,
    pub deposit_count: u64,
    pub block_hash: Hash,
}

/// A registered validator.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    #[serde_as(as = "Bytes")]
    pub pubkey: BlsPubkey,
    pub withdrawal_credentials: Hash,
    pub effective_balance: u64,
    pub slashed: bool,
    pub activation_eligibility_epoch: u64,
    pub activation_epoch: u64,
    pub exit_epoch: u64,
    pub withdrawable_epoch: u64,
}

impl Validator {
    /// Create a validator that is not yet scheduled for activation or exit.
    pub fn new(pubkey: BlsPubkey, withdrawal_credentials: Hash, effective_balance: u64) -> Self {
        Self {
            pubkey,
            withdrawal_credentials,
            effective_balance,
            slashed: false,
            activation_eligibility_epoch: FAR_FUTURE_EPOCH,
            activation_epoch: FAR_FUTURE_EPOCH,
            exit_epoch: FAR_FUTURE_EPOCH,
            withdrawable_epoch: FAR_FUTURE_EPOCH,
        }
    }

    /// Builder method to set the activation epoch.
    pub fn with_activation_epoch(mut self, epoch: u64) -> Self {
        self.activation_epoch = epoch;
        self
    }

    /// Check if the validator is active at `epoch`.
    pub fn is_active_at(&self, epoch: u64) -> bool {
        self.activation_epoch <= epoch && epoch < self.exit_epoch
    }
}

/// Vote content of an attestation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationData {
    pub slot: u64,
    /// Committee index within the slot.
    pub index: u64,
    pub beacon_block_root: Hash,
    pub source: Checkpoint,
    pub target: Checkpoint,
}

/// An attestation included in a block and awaiting epoch processing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAttestation {
    pub aggregation_bits: AggregationBits,
    pub data: AttestationData,
    pub inclusion_delay: u64,
    pub proposer_index: u64,
}
