//! # Beacon State Fields
//!
//! The field store: the raw values of all top-level state fields, plus a
//! typed descriptor per field.
//!
//! ## Field Identity
//!
//! `FieldIndex` fixes the canonical order of the fields; the order determines
//! each field's leaf position in the state tree. Each field also has a
//! zero-sized marker type in [`field`] implementing [`StateField`], which
//! ties together the index, the value type, the hasher and the accessors:
//!
//! ```rust,ignore
//! container.set::<field::Slot>(42)?;
//! let mixes = container.get::<field::RandaoMixes>();
//! ```
//!
//! ## Sharing
//!
//! Collection fields are held behind `Arc`. Cloning a `BeaconState` copies
//! pointers, not validator registries; setters replace the `Arc` wholesale.

use super::{
    ssz, BeaconBlockHeader, Checkpoint, Eth1Data, Fork, Hash, HashError, JustificationBits,
    PendingAttestation, StateError, Validator, ZERO_HASH,
};
use crate::config::BeaconConfig;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Number of top-level fields in the beacon state.
pub const FIELD_COUNT: usize = 20;

/// Leaf position of each state field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(usize)]
pub enum FieldIndex {
    GenesisTime = 0,
    Slot,
    Fork,
    LatestBlockHeader,
    BlockRoots,
    StateRoots,
    HistoricalRoots,
    Eth1Data,
    Eth1DataVotes,
    Eth1DepositIndex,
    Validators,
    Balances,
    RandaoMixes,
    Slashings,
    PreviousEpochAttestations,
    CurrentEpochAttestations,
    JustificationBits,
    PreviousJustifiedCheckpoint,
    CurrentJustifiedCheckpoint,
    FinalizedCheckpoint,
}

impl FieldIndex {
    pub const ALL: [FieldIndex; FIELD_COUNT] = [
        FieldIndex::GenesisTime,
        FieldIndex::Slot,
        FieldIndex::Fork,
        FieldIndex::LatestBlockHeader,
        FieldIndex::BlockRoots,
        FieldIndex::StateRoots,
        FieldIndex::HistoricalRoots,
        FieldIndex::Eth1Data,
        FieldIndex::Eth1DataVotes,
        FieldIndex::Eth1DepositIndex,
        FieldIndex::Validators,
        FieldIndex::Balances,
        FieldIndex::RandaoMixes,
        FieldIndex::Slashings,
        FieldIndex::PreviousEpochAttestations,
        FieldIndex::CurrentEpochAttestations,
        FieldIndex::JustificationBits,
        FieldIndex::PreviousJustifiedCheckpoint,
        FieldIndex::CurrentJustifiedCheckpoint,
        FieldIndex::FinalizedCheckpoint,
    ];

    pub const fn as_usize(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            FieldIndex::GenesisTime => "genesis_time",
            FieldIndex::Slot => "slot",
            FieldIndex::Fork => "fork",
            FieldIndex::LatestBlockHeader => "latest_block_header",
            FieldIndex::BlockRoots => "block_roots",
            FieldIndex::StateRoots => "state_roots",
            FieldIndex::HistoricalRoots => "historical_roots",
            FieldIndex::Eth1Data => "eth1_data",
            FieldIndex::Eth1DataVotes => "eth1_data_votes",
            FieldIndex::Eth1DepositIndex => "eth1_deposit_index",
            FieldIndex::Validators => "validators",
            FieldIndex::Balances => "balances",
            FieldIndex::RandaoMixes => "randao_mixes",
            FieldIndex::Slashings => "slashings",
            FieldIndex::PreviousEpochAttestations => "previous_epoch_attestations",
            FieldIndex::CurrentEpochAttestations => "current_epoch_attestations",
            FieldIndex::JustificationBits => "justification_bits",
            FieldIndex::PreviousJustifiedCheckpoint => "previous_justified_checkpoint",
            FieldIndex::CurrentJustifiedCheckpoint => "current_justified_checkpoint",
            FieldIndex::FinalizedCheckpoint => "finalized_checkpoint",
        }
    }
}

impl fmt::Display for FieldIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<usize> for FieldIndex {
    type Error = StateError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        FieldIndex::ALL
            .get(index)
            .copied()
            .ok_or(StateError::LeafIndexOutOfRange {
                index,
                leaf_count: FIELD_COUNT,
            })
    }
}

/// Typed descriptor of one state field.
pub trait StateField: Send + Sync + 'static {
    const INDEX: FieldIndex;

    type Value: Clone + Send + Sync + 'static;

    /// Validate `value` against `config` and compute its leaf hash.
    fn hash_tree_root(value: &Self::Value, config: &BeaconConfig) -> Result<Hash, HashError>;

    fn get(state: &BeaconState) -> &Self::Value;

    fn get_mut(state: &mut BeaconState) -> &mut Self::Value;
}

/// Raw values of all beacon state fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconState {
    pub genesis_time: u64,
    pub slot: u64,
    pub fork: Fork,
    pub latest_block_header: BeaconBlockHeader,
    pub block_roots: Arc<Vec<Hash>>,
    pub state_roots: Arc<Vec<Hash>>,
    pub historical_roots: Arc<Vec<Hash>>,
    pub eth1_data: Eth1Data,
    pub eth1_data_votes: Arc<Vec<Eth1Data>>,
    pub eth1_deposit_index: u64,
    pub validators: Arc<Vec<Validator>>,
    pub balances: Arc<Vec<u64>>,
    pub randao_mixes: Arc<Vec<Hash>>,
    pub slashings: Arc<Vec<u64>>,
    pub previous_epoch_attestations: Arc<Vec<PendingAttestation>>,
    pub current_epoch_attestations: Arc<Vec<PendingAttestation>>,
    pub justification_bits: JustificationBits,
    pub previous_justified_checkpoint: Checkpoint,
    pub current_justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,
}

impl BeaconState {
    /// Zero-valued state with every fixed-length vector at its configured length.
    pub fn genesis(config: &BeaconConfig) -> Self {
        Self {
            genesis_time: 0,
            slot: 0,
            fork: Fork::default(),
            latest_block_header: BeaconBlockHeader::default(),
            block_roots: Arc::new(vec![ZERO_HASH; config.slots_per_historical_root]),
            state_roots: Arc::new(vec![ZERO_HASH; config.slots_per_historical_root]),
            historical_roots: Arc::default(),
            eth1_data: Eth1Data::default(),
            eth1_data_votes: Arc::default(),
            eth1_deposit_index: 0,
            validators: Arc::default(),
            balances: Arc::default(),
            randao_mixes: Arc::new(vec![ZERO_HASH; config.epochs_per_historical_vector]),
            slashings: Arc::new(vec![0; config.epochs_per_slashings_vector]),
            previous_epoch_attestations: Arc::default(),
            current_epoch_attestations: Arc::default(),
            justification_bits: JustificationBits::ZERO,
            previous_justified_checkpoint: Checkpoint::default(),
            current_justified_checkpoint: Checkpoint::default(),
            finalized_checkpoint: Checkpoint::default(),
        }
    }

    fn root_of<F: StateField>(&self, config: &BeaconConfig) -> Result<Hash, StateError> {
        F::hash_tree_root(F::get(self), config)
            .map_err(|err| StateError::from_hash_error(F::INDEX, err))
    }

    /// Leaf hash of a single field.
    pub fn hash_field(&self, index: FieldIndex, config: &BeaconConfig) -> Result<Hash, StateError> {
        match index {
            FieldIndex::GenesisTime => self.root_of::<field::GenesisTime>(config),
            FieldIndex::Slot => self.root_of::<field::Slot>(config),
            FieldIndex::Fork => self.root_of::<field::Fork>(config),
            FieldIndex::LatestBlockHeader => self.root_of::<field::LatestBlockHeader>(config),
            FieldIndex::BlockRoots => self.root_of::<field::BlockRoots>(config),
            FieldIndex::StateRoots => self.root_of::<field::StateRoots>(config),
            FieldIndex::HistoricalRoots => self.root_of::<field::HistoricalRoots>(config),
            FieldIndex::Eth1Data => self.root_of::<field::Eth1Data>(config),
            FieldIndex::Eth1DataVotes => self.root_of::<field::Eth1DataVotes>(config),
            FieldIndex::Eth1DepositIndex => self.root_of::<field::Eth1DepositIndex>(config),
            FieldIndex::Validators => self.root_of::<field::Validators>(config),
            FieldIndex::Balances => self.root_of::<field::Balances>(config),
            FieldIndex::RandaoMixes => self.root_of::<field::RandaoMixes>(config),
            FieldIndex::Slashings => self.root_of::<field::Slashings>(config),
            FieldIndex::PreviousEpochAttestations => {
                self.root_of::<field::PreviousEpochAttestations>(config)
            }
            FieldIndex::CurrentEpochAttestations => {
                self.root_of::<field::CurrentEpochAttestations>(config)
            }
            FieldIndex::JustificationBits => self.root_of::<field::JustificationBits>(config),
            FieldIndex::PreviousJustifiedCheckpoint => {
                self.root_of::<field::PreviousJustifiedCheckpoint>(config)
            }
            FieldIndex::CurrentJustifiedCheckpoint => {
                self.root_of::<field::CurrentJustifiedCheckpoint>(config)
            }
            FieldIndex::FinalizedCheckpoint => self.root_of::<field::FinalizedCheckpoint>(config),
        }
    }

    /// Leaf hashes of all fields in canonical order, hashed in parallel.
    ///
    /// Fails with the error of the lowest-indexed invalid field.
    pub fn field_roots(&self, config: &BeaconConfig) -> Result<Vec<Hash>, StateError> {
        let results: Vec<Result<Hash, StateError>> = FieldIndex::ALL
            .as_slice()
            .par_iter()
            .map(|index| self.hash_field(*index, config))
            .collect();
        results.into_iter().collect()
    }

    /// Full-rehash state root, computed from scratch over every field.
    pub fn hash_tree_root(&self, config: &BeaconConfig) -> Result<Hash, StateError> {
        let leaves = self.field_roots(config)?;
        Ok(ssz::merkleize_fixed(&leaves))
    }
}

macro_rules! state_field {
    ($(#[$meta:meta])* $marker:ident, $member:ident: $value:ty, |$v:ident, $config:ident| $hash:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $marker;

        impl StateField for $marker {
            const INDEX: FieldIndex = FieldIndex::$marker;

            type Value = $value;

            fn hash_tree_root(
                $v: &Self::Value,
                $config: &BeaconConfig,
            ) -> Result<Hash, HashError> {
                $hash
            }

            fn get(state: &BeaconState) -> &Self::Value {
                &state.$member
            }

            fn get_mut(state: &mut BeaconState) -> &mut Self::Value {
                &mut state.$member
            }
        }
    };
}

/// Marker types, one per state field.
pub mod field {
    use super::*;

    state_field!(GenesisTime, genesis_time: u64, |v, _config| Ok(ssz::uint64_root(*v)));
    state_field!(Slot, slot: u64, |v, _config| Ok(ssz::uint64_root(*v)));
    state_field!(Fork, fork: super::Fork, |v, _config| Ok(ssz::fork_root(v)));
    state_field!(LatestBlockHeader, latest_block_header: BeaconBlockHeader, |v, _config| {
        Ok(ssz::block_header_root(v))
    });
    state_field!(
        /// `Vector[Root, SLOTS_PER_HISTORICAL_ROOT]`
        BlockRoots, block_roots: Arc<Vec<Hash>>, |v, config| {
            ssz::roots_vector_root(v.as_slice(), config.slots_per_historical_root)
        }
    );
    state_field!(
        /// `Vector[Root, SLOTS_PER_HISTORICAL_ROOT]`
        StateRoots, state_roots: Arc<Vec<Hash>>, |v, config| {
            ssz::roots_vector_root(v.as_slice(), config.slots_per_historical_root)
        }
    );
    state_field!(HistoricalRoots, historical_roots: Arc<Vec<Hash>>, |v, config| {
        ssz::roots_list_root(v.as_slice(), config.historical_roots_limit)
    });
    state_field!(Eth1Data, eth1_data: super::Eth1Data, |v, _config| Ok(ssz::eth1_data_root(v)));
    state_field!(Eth1DataVotes, eth1_data_votes: Arc<Vec<super::Eth1Data>>, |v, config| {
        ssz::composite_list_root(v.as_slice(), config.slots_per_eth1_voting_period, |vote| {
            Ok(ssz::eth1_data_root(vote))
        })
    });
    state_field!(Eth1DepositIndex, eth1_deposit_index: u64, |v, _config| {
        Ok(ssz::uint64_root(*v))
    });
    state_field!(Validators, validators: Arc<Vec<Validator>>, |v, config| {
        ssz::composite_list_root(v.as_slice(), config.validator_registry_limit, |validator| {
            Ok(ssz::validator_root(validator))
        })
    });
    state_field!(Balances, balances: Arc<Vec<u64>>, |v, config| {
        ssz::u64_list_root(v.as_slice(), config.validator_registry_limit)
    });
    state_field!(
        /// `Vector[Bytes32, EPOCHS_PER_HISTORICAL_VECTOR]`
        RandaoMixes, randao_mixes: Arc<Vec<Hash>>, |v, config| {
            ssz::roots_vector_root(v.as_slice(), config.epochs_per_historical_vector)
        }
    );
    state_field!(Slashings, slashings: Arc<Vec<u64>>, |v, config| {
        ssz::u64_vector_root(v.as_slice(), config.epochs_per_slashings_vector)
    });
    state_field!(
        PreviousEpochAttestations,
        previous_epoch_attestations: Arc<Vec<PendingAttestation>>,
        |v, config| {
            ssz::composite_list_root(v.as_slice(), config.max_pending_attestations(), |att| {
                ssz::pending_attestation_root(att, config.max_validators_per_committee)
            })
        }
    );
    state_field!(
        CurrentEpochAttestations,
        current_epoch_attestations: Arc<Vec<PendingAttestation>>,
        |v, config| {
            ssz::composite_list_root(v.as_slice(), config.max_pending_attestations(), |att| {
                ssz::pending_attestation_root(att, config.max_validators_per_committee)
            })
        }
    );
    state_field!(JustificationBits, justification_bits: super::JustificationBits, |v, _config| {
        ssz::justification_bits_root(v)
    });
    state_field!(PreviousJustifiedCheckpoint, previous_justified_checkpoint: Checkpoint, |v, _config| {
        Ok(ssz::checkpoint_root(v))
    });
    state_field!(CurrentJustifiedCheckpoint, current_justified_checkpoint: Checkpoint, |v, _config| {
        Ok(ssz::checkpoint_root(v))
    });
    state_field!(FinalizedCheckpoint, finalized_checkpoint: Checkpoint, |v, _config| {
        Ok(ssz::checkpoint_root(v))
    });
}
