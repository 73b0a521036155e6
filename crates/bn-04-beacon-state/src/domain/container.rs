//! # State Container
//!
//! The only entry point for mutating beacon state. Binds the field store and
//! the merkle cache behind one lock so callers always observe a consistent
//! (value, root) pair.
//!
//! ## Mutation Flow
//!
//! ```text
//! set::<F>(value)
//!   │
//!   ├── F::hash_tree_root(value)       (no lock held; failure → nothing changes)
//!   │
//!   └── write lock ─┬── layer0[F::INDEX] = leaf, rehash branch
//!                   └── store value
//! ```
//!
//! ## Thread Safety
//!
//! A `parking_lot::RwLock` guards the state and the tree together. Writers
//! are linearized; readers never see a leaf without its ancestors. Guards are
//! released on every exit path, including errors.
//!
//! ## Snapshots
//!
//! `snapshot()` copies the tree layers (about 40 hashes for 20 fields) and
//! clones the field store, which shares collection values through `Arc`.
//! Mutating either copy afterwards never affects the other.

use super::{
    field, BeaconBlockHeader, BeaconState, Checkpoint, Eth1Data, FieldIndex, FieldProof, Fork,
    Hash, JustificationBits, MerkleCache, PendingAttestation, StateError, StateField, Validator,
};
use crate::config::{BeaconConfig, ConfigError};
use crate::metrics;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

struct Inner {
    state: BeaconState,
    cache: MerkleCache,
}

pub struct StateContainer {
    config: Arc<BeaconConfig>,
    inner: RwLock<Inner>,
}

impl StateContainer {
    /// Build a container from a full state, hashing every field.
    pub fn new(state: BeaconState, config: BeaconConfig) -> Result<Self, StateError> {
        config.validate()?;
        let leaves = state.field_roots(&config)?;
        let cache = MerkleCache::new(leaves);

        info!(
            slot = state.slot,
            validators = state.validators.len(),
            root = %hex::encode(cache.root()),
            "Built beacon state merkle cache"
        );

        Ok(Self {
            config: Arc::new(config),
            inner: RwLock::new(Inner { state, cache }),
        })
    }

    /// Container over the zero-valued genesis state.
    pub fn genesis(config: BeaconConfig) -> Result<Self, StateError> {
        let state = BeaconState::genesis(&config);
        Self::new(state, config)
    }

    pub fn config(&self) -> &BeaconConfig {
        &self.config
    }

    /// Current state root.
    pub fn root(&self) -> Hash {
        self.inner.read().cache.root()
    }

    /// Cached leaf hash of one field.
    pub fn field_root(&self, field: FieldIndex) -> Hash {
        self.inner.read().cache.leaves()[field.as_usize()]
    }

    pub fn field_proof(&self, field: FieldIndex) -> Result<FieldProof, StateError> {
        self.inner.read().cache.proof(field.as_usize())
    }

    /// Consistent copy of every field value.
    pub fn state(&self) -> BeaconState {
        self.inner.read().state.clone()
    }

    pub fn get<F: StateField>(&self) -> F::Value {
        F::get(&self.inner.read().state).clone()
    }

    /// A field value together with the root committing to it.
    pub fn get_with_root<F: StateField>(&self) -> (F::Value, Hash) {
        let inner = self.inner.read();
        (F::get(&inner.state).clone(), inner.cache.root())
    }

    /// Validate, hash and store a new value for field `F`.
    ///
    /// On error neither the value nor the tree changes.
    pub fn set<F: StateField>(&self, value: impl Into<F::Value>) -> Result<(), StateError> {
        let value = value.into();
        let leaf = F::hash_tree_root(&value, &self.config).map_err(|err| {
            let err = StateError::from_hash_error(F::INDEX, err);
            warn!(field = %F::INDEX, error = %err, "Rejected state field update");
            metrics::record_field_rejected(F::INDEX.name());
            err
        })?;

        let root = {
            let mut inner = self.inner.write();
            inner.cache.update_leaf(F::INDEX.as_usize(), leaf)?;
            *F::get_mut(&mut inner.state) = value;
            inner.cache.root()
        };

        debug!(
            field = %F::INDEX,
            leaf = %hex::encode(leaf),
            root = %hex::encode(root),
            "Updated state field"
        );
        metrics::record_field_update(F::INDEX.name());
        Ok(())
    }

    /// Start a multi-field update.
    pub fn batch(&self) -> FieldBatch {
        FieldBatch {
            config: Arc::clone(&self.config),
            updates: Vec::new(),
        }
    }

    /// Apply every update of `batch` under a single write lock.
    ///
    /// Returns the new root.
    pub fn commit(&self, batch: FieldBatch) -> Result<Hash, StateError> {
        if batch.updates.is_empty() {
            return Ok(self.root());
        }
        if !Arc::ptr_eq(&batch.config, &self.config) && batch.config != self.config {
            warn!("Rejected field batch built against a different configuration");
            return Err(StateError::Config(ConfigError::Mismatch));
        }

        let leaves: Vec<(usize, Hash)> = batch
            .updates
            .iter()
            .map(|update| (update.index.as_usize(), update.leaf))
            .collect();

        let root = {
            let mut inner = self.inner.write();
            inner.cache.update_leaves(&leaves)?;
            for update in batch.updates {
                (update.apply)(&mut inner.state);
                metrics::record_field_update(update.index.name());
            }
            inner.cache.root()
        };

        metrics::record_batch_commit();
        debug!(
            fields = leaves.len(),
            root = %hex::encode(root),
            "Committed state field batch"
        );
        Ok(root)
    }

    /// Independent copy for fork-choice branching.
    pub fn snapshot(&self) -> Self {
        let copy = {
            let inner = self.inner.read();
            Inner {
                state: inner.state.clone(),
                cache: inner.cache.clone(),
            }
        };

        debug!(root = %hex::encode(copy.cache.root()), "Took beacon state snapshot");
        metrics::record_snapshot();

        Self {
            config: Arc::clone(&self.config),
            inner: RwLock::new(copy),
        }
    }

    /// Rehash every field from scratch and compare with the cached root.
    pub fn verify_root(&self) -> Result<Hash, StateError> {
        let inner = self.inner.read();
        let expected = inner.state.hash_tree_root(&self.config)?;
        let actual = inner.cache.root();
        if expected != actual {
            warn!(
                expected = %hex::encode(expected),
                actual = %hex::encode(actual),
                "Cached state root diverged from full rehash"
            );
            metrics::record_root_mismatch();
            return Err(StateError::StateRootMismatch { expected, actual });
        }
        Ok(actual)
    }

    // =========================================================================
    // NAMED ACCESSORS
    // =========================================================================

    pub fn genesis_time(&self) -> u64 {
        self.get::<field::GenesisTime>()
    }

    pub fn set_genesis_time(&self, genesis_time: u64) -> Result<(), StateError> {
        self.set::<field::GenesisTime>(genesis_time)
    }

    pub fn slot(&self) -> u64 {
        self.get::<field::Slot>()
    }

    pub fn set_slot(&self, slot: u64) -> Result<(), StateError> {
        self.set::<field::Slot>(slot)
    }

    pub fn fork(&self) -> Fork {
        self.get::<field::Fork>()
    }

    pub fn set_fork(&self, fork: Fork) -> Result<(), StateError> {
        self.set::<field::Fork>(fork)
    }

    pub fn latest_block_header(&self) -> BeaconBlockHeader {
        self.get::<field::LatestBlockHeader>()
    }

    pub fn set_latest_block_header(&self, header: BeaconBlockHeader) -> Result<(), StateError> {
        self.set::<field::LatestBlockHeader>(header)
    }

    pub fn block_roots(&self) -> Arc<Vec<Hash>> {
        self.get::<field::BlockRoots>()
    }

    pub fn set_block_roots(&self, roots: Vec<Hash>) -> Result<(), StateError> {
        self.set::<field::BlockRoots>(roots)
    }

    pub fn state_roots(&self) -> Arc<Vec<Hash>> {
        self.get::<field::StateRoots>()
    }

    pub fn set_state_roots(&self, roots: Vec<Hash>) -> Result<(), StateError> {
        self.set::<field::StateRoots>(roots)
    }

    pub fn historical_roots(&self) -> Arc<Vec<Hash>> {
        self.get::<field::HistoricalRoots>()
    }

    pub fn set_historical_roots(&self, roots: Vec<Hash>) -> Result<(), StateError> {
        self.set::<field::HistoricalRoots>(roots)
    }

    pub fn eth1_data(&self) -> Eth1Data {
        self.get::<field::Eth1Data>()
    }

    pub fn set_eth1_data(&self, data: Eth1Data) -> Result<(), StateError> {
        self.set::<field::Eth1Data>(data)
    }

    pub fn eth1_data_votes(&self) -> Arc<Vec<Eth1Data>> {
        self.get::<field::Eth1DataVotes>()
    }

    pub fn set_eth1_data_votes(&self, votes: Vec<Eth1Data>) -> Result<(), StateError> {
        self.set::<field::Eth1DataVotes>(votes)
    }

    pub fn eth1_deposit_index(&self) -> u64 {
        self.get::<field::Eth1DepositIndex>()
    }

    pub fn set_eth1_deposit_index(&self, index: u64) -> Result<(), StateError> {
        self.set::<field::Eth1DepositIndex>(index)
    }

    pub fn validators(&self) -> Arc<Vec<Validator>> {
        self.get::<field::Validators>()
    }

    pub fn set_validators(&self, validators: Vec<Validator>) -> Result<(), StateError> {
        self.set::<field::Validators>(validators)
    }

    pub fn balances(&self) -> Arc<Vec<u64>> {
        self.get::<field::Balances>()
    }

    pub fn set_balances(&self, balances: Vec<u64>) -> Result<(), StateError> {
        self.set::<field::Balances>(balances)
    }

    pub fn randao_mixes(&self) -> Arc<Vec<Hash>> {
        self.get::<field::RandaoMixes>()
    }

    pub fn set_randao_mixes(&self, mixes: Vec<Hash>) -> Result<(), StateError> {
        self.set::<field::RandaoMixes>(mixes)
    }

    pub fn slashings(&self) -> Arc<Vec<u64>> {
        self.get::<field::Slashings>()
    }

    pub fn set_slashings(&self, slashings: Vec<u64>) -> Result<(), StateError> {
        self.set::<field::Slashings>(slashings)
    }

    pub fn previous_epoch_attestations(&self) -> Arc<Vec<PendingAttestation>> {
        self.get::<field::PreviousEpochAttestations>()
    }

    pub fn set_previous_epoch_attestations(
        &self,
        attestations: Vec<PendingAttestation>,
    ) -> Result<(), StateError> {
        self.set::<field::PreviousEpochAttestations>(attestations)
    }

    pub fn current_epoch_attestations(&self) -> Arc<Vec<PendingAttestation>> {
        self.get::<field::CurrentEpochAttestations>()
    }

    pub fn set_current_epoch_attestations(
        &self,
        attestations: Vec<PendingAttestation>,
    ) -> Result<(), StateError> {
        self.set::<field::CurrentEpochAttestations>(attestations)
    }

    pub fn justification_bits(&self) -> JustificationBits {
        self.get::<field::JustificationBits>()
    }

    pub fn set_justification_bits(&self, bits: JustificationBits) -> Result<(), StateError> {
        self.set::<field::JustificationBits>(bits)
    }

    pub fn previous_justified_checkpoint(&self) -> Checkpoint {
        self.get::<field::PreviousJustifiedCheckpoint>()
    }

    pub fn set_previous_justified_checkpoint(
        &self,
        checkpoint: Checkpoint,
    ) -> Result<(), StateError> {
        self.set::<field::PreviousJustifiedCheckpoint>(checkpoint)
    }

    pub fn current_justified_checkpoint(&self) -> Checkpoint {
        self.get::<field::CurrentJustifiedCheckpoint>()
    }

    pub fn set_current_justified_checkpoint(
        &self,
        checkpoint: Checkpoint,
    ) -> Result<(), StateError> {
        self.set::<field::CurrentJustifiedCheckpoint>(checkpoint)
    }

    pub fn finalized_checkpoint(&self) -> Checkpoint {
        self.get::<field::FinalizedCheckpoint>()
    }

    pub fn set_finalized_checkpoint(&self, checkpoint: Checkpoint) -> Result<(), StateError> {
        self.set::<field::FinalizedCheckpoint>(checkpoint)
    }
}

type ApplyFn = Box<dyn FnOnce(&mut BeaconState) + Send>;

struct PendingUpdate {
    index: FieldIndex,
    leaf: Hash,
    apply: ApplyFn,
}

/// Field updates hashed up front and applied together by
/// [`StateContainer::commit`].
///
/// A failing `set` leaves the batch unchanged, so a caller can drop the batch
/// and nothing reaches the container.
pub struct FieldBatch {
    config: Arc<BeaconConfig>,
    updates: Vec<PendingUpdate>,
}

impl FieldBatch {
    pub fn set<F: StateField>(&mut self, value: impl Into<F::Value>) -> Result<(), StateError> {
        let value = value.into();
        let leaf = F::hash_tree_root(&value, &self.config)
            .map_err(|err| StateError::from_hash_error(F::INDEX, err))?;

        self.updates.push(PendingUpdate {
            index: F::INDEX,
            leaf,
            apply: Box::new(move |state: &mut BeaconState| *F::get_mut(state) = value),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Fields touched by this batch, in insertion order.
    pub fn fields(&self) -> Vec<FieldIndex> {
        self.updates.iter().map(|update| update.index).collect()
    }
}
