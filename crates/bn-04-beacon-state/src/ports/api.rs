use crate::domain::{Checkpoint, FieldIndex, FieldProof, Hash, StateContainer, StateError};

/// Read-side API other subsystems use to query beacon state commitments.
pub trait BeaconStateApi: Send + Sync {
    // === Roots ===

    fn state_root(&self) -> Hash;

    fn field_root(&self, field: FieldIndex) -> Hash;

    /// Merkle branch proving one field against [`Self::state_root`].
    fn field_proof(&self, field: FieldIndex) -> Result<FieldProof, StateError>;

    // === Consensus Views ===

    fn slot(&self) -> u64;

    fn finalized_checkpoint(&self) -> Checkpoint;

    fn current_justified_checkpoint(&self) -> Checkpoint;

    fn validator_count(&self) -> usize;
}

impl BeaconStateApi for StateContainer {
    fn state_root(&self) -> Hash {
        self.root()
    }

    fn field_root(&self, field: FieldIndex) -> Hash {
        StateContainer::field_root(self, field)
    }

    fn field_proof(&self, field: FieldIndex) -> Result<FieldProof, StateError> {
        StateContainer::field_proof(self, field)
    }

    fn slot(&self) -> u64 {
        StateContainer::slot(self)
    }

    fn finalized_checkpoint(&self) -> Checkpoint {
        StateContainer::finalized_checkpoint(self)
    }

    fn current_justified_checkpoint(&self) -> Checkpoint {
        StateContainer::current_justified_checkpoint(self)
    }

    fn validator_count(&self) -> usize {
        self.validators().len()
    }
}
