//! # State Lifecycle Flows
//!
//! Genesis → slot processing → epoch transition → finalization, exercised
//! through both the typed setters and the read-only [`BeaconStateApi`] port.
//!
//! [`BeaconStateApi`]: bn_04_beacon_state::BeaconStateApi

#[cfg(test)]
mod tests {
    use crate::{
        checkpoint, init_tracing, minimal_config, pending_attestations, root_from_seed, validators,
    };
    use bn_04_beacon_state::{
        field, ssz, BeaconBlockHeader, BeaconConfig, BeaconState, BeaconStateApi, Eth1Data,
        FieldIndex, JustificationBits, StateContainer, StateError,
    };
    use proptest::prelude::*;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Mimics per-slot processing: rotate block/state roots and bump the slot.
    fn process_slot(container: &StateContainer, slot: u64) {
        let config = container.config();
        let position = (slot as usize) % config.slots_per_historical_root;

        let mut block_roots = (*container.block_roots()).clone();
        block_roots[position] = root_from_seed(slot);
        let mut state_roots = (*container.state_roots()).clone();
        state_roots[position] = container.root();

        let mut batch = container.batch();
        batch.set::<field::BlockRoots>(block_roots).unwrap();
        batch.set::<field::StateRoots>(state_roots).unwrap();
        batch.set::<field::Slot>(slot + 1).unwrap();
        batch
            .set::<field::LatestBlockHeader>(BeaconBlockHeader {
                slot,
                parent_root: root_from_seed(slot.saturating_sub(1)),
                state_root: [0u8; 32],
                body_root: root_from_seed(slot + 1000),
            })
            .unwrap();
        container.commit(batch).unwrap();
    }

    /// Mimics epoch processing: move attestations and advance checkpoints.
    fn process_epoch(container: &StateContainer, epoch: u64) {
        let current = container.current_epoch_attestations();
        let mut bits = JustificationBits::ZERO;
        bits.set(0, true);
        bits.set(1, epoch > 1);

        let mut batch = container.batch();
        batch
            .set::<field::PreviousEpochAttestations>((*current).clone())
            .unwrap();
        batch.set::<field::CurrentEpochAttestations>(Vec::new()).unwrap();
        batch.set::<field::JustificationBits>(bits).unwrap();
        batch
            .set::<field::PreviousJustifiedCheckpoint>(container.current_justified_checkpoint())
            .unwrap();
        batch
            .set::<field::CurrentJustifiedCheckpoint>(checkpoint(epoch))
            .unwrap();
        if epoch > 1 {
            batch
                .set::<field::FinalizedCheckpoint>(checkpoint(epoch - 1))
                .unwrap();
        }
        container.commit(batch).unwrap();
    }

    // =============================================================================
    // INTEGRATION TESTS
    // =============================================================================

    /// Test: Two epochs of slot and epoch processing keep the cache in sync
    #[test]
    fn test_genesis_through_finalization() {
        init_tracing();
        let config = minimal_config();
        let container = StateContainer::genesis(config.clone()).unwrap();

        container.set_genesis_time(1_606_824_000).unwrap();
        container.set_validators(validators(64)).unwrap();
        container.set_balances(vec![32_000_000_000; 64]).unwrap();

        let slots_per_epoch = config.slots_per_epoch as u64;
        for slot in 0..3 * slots_per_epoch {
            process_slot(&container, slot);
            container
                .set_current_epoch_attestations(pending_attestations(slot as usize % 4 + 1, 8))
                .unwrap();

            if (slot + 1) % slots_per_epoch == 0 {
                process_epoch(&container, (slot + 1) / slots_per_epoch);
            }
            container.verify_root().unwrap();
        }

        assert_eq!(container.slot(), 3 * slots_per_epoch);
        assert_eq!(container.finalized_checkpoint(), checkpoint(2));
        assert_eq!(container.current_justified_checkpoint(), checkpoint(3));
        assert_eq!(container.validator_count(), 64);
    }

    /// Test: Cached root equals a from-scratch rehash of an identical state
    #[test]
    fn test_root_matches_independent_rehash() {
        let config = minimal_config();
        let container = StateContainer::genesis(config.clone()).unwrap();
        container.set_slot(99).unwrap();
        container
            .set_eth1_data(Eth1Data {
                deposit_root: root_from_seed(1),
                deposit_count: 16,
                block_hash: root_from_seed(2),
            })
            .unwrap();
        container.set_historical_roots(vec![root_from_seed(3); 5]).unwrap();

        let mut expected = BeaconState::genesis(&config);
        expected.slot = 99;
        expected.eth1_data = container.eth1_data();
        expected.historical_roots = container.historical_roots();

        assert_eq!(container.root(), expected.hash_tree_root(&config).unwrap());
    }

    /// Test: A rejected update in a flow leaves everything else intact
    #[test]
    fn test_rejected_update_mid_flow() {
        let container = StateContainer::genesis(minimal_config()).unwrap();
        process_slot(&container, 0);
        let root = container.root();

        let votes = vec![Eth1Data::default(); 17];
        let err = container.set_eth1_data_votes(votes).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.field(), Some(FieldIndex::Eth1DataVotes));

        let err = container
            .set_previous_epoch_attestations(pending_attestations(1, 2049))
            .unwrap_err();
        assert!(matches!(
            err,
            StateError::Validation {
                field: FieldIndex::PreviousEpochAttestations,
                ..
            }
        ));

        assert_eq!(container.root(), root);
        container.verify_root().unwrap();
    }

    /// Test: Field proofs served through the API verify against the API root
    #[test]
    fn test_light_client_proofs_through_api() {
        let container = StateContainer::genesis(minimal_config()).unwrap();
        container.set_finalized_checkpoint(checkpoint(9)).unwrap();
        container.set_validators(validators(10)).unwrap();

        let api: &dyn BeaconStateApi = &container;
        let root = api.state_root();
        for field in FieldIndex::ALL {
            let proof = api.field_proof(field).unwrap();
            assert_eq!(proof.branch.len(), 5);
            assert_eq!(proof.leaf, api.field_root(field));
            assert!(proof.verify(&root), "proof for {field} must verify");
        }

        let finalized = api.field_proof(FieldIndex::FinalizedCheckpoint).unwrap();
        assert_eq!(finalized.leaf, ssz::checkpoint_root(&checkpoint(9)));
        assert!(!finalized.verify(&root_from_seed(0)));
    }

    /// Test: Configuration loaded from TOML drives vector lengths
    #[test]
    fn test_toml_config_drives_validation() {
        let config = BeaconConfig::from_toml_str(
            r#"
            slots_per_historical_root = 32
            epochs_per_historical_vector = 16
            epochs_per_slashings_vector = 16
            slots_per_eth1_voting_period = 4
            slots_per_epoch = 4
            "#,
        )
        .unwrap();

        let container = StateContainer::genesis(config).unwrap();
        assert_eq!(container.block_roots().len(), 32);
        assert!(container.set_randao_mixes(vec![root_from_seed(1); 16]).is_ok());
        assert!(container.set_randao_mixes(vec![root_from_seed(1); 64]).is_err());
        assert!(container.set_eth1_data_votes(vec![Eth1Data::default(); 5]).is_err());
        container.verify_root().unwrap();
    }

    /// Test: Zero capacities are refused before any hashing happens
    #[test]
    fn test_invalid_config_rejected() {
        let config = BeaconConfig {
            epochs_per_slashings_vector: 0,
            ..BeaconConfig::minimal()
        };
        let result = StateContainer::genesis(config);
        assert!(matches!(result, Err(StateError::Config(_))));
    }

    #[derive(Clone, Debug)]
    enum Mutation {
        Slot(u64),
        DepositIndex(u64),
        Finalized(u64),
        Balances(Vec<u64>),
        HistoricalRoots(u8),
    }

    fn mutation() -> impl Strategy<Value = Mutation> {
        prop_oneof![
            any::<u64>().prop_map(Mutation::Slot),
            any::<u64>().prop_map(Mutation::DepositIndex),
            any::<u64>().prop_map(Mutation::Finalized),
            prop::collection::vec(any::<u64>(), 0..40).prop_map(Mutation::Balances),
            (0u8..16).prop_map(Mutation::HistoricalRoots),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Any sequence of mutations keeps the cached root equal to a full rehash
        #[test]
        fn prop_mutation_sequences_match_full_rehash(
            mutations in prop::collection::vec(mutation(), 1..30),
        ) {
            let container = StateContainer::genesis(minimal_config()).unwrap();
            for mutation in mutations {
                match mutation {
                    Mutation::Slot(slot) => container.set_slot(slot).unwrap(),
                    Mutation::DepositIndex(index) => container.set_eth1_deposit_index(index).unwrap(),
                    Mutation::Finalized(epoch) => {
                        container.set_finalized_checkpoint(checkpoint(epoch)).unwrap()
                    }
                    Mutation::Balances(balances) => container.set_balances(balances).unwrap(),
                    Mutation::HistoricalRoots(count) => container
                        .set_historical_roots(vec![root_from_seed(count as u64); count as usize])
                        .unwrap(),
                }
                prop_assert_eq!(container.verify_root().unwrap(), container.root());
            }
        }
    }
}
