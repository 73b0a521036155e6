//! # Concurrency Flows
//!
//! Many threads mutate and read one container. Every committed write must be
//! reflected in the final root and no reader may observe a half-updated tree.

#[cfg(test)]
mod tests {
    use crate::{checkpoint, minimal_config, root_from_seed};
    use bn_04_beacon_state::{field, BeaconState, StateContainer};
    use rand::Rng;
    use std::sync::Arc;
    use std::thread;

    /// Test: Disjoint fields written from many threads all land
    #[test]
    fn test_parallel_writers_on_disjoint_fields() {
        let container = Arc::new(StateContainer::genesis(minimal_config()).unwrap());

        let writers = vec![
            {
                let c = Arc::clone(&container);
                thread::spawn(move || {
                    for slot in 0..100 {
                        c.set_slot(slot).unwrap();
                    }
                })
            },
            {
                let c = Arc::clone(&container);
                thread::spawn(move || {
                    for epoch in 0..100 {
                        c.set_finalized_checkpoint(checkpoint(epoch)).unwrap();
                    }
                })
            },
            {
                let c = Arc::clone(&container);
                thread::spawn(move || {
                    for index in 0..100 {
                        c.set_eth1_deposit_index(index).unwrap();
                    }
                })
            },
            {
                let c = Arc::clone(&container);
                thread::spawn(move || {
                    for seed in 0..100 {
                        c.set_historical_roots(vec![root_from_seed(seed); 2]).unwrap();
                    }
                })
            },
        ];
        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(container.slot(), 99);
        assert_eq!(container.finalized_checkpoint(), checkpoint(99));
        assert_eq!(container.eth1_deposit_index(), 99);
        assert_eq!(*container.historical_roots(), vec![root_from_seed(99); 2]);
        container.verify_root().unwrap();
    }

    /// Test: Racing writers on one field leave one of their values, never a mix
    #[test]
    fn test_racing_writers_on_same_field() {
        let container = Arc::new(StateContainer::genesis(minimal_config()).unwrap());

        let handles: Vec<_> = (0..8u64)
            .map(|worker| {
                let c = Arc::clone(&container);
                thread::spawn(move || {
                    let mut rng = rand::thread_rng();
                    for _ in 0..50 {
                        let epoch = worker * 1000 + rng.gen_range(0..1000);
                        c.set_current_justified_checkpoint(checkpoint(epoch)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let last = container.current_justified_checkpoint();
        assert_eq!(last, checkpoint(last.epoch));
        container.verify_root().unwrap();
    }

    /// Test: Readers see a root consistent with the value they read
    #[test]
    fn test_readers_observe_consistent_pairs() {
        let config = minimal_config();
        let container = Arc::new(StateContainer::genesis(config.clone()).unwrap());

        let writer = {
            let c = Arc::clone(&container);
            thread::spawn(move || {
                for index in 1..=300u64 {
                    let mut batch = c.batch();
                    batch.set::<field::Eth1DepositIndex>(index).unwrap();
                    batch.set::<field::Slot>(index * 2).unwrap();
                    c.commit(batch).unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..3)
            .map(|_| {
                let c = Arc::clone(&container);
                let config = config.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        let state = c.state();
                        assert_eq!(state.slot, state.eth1_deposit_index * 2);

                        let (index, root) = c.get_with_root::<field::Eth1DepositIndex>();
                        let mut expected = BeaconState::genesis(&config);
                        expected.eth1_deposit_index = index;
                        expected.slot = index * 2;
                        assert_eq!(root, expected.hash_tree_root(&config).unwrap());
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(container.slot(), 600);
        container.verify_root().unwrap();
    }

    /// Test: Snapshots taken under write load are internally consistent
    #[test]
    fn test_snapshots_under_write_load() {
        let container = Arc::new(StateContainer::genesis(minimal_config()).unwrap());
        let writer = {
            let c = Arc::clone(&container);
            thread::spawn(move || {
                for slot in 0..200 {
                    c.set_slot(slot).unwrap();
                }
            })
        };

        let snapshots: Vec<_> = (0..20).map(|_| container.snapshot()).collect();
        writer.join().unwrap();

        for snapshot in snapshots {
            snapshot.verify_root().unwrap();
        }
    }
}
