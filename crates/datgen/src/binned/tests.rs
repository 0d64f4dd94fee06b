use crate::{BinKey, BinnedStore, DuplicatePolicy, Error};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::sync::Arc;
use std::thread::scope;

const DYNAMISM: [f64; 3] = [0.2, 0.5, 0.8];
const URGENCY: [i64; 2] = [5, 20];
const SCALE: [f64; 2] = [1.0, 5.0];

fn all_entries() -> Vec<(f64, i64, f64, u32)> {
    let mut entries = Vec::new();
    let mut value = 0;
    for dynamism in DYNAMISM {
        for urgency in URGENCY {
            for scale in SCALE {
                for _ in 0..4 {
                    entries.push((dynamism, urgency, scale, value));
                    value += 1;
                }
            }
        }
    }
    entries
}

#[test]
fn get_on_unknown_key_is_empty() {
    let store = BinnedStore::<u32>::natural_order();
    assert!(store.get(0.5, 5, 1.0).is_empty());

    store.put(0.5, 5, 1.0, 1).unwrap();
    assert!(store.get(0.4, 5, 1.0).is_empty());
    assert!(store.get(0.5, 6, 1.0).is_empty());
    assert!(store.get(0.5, 5, 2.0).is_empty());
    assert_eq!(store.bin_len(0.5, 5, 2.0), 0);
}

#[test]
fn contains_entry_requires_exact_key_and_value() {
    let store = BinnedStore::natural_order();
    store.put(0.5, 5, 1.0, 10_u32).unwrap();

    assert!(store.contains_entry(0.5, 5, 1.0, &10));
    assert!(!store.contains_entry(0.5, 5, 1.0, &11));
    assert!(!store.contains_entry(0.6, 5, 1.0, &10));
    assert!(!store.contains_entry(0.5, 4, 1.0, &10));
    assert!(!store.contains_entry(0.5, 5, 1.5, &10));
}

#[test]
fn dynamism_keys_match_bit_for_bit() {
    let store = BinnedStore::natural_order();
    store.put(0.1 + 0.2, 5, 1.0, 1_u32).unwrap();
    assert!(store.get(0.3, 5, 1.0).is_empty());
    assert_eq!(store.get(0.1 + 0.2, 5, 1.0), [1]);
}

#[test]
fn size_counts_distinct_values_across_keys() {
    let store = BinnedStore::natural_order();
    assert!(store.is_empty());

    assert!(store.put(0.2, 5, 1.0, 1_u32).unwrap());
    assert!(store.put(0.5, 5, 1.0, 1).unwrap());
    assert!(store.put(0.5, 20, 1.0, 1).unwrap());
    assert!(store.put(0.5, 20, 1.0, 2).unwrap());

    assert_eq!(store.size(), 2);
    assert_eq!(store.to_vec(), [1, 1, 1, 2]);
}

#[test]
fn bins_behave_as_sorted_sets() {
    let store = BinnedStore::natural_order();
    assert!(store.put(0.5, 5, 1.0, 3_u32).unwrap());
    assert!(!store.put(0.5, 5, 1.0, 3).unwrap());
    assert!(store.put(0.5, 5, 1.0, 1).unwrap());

    assert_eq!(store.get(0.5, 5, 1.0), [1, 3]);
    assert_eq!(store.bin_len(0.5, 5, 1.0), 2);
    assert_eq!(store.size(), 2);
}

#[test]
fn iteration_order_ignores_insertion_order() {
    let mut entries = all_entries();
    let expected: Vec<u32> = entries.iter().map(|e| e.3).collect();
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..8 {
        entries.shuffle(&mut rng);
        let store = BinnedStore::natural_order();
        for &(dynamism, urgency, scale, value) in &entries {
            store.put(dynamism, urgency, scale, value).unwrap();
        }
        assert_eq!(store.to_vec(), expected);
        assert_eq!(store.into_iter().collect::<Vec<_>>(), expected);
    }
}

#[test]
fn keys_are_listed_in_iteration_order() {
    let store = BinnedStore::natural_order();
    store.put(0.8, 5, 1.0, 1_u32).unwrap();
    store.put(0.2, 20, 1.0, 2).unwrap();
    store.put(0.2, 5, 5.0, 3).unwrap();
    store.put(0.2, 5, 1.0, 4).unwrap();

    assert_eq!(
        store.keys(),
        [
            BinKey::new(0.2, 5, 1.0),
            BinKey::new(0.2, 5, 5.0),
            BinKey::new(0.2, 20, 1.0),
            BinKey::new(0.8, 5, 1.0),
        ]
    );
    assert_eq!(store.to_vec(), [4, 3, 2, 1]);

    let mut walked = Vec::new();
    store.for_each(|key, value| walked.push((*key, *value)));
    assert_eq!(walked[0], (BinKey::new(0.2, 5, 1.0), 4));
    assert_eq!(walked[3], (BinKey::new(0.8, 5, 1.0), 1));
    assert_eq!(store.bins().len(), 4);
}

#[test]
fn injected_comparator_orders_bins() {
    let store = BinnedStore::ordered_by(|a: &u32, b: &u32| b.cmp(a));
    for value in [2, 9, 4] {
        store.put(0.5, 5, 1.0, value).unwrap();
    }
    assert_eq!(store.get(0.5, 5, 1.0), [9, 4, 2]);
    assert!(store.contains_entry(0.5, 5, 1.0, &4));
}

#[test]
fn comparator_equality_defines_bin_membership() {
    // Compares only the tens digit, so 11 and 12 collide in a bin.
    let store = BinnedStore::ordered_by(|a: &u32, b: &u32| (a / 10).cmp(&(b / 10)));
    assert!(store.put(0.5, 5, 1.0, 11).unwrap());
    assert!(!store.put(0.5, 5, 1.0, 12).unwrap());

    assert_eq!(store.get(0.5, 5, 1.0), [11]);
    assert!(store.contains_entry(0.5, 5, 1.0, &19));
    assert_eq!(store.size(), 2);
}

#[test]
fn stores_compare_by_iteration_sequence() {
    let a = BinnedStore::natural_order();
    let b = BinnedStore::natural_order();
    assert_eq!(a, b);

    a.put(0.2, 5, 1.0, 1_u32).unwrap();
    a.put(0.5, 5, 1.0, 2).unwrap();
    b.put(0.5, 5, 1.0, 2).unwrap();
    assert_ne!(a, b);

    b.put(0.2, 5, 1.0, 1).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, a);

    // Same sequence under different keys still compares equal.
    let c = BinnedStore::natural_order();
    c.put(0.1, 1, 1.0, 1_u32).unwrap();
    c.put(0.1, 1, 1.0, 2).unwrap();
    assert_eq!(a, c);
    assert_eq!(format!("{a:?}"), "[1, 2]");
}

#[test]
fn duplicates_allowed_by_default() {
    let store = BinnedStore::natural_order();
    assert_eq!(store.duplicate_policy(), DuplicatePolicy::Allow);
    store.put(0.5, 5, 1.0, 1_u32).unwrap();
    assert_eq!(store.put(0.5, 5, 1.0, 1), Ok(false));
}

#[test]
fn reject_in_bin_names_key_and_value() {
    let store = BinnedStore::natural_order().with_duplicate_policy(DuplicatePolicy::RejectInBin);
    store.put(0.5, 5, 1.0, 7_u32).unwrap();
    // Same value, different bin, is fine.
    store.put(0.2, 5, 1.0, 7).unwrap();

    let err = store.put(0.5, 5, 1.0, 7).unwrap_err();
    assert_eq!(
        err,
        Error::DuplicateValue {
            key: BinKey::new(0.5, 5, 1.0),
            value: "7".to_string(),
        }
    );
    assert_eq!(err.to_string(), "at (0.5, 5, 1) value 7 already exists");
    assert_eq!(store.bin_len(0.5, 5, 1.0), 1);
}

#[test]
fn reject_global_refuses_value_under_any_key() {
    let store = BinnedStore::natural_order().with_duplicate_policy(DuplicatePolicy::RejectGlobal);
    store.put(0.5, 5, 1.0, 7_u32).unwrap();

    assert!(matches!(
        store.put(0.2, 20, 5.0, 7),
        Err(Error::DuplicateValue { .. })
    ));
    assert!(store.get(0.2, 20, 5.0).is_empty());
    assert!(store.put(0.2, 20, 5.0, 8).unwrap());
}

#[test]
fn concurrent_puts_into_one_bin_are_not_lost() {
    const THREADS: u32 = 16;
    const PER_THREAD: u32 = 500;

    let store = Arc::new(BinnedStore::natural_order());
    scope(|s| {
        for t in 0..THREADS {
            let store = Arc::clone(&store);
            s.spawn(move || {
                for i in 0..PER_THREAD {
                    store.put(0.5, 5, 1.0, t * PER_THREAD + i).unwrap();
                }
            });
        }
    });

    let values = store.get(0.5, 5, 1.0);
    assert_eq!(values.len(), (THREADS * PER_THREAD) as usize);
    assert_eq!(store.size(), (THREADS * PER_THREAD) as usize);
    assert!(values.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn concurrent_puts_across_bins_keep_every_path() {
    let store = BinnedStore::natural_order();
    let entries = all_entries();
    let workers = num_cpus::get().clamp(2, 8);

    scope(|s| {
        for chunk in entries.chunks(entries.len().div_ceil(workers)) {
            let store = &store;
            s.spawn(move || {
                for &(dynamism, urgency, scale, value) in chunk {
                    store.put(dynamism, urgency, scale, value).unwrap();
                }
            });
        }
        // Readers run alongside the writers and must only ever see whole
        // bins.
        s.spawn(|| {
            for _ in 0..100 {
                for key in store.keys() {
                    assert!(store.bin_len(key.dynamism, key.urgency, key.scale) > 0);
                }
            }
        });
    });

    assert_eq!(store.keys().len(), DYNAMISM.len() * URGENCY.len() * SCALE.len());
    assert_eq!(store.size(), entries.len());
}
