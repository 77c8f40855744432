//! Property-based tests using proptest
//!
//! These tests generate random sequences of operations, run them against both
//! the hollow heap and a plain model, and verify that the heap invariants are
//! maintained after every step.

use hollow_heap::{HeapError, HollowHeap, ItemHandle};
use proptest::prelude::*;

#[ctor::ctor]
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone)]
enum Op {
    Insert(i32),
    ExtractMin,
    /// Decrease the handle at `index % handles.len()` by `delta`
    DecreaseKey(usize, i32),
    Delete(usize),
    /// Merge in a heap built from these keys; `shared` selects a sibling heap
    Merge(Vec<i32>, bool),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (-1000i32..1000).prop_map(Op::Insert),
        2 => Just(Op::ExtractMin),
        3 => (any::<usize>(), 0i32..500).prop_map(|(i, d)| Op::DecreaseKey(i, d)),
        1 => any::<usize>().prop_map(Op::Delete),
        1 => (prop::collection::vec(-1000i32..1000, 0..10), any::<bool>())
            .prop_map(|(keys, shared)| Op::Merge(keys, shared)),
    ]
}

/// Every handle ever issued, with the key it should currently hold
/// (`None` once the item is gone)
struct Model {
    entries: Vec<(ItemHandle, Option<i32>)>,
}

impl Model {
    fn live_min(&self) -> Option<i32> {
        self.entries.iter().filter_map(|(_, key)| *key).min()
    }

    fn live_len(&self) -> usize {
        self.entries.iter().filter(|(_, key)| key.is_some()).count()
    }
}

fn run_ops(ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut heap: HollowHeap<i32> = HollowHeap::new();
    let mut model = Model { entries: Vec::new() };

    for op in ops {
        match op {
            Op::Insert(key) => {
                let handle = heap.insert(key);
                model.entries.push((handle, Some(key)));
            }
            Op::ExtractMin => {
                let expected = model.live_min();
                let result = heap.extract_min();
                match expected {
                    None => prop_assert_eq!(result, Err(HeapError::EmptyHeap)),
                    Some(min) => {
                        prop_assert_eq!(result, Ok(min));
                        // Ties may go either way; find the entry that left.
                        let gone: Vec<usize> = model
                            .entries
                            .iter()
                            .enumerate()
                            .filter(|(_, (h, key))| *key == Some(min) && !heap.contains(h))
                            .map(|(i, _)| i)
                            .collect();
                        prop_assert_eq!(gone.len(), 1);
                        model.entries[gone[0]].1 = None;
                    }
                }
            }
            Op::DecreaseKey(index, delta) => {
                if model.entries.is_empty() {
                    continue;
                }
                let index = index % model.entries.len();
                let (handle, key) = &mut model.entries[index];
                match *key {
                    Some(current) => {
                        let lowered = current - delta;
                        prop_assert_eq!(heap.decrease_key(handle, lowered), Ok(()));
                        *key = Some(lowered);
                    }
                    None => {
                        prop_assert_eq!(
                            heap.decrease_key(handle, i32::MIN),
                            Err(HeapError::InvalidHandle)
                        );
                    }
                }
            }
            Op::Delete(index) => {
                if model.entries.is_empty() {
                    continue;
                }
                let index = index % model.entries.len();
                let (handle, key) = &mut model.entries[index];
                match key.take() {
                    Some(current) => prop_assert_eq!(heap.delete_item(handle), Ok(current)),
                    None => {
                        prop_assert_eq!(heap.delete_item(handle), Err(HeapError::InvalidHandle))
                    }
                }
            }
            Op::Merge(keys, shared) => {
                let mut other = if shared {
                    heap.sibling()
                } else {
                    HollowHeap::new()
                };
                for key in keys {
                    let handle = other.insert(key);
                    model.entries.push((handle, Some(key)));
                }
                heap.merge(&mut other);
                prop_assert!(other.is_empty());
            }
        }

        prop_assert!(heap.verify_structure());
        prop_assert_eq!(heap.len(), model.live_len());
        prop_assert_eq!(heap.get_min().ok(), model.live_min());
    }

    // Every live handle still reports its key.
    for (handle, key) in &model.entries {
        match key {
            Some(key) => prop_assert_eq!(heap.value(handle), Ok(*key)),
            None => prop_assert!(!heap.contains(handle)),
        }
    }

    let mut expected: Vec<i32> = model.entries.iter().filter_map(|(_, key)| *key).collect();
    expected.sort_unstable();
    let mut drained = Vec::new();
    while let Ok(key) = heap.extract_min() {
        drained.push(key);
    }
    prop_assert_eq!(drained, expected);
    prop_assert_eq!(heap.node_count(), 0);

    Ok(())
}

/// Test that all popped elements are in non-decreasing order
fn test_pop_order_invariant(values: Vec<i32>) -> Result<(), TestCaseError> {
    let mut heap: HollowHeap<i32> = values.iter().copied().collect();

    let mut last = i32::MIN;
    let mut popped = 0;
    while let Ok(key) = heap.extract_min() {
        prop_assert!(key >= last, "Popped key {} is less than previous {}", key, last);
        last = key;
        popped += 1;
    }
    prop_assert_eq!(popped, values.len());

    Ok(())
}

/// Test decrease_key maintains the minimum and rejects increases
fn test_decrease_key_invariant(
    initial: Vec<i32>,
    changes: Vec<(usize, i32)>,
) -> Result<(), TestCaseError> {
    let mut heap: HollowHeap<i32> = HollowHeap::new();
    let handles: Vec<_> = initial.iter().map(|&key| heap.insert(key)).collect();
    let mut keys = initial;

    // Give the heap some depth before decreasing.
    let filler = heap.insert(i32::MIN);
    prop_assert_eq!(heap.extract_min(), Ok(i32::MIN));
    prop_assert!(!heap.contains(&filler));

    for (index, new_key) in changes {
        let index = index % handles.len();
        let result = heap.decrease_key(&handles[index], new_key);
        if new_key > keys[index] {
            prop_assert_eq!(result, Err(HeapError::KeyIncreased));
        } else {
            prop_assert_eq!(result, Ok(()));
            keys[index] = new_key;
        }
        prop_assert_eq!(heap.get_min().ok(), keys.iter().min().copied());
        prop_assert!(heap.verify_structure());
    }

    keys.sort_unstable();
    prop_assert_eq!(heap.into_sorted_vec(), keys);

    Ok(())
}

/// Test hollow nodes never outnumber what the operations could have created
fn test_node_count_bounded(values: Vec<i32>, decreases: usize) -> Result<(), TestCaseError> {
    let mut heap: HollowHeap<i32> = HollowHeap::new();
    let handles: Vec<_> = values.iter().map(|&key| heap.insert(key)).collect();

    for handle in handles.iter().take(decreases) {
        prop_assert!(heap.decrease_key(handle, i32::MIN).is_ok());
        prop_assert!(heap.node_count() <= values.len() + decreases);
    }

    // Delete-min only ever frees nodes.
    let mut previous = heap.node_count();
    while heap.extract_min().is_ok() {
        prop_assert!(heap.node_count() < previous);
        previous = heap.node_count();
    }
    prop_assert_eq!(heap.node_count(), 0);

    Ok(())
}

proptest! {
    #[test]
    fn test_hollow_random_ops(ops in prop::collection::vec(op_strategy(), 0..200)) {
        run_ops(ops)?;
    }

    #[test]
    fn test_hollow_pop_order_invariant(values in prop::collection::vec(-100i32..100, 0..200)) {
        test_pop_order_invariant(values)?;
    }

    #[test]
    fn test_hollow_decrease_key_invariant(
        initial in prop::collection::vec(-100i32..100, 1..60),
        changes in prop::collection::vec((any::<usize>(), -200i32..100), 0..40)
    ) {
        test_decrease_key_invariant(initial, changes)?;
    }

    #[test]
    fn test_hollow_node_count_bounded(
        values in prop::collection::vec(-100i32..100, 1..100),
        decreases in 0usize..100
    ) {
        test_node_count_bounded(values, decreases)?;
    }
}
