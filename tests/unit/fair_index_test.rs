//! Tests for the insertion-ordered key index

use keyed_work_queue::core::FairIndex;

#[test]
fn test_pop_front_follows_insertion_order() {
    let mut index = FairIndex::new();
    index.push_back("f1", 1);
    index.push_back("f3", 3);
    index.push_back("f2", 2);

    let order: Vec<_> = std::iter::from_fn(|| index.pop_front()).collect();
    assert_eq!(order, vec![("f1", 1), ("f3", 3), ("f2", 2)]);
    assert!(index.is_empty());
}

#[test]
fn test_rotation_serves_keys_round_robin() {
    let mut index = FairIndex::new();
    for key in 0..3 {
        index.push_back(key, 0_u32);
    }

    let mut served = Vec::new();
    for _ in 0..7 {
        let (key, count) = index.pop_front().unwrap();
        served.push(key);
        index.push_back(key, count + 1);
    }
    assert_eq!(served, vec![0, 1, 2, 0, 1, 2, 0]);
    assert_eq!(index.len(), 3);
}

#[test]
fn test_reuses_slots_after_pop() {
    let mut index = FairIndex::new();
    for round in 0..100 {
        index.push_back(round, ());
        index.push_back(round + 1000, ());
        assert_eq!(index.pop_front(), Some((round, ())));
        assert_eq!(index.pop_front(), Some((round + 1000, ())));
    }
    assert!(index.is_empty());
    assert_eq!(index.len(), 0);
}

#[test]
fn test_get_mut_does_not_reorder() {
    let mut index = FairIndex::new();
    index.push_back('a', vec![1]);
    index.push_back('b', vec![2]);
    index.get_mut(&'a').unwrap().push(3);

    assert_eq!(index.pop_front(), Some(('a', vec![1, 3])));
    assert_eq!(index.pop_front(), Some(('b', vec![2])));
}
