use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeSet;

fn validate_trie<A: SegmentAlloc>(t: &RadixTrie<A>) {
    let issues = t.verify_integrity();
    assert!(issues.is_empty(), "integrity issues: {issues:?}\n{}", t.dump());
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    // A narrow alphabet makes shared prefixes, splits and fusions common.
    prop::collection::vec(prop_oneof![Just(b'a'), Just(b'b'), Just(b'c'), 1u8..=255], 0..=12)
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 40)]
    Insert(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 30)]
    Delete(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 15)]
    Lookup(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 10)]
    Match(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    /// Refuse every further allocation.
    #[proptest(weight = 3)]
    Squeeze,
    #[proptest(weight = 2)]
    Relax,
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(any::<Op>(), 0..=600)
}

fn model_matches(m: &BTreeSet<Vec<u8>>, prefix: &[u8]) -> bool {
    m.range(prefix.to_vec()..)
        .next()
        .is_some_and(|k| k.starts_with(prefix))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut t = RadixTrie::new_in(Budget::unlimited());
        let mut m: BTreeSet<Vec<u8>> = BTreeSet::new();

        for op in ops {
            match op {
                Op::Insert(key) => {
                    // Under a squeezed budget an insert may fail; it must then
                    // leave the set as it was.
                    match t.insert(&key) {
                        Ok(added) => prop_assert_eq!(added, m.insert(key)),
                        Err(TrieError::Alloc(_)) => prop_assert_eq!(t.lookup(&key), m.contains(&key)),
                        Err(err) => prop_assert!(false, "unexpected error {err}"),
                    }
                }
                Op::Delete(key) => {
                    let removal = t.delete(&key);
                    prop_assert_eq!(removal.was_removed(), m.remove(&key));
                }
                Op::Lookup(key) => {
                    prop_assert_eq!(t.lookup(&key), m.contains(&key));
                }
                Op::Match(key) => {
                    prop_assert_eq!(t.matches_prefix(&key), model_matches(&m, &key));
                }
                Op::Squeeze => {
                    let live = t.allocator().live();
                    t.allocator_mut().set_limit(live);
                }
                Op::Relax => t.allocator_mut().set_limit(usize::MAX),
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_trie(&t);
        let got: Vec<Vec<u8>> = t.iter().collect();
        let expected: Vec<Vec<u8>> = m.iter().cloned().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_heap_trie_stays_compressed(keys in prop::collection::vec(key_strategy(), 0..=200), drop_every in 1usize..=4) {
        let mut t = RadixTrie::new();
        let mut m: BTreeSet<Vec<u8>> = BTreeSet::new();
        for key in &keys {
            prop_assert_eq!(t.insert(key).unwrap(), m.insert(key.clone()));
        }
        for key in keys.iter().step_by(drop_every) {
            prop_assert_eq!(t.delete(key).was_removed(), m.remove(key));
            prop_assert_eq!(t.fragmentation(), 0);
        }
        validate_trie(&t);

        for key in &m {
            for end in 0..=key.len() {
                prop_assert!(t.matches_prefix(&key[..end]));
            }
        }
        let got: Vec<Vec<u8>> = t.iter().collect();
        let expected: Vec<Vec<u8>> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_foreach_agrees_with_iter(keys in prop::collection::vec(key_strategy(), 0..=100), cap in 0usize..=16) {
        let mut t = RadixTrie::new();
        t.try_extend(&keys).unwrap();

        let mut buf = vec![0u8; cap];
        let mut seen: Vec<Vec<u8>> = Vec::new();
        let done = t.foreach_in(&mut buf, |key| {
            seen.push(key.to_vec());
            ControlFlow::Continue(())
        });
        prop_assert_eq!(done, Traversal::Completed);

        let expected: Vec<Vec<u8>> = if cap == 0 {
            Vec::new()
        } else {
            t.iter().map(|mut k| { k.truncate(cap - 1); k }).collect()
        };
        prop_assert_eq!(seen, expected);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

fn small_set() -> Vec<Vec<u8>> {
    vec![
        b"a".to_vec(),
        b"b".to_vec(),
        b"".to_vec(),
        b"aa".to_vec(),
        b"ab".to_vec(),
        b"abc".to_vec(),
        b"ba".to_vec(),
    ]
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = small_set();
    let mut reference: Option<(String, usize)> = None;

    for_each_permutation(&keys, |perm| {
        let mut t = RadixTrie::new();
        for k in &perm {
            assert!(t.insert(k).unwrap());
        }
        validate_trie(&t);

        // Any order must produce the same structure.
        let shape = (t.dump(), t.node_count());
        match &reference {
            Some(expected) => assert_eq!(&shape, expected, "order {perm:?}"),
            None => reference = Some(shape),
        }

        let mut expected = keys.clone();
        expected.sort();
        let got: Vec<Vec<u8>> = t.iter().collect();
        assert_eq!(got, expected);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys = small_set();

    let mut base = RadixTrie::new();
    for k in &keys {
        base.insert(k).unwrap();
    }

    for_each_permutation(&keys, |perm| {
        let mut t = base.clone();
        let mut m: BTreeSet<Vec<u8>> = keys.iter().cloned().collect();

        for k in perm {
            assert_eq!(t.delete(&k), Removal::Removed);
            m.remove(&k);
            assert_eq!(t.len(), m.len());
            assert_eq!(t.fragmentation(), 0);
            validate_trie(&t);

            // The survivors must be laid out as if inserted from scratch.
            let mut fresh = RadixTrie::new();
            fresh.try_extend(&m).unwrap();
            assert_eq!(t.dump(), fresh.dump());
        }
        assert!(t.is_empty());
        assert_eq!(t.node_count(), 0);
    });
}

#[test]
fn exhaustive_fusion_failure_small_set() {
    let keys = small_set();

    for_each_permutation(&keys, |perm| {
        let mut t = RadixTrie::new_in(Budget::unlimited());
        t.try_extend(&keys).unwrap();
        let mut m: BTreeSet<Vec<u8>> = keys.iter().cloned().collect();

        // With a zero limit every fusion in this sequence fails.
        t.allocator_mut().set_limit(0);
        for k in perm {
            assert!(t.delete(&k).was_removed());
            m.remove(&k);
            validate_trie(&t);
            for probe in &keys {
                assert_eq!(t.lookup(probe), m.contains(probe));
                assert_eq!(t.matches_prefix(probe), model_matches(&m, probe));
            }
        }
        assert!(t.is_empty());
        assert_eq!(t.allocator().live(), 0);
    });
}
