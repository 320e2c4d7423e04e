use super::*;

use crate::arena::NodeId;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

type Model = BTreeMap<String, BTreeSet<u32>>;

fn validate_tree(t: &Trie<u32>) {
    let arena = t.arena();
    assert!(arena.root().character().is_none(), "root must not carry a character");
    assert!(arena.root().parent().is_none(), "root must not have a parent");

    let mut stack: Vec<NodeId> = vec![NodeId::ROOT];
    let mut reachable = 0usize;
    let mut entries = 0usize;
    while let Some(id) = stack.pop() {
        let node = &arena[id];
        reachable += 1;
        entries += node.identifiers().len();

        if id != NodeId::ROOT {
            assert!(!node.is_dead(), "dead node {id:?} survived pruning");
        }
        assert!(
            node.identifiers().windows(2).all(|w| w[0] < w[1]),
            "identifiers must be sorted and unique"
        );
        assert!(
            node.children().windows(2).all(|w| w[0].0 < w[1].0),
            "children must be sorted by character and unique"
        );

        for &(ch, child_id) in node.children() {
            let child = &arena[child_id];
            assert_eq!(child.parent(), Some(id), "child parent link must match");
            assert_eq!(child.character(), Some(ch), "child character must match edge");
            stack.push(child_id);
        }
    }

    assert_eq!(reachable, t.node_count(), "every live node must be reachable");
    assert_eq!(entries, t.len(), "entry count must match Trie::len");
}

fn expected_node_count(m: &Model) -> usize {
    let mut prefixes: BTreeSet<&str> = BTreeSet::new();
    for key in m.keys() {
        for (end, ch) in key.char_indices() {
            prefixes.insert(&key[..end + ch.len_utf8()]);
        }
    }
    prefixes.len() + 1
}

fn has_path(m: &Model, prefix: &str) -> bool {
    prefix.is_empty()
        || m
            .range(prefix.to_string()..)
            .next()
            .is_some_and(|(k, _)| k.starts_with(prefix))
}

fn expected_query(m: &Model, prefix: &str, limit: usize) -> Result<Vec<u32>> {
    if !has_path(m, prefix) {
        return Err(IndexError::KeyNotFound);
    }
    Ok(m.range(prefix.to_string()..)
        .take_while(|(k, _)| k.starts_with(prefix))
        .flat_map(|(_, ids)| ids.iter().copied())
        .take(limit)
        .collect())
}

fn model_insert(m: &mut Model, key: &str, id: u32) -> Result<()> {
    if key.is_empty() {
        return Err(IndexError::EmptyKey);
    }
    if m.entry(key.to_string()).or_default().insert(id) {
        Ok(())
    } else {
        Err(IndexError::DuplicateValue)
    }
}

fn model_delete(m: &mut Model, key: &str, id: u32) -> Result<()> {
    if key.is_empty() {
        return Err(IndexError::EmptyKey);
    }
    if !has_path(m, key) {
        return Err(IndexError::KeyNotFound);
    }
    let Some(ids) = m.get_mut(key) else {
        return Err(IndexError::ValueNotFound);
    };
    if !ids.remove(&id) {
        return Err(IndexError::ValueNotFound);
    }
    if ids.is_empty() {
        m.remove(key);
    }
    Ok(())
}

#[derive(Clone, Debug)]
enum Op {
    Insert(String, u32),
    Delete(String, u32),
    Query(String, usize),
}

fn key_strategy() -> impl Strategy<Value = String> + Clone {
    // A tiny alphabet keeps keys colliding and sharing prefixes.
    "[abcé]{0,6}"
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        50 => (key.clone(), 0u32..8).prop_map(|(k, v)| Op::Insert(k, v)),
        30 => (key.clone(), 0u32..8).prop_map(|(k, v)| Op::Delete(k, v)),
        20 => (key, 0usize..16).prop_map(|(k, n)| Op::Query(k, n)),
    ];
    prop::collection::vec(op, 0..=400)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut t: Trie<u32> = Trie::new();
        let mut m: Model = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, id) => {
                    prop_assert_eq!(t.insert(&key, id), model_insert(&mut m, &key, id));
                }
                Op::Delete(key, id) => {
                    prop_assert_eq!(t.delete(&key, &id), model_delete(&mut m, &key, id));
                }
                Op::Query(prefix, limit) => {
                    prop_assert_eq!(t.query(&prefix, limit), expected_query(&m, &prefix, limit));
                }
            }

            let entries: usize = m.values().map(BTreeSet::len).sum();
            prop_assert_eq!(t.len(), entries);
        }

        validate_tree(&t);
        prop_assert_eq!(t.node_count(), expected_node_count(&m));
        prop_assert_eq!(t.query("", usize::MAX), expected_query(&m, "", usize::MAX));
    }

    #[test]
    fn prop_larger_limit_extends_smaller(
        entries in prop::collection::vec((key_strategy(), 0u32..8), 0..=64),
        prefix in "[abc]{0,2}",
        small in 0usize..10,
        extra in 0usize..10,
    ) {
        let mut t: Trie<u32> = Trie::new();
        for (key, id) in entries {
            let _ = t.insert(&key, id);
        }
        if let (Ok(short), Ok(long)) = (t.query(&prefix, small), t.query(&prefix, small + extra)) {
            prop_assert!(short.len() <= small);
            prop_assert!(long.len() <= small + extra);
            prop_assert_eq!(&long[..short.len()], &short[..]);
        }
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

#[test]
fn exhaustive_insert_order_same_key() {
    let ids: Vec<u32> = vec![10, 20, 30, 40];
    for_each_permutation(&ids, |perm| {
        let mut t: Trie<u32> = Trie::new();
        for id in perm {
            t.insert("hello", id).unwrap();
        }
        validate_tree(&t);
        assert_eq!(t.query("hello", 4).unwrap(), vec![10, 20, 30, 40]);
    });
}

#[test]
fn exhaustive_insert_order_small_set() {
    let entries: Vec<(&str, u32)> = vec![
        ("a", 1),
        ("b", 2),
        ("aa", 3),
        ("ab", 4),
        ("ba", 5),
        ("a", 6),
    ];
    let expected: Vec<u32> = vec![1, 6, 3, 4, 2, 5];

    for_each_permutation(&entries, |perm| {
        let mut t: Trie<u32> = Trie::new();
        for (key, id) in perm {
            t.insert(key, id).unwrap();
        }
        validate_tree(&t);
        assert_eq!(t.query("", 10).unwrap(), expected);
    });
}

#[test]
fn exhaustive_delete_order_small_set() {
    let entries: Vec<(&str, u32)> = vec![
        ("a", 1),
        ("b", 2),
        ("aa", 3),
        ("ab", 4),
        ("ba", 5),
        ("abc", 6),
    ];

    // Insert in a fixed order, then delete in all permutations.
    let mut base: Trie<u32> = Trie::new();
    let mut base_model: Model = BTreeMap::new();
    for &(key, id) in &entries {
        base.insert(key, id).unwrap();
        model_insert(&mut base_model, key, id).unwrap();
    }

    for_each_permutation(&entries, |perm| {
        let mut t = base.clone();
        let mut m = base_model.clone();

        for (key, id) in perm {
            assert_eq!(t.delete(key, &id), model_delete(&mut m, key, id));
            validate_tree(&t);
            assert_eq!(t.node_count(), expected_node_count(&m));
            assert_eq!(t.query("", 10), expected_query(&m, "", 10));
        }
        assert!(t.is_empty());
        assert_eq!(t.node_count(), 1);
    });
}
