use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;

/// Brute-force ranking: every stored term with the prefix, sorted by score
/// descending, then key ascending.
fn model_top<'a>(m: &'a BTreeMap<String, u32>, prefix: &str, k: usize) -> Vec<&'a str> {
    let mut hits: Vec<(&str, u32)> = m
        .iter()
        .filter(|(key, _)| key.starts_with(prefix))
        .map(|(key, score)| (key.as_str(), *score))
        .collect();
    hits.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    hits.into_iter().take(k).map(|(key, _)| key).collect()
}

fn assert_matches_model(t: &ScoredTrie<u32>, m: &BTreeMap<String, u32>) {
    t.check_invariants().unwrap();
    assert_eq!(t.len(), m.len());
    for (key, score) in m {
        assert_eq!(t.get(key), Some(score), "lost {key:?}");
    }

    let mut prefixes: Vec<&str> = vec![""];
    for key in m.keys() {
        for end in 1..=key.len() {
            prefixes.push(&key[..end]);
        }
    }
    for prefix in prefixes {
        assert_eq!(
            t.top_completions(prefix, usize::MAX),
            model_top(m, prefix, usize::MAX),
            "prefix {prefix:?}"
        );
    }
}

#[derive(Clone, Debug)]
enum Op {
    Set(String, u32),
    Query(String, usize),
}

fn key_strategy() -> impl Strategy<Value = String> + Clone {
    // A small alphabet forces long shared prefixes and deep lcp chains.
    "[a-c]{1,6}"
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        70 => (key.clone(), 0u32..40).prop_map(|(k, s)| Op::Set(k, s)),
        30 => ("[a-c]{0,4}", 0usize..12).prop_map(|(p, k)| Op::Query(p, k)),
    ];
    prop::collection::vec(op, 0..=400)
}

fn entries_strategy() -> impl Strategy<Value = Vec<(String, u32)>> {
    prop::collection::vec((key_strategy(), 0u32..20), 1..=60)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut t: ScoredTrie<u32> = ScoredTrie::new();
        let mut m: BTreeMap<String, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Set(key, score) => {
                    t.set(&key, score).unwrap();
                    m.insert(key, score);
                    prop_assert!(t.check_invariants().is_ok(), "{:?}", t.check_invariants());
                }
                Op::Query(prefix, k) => {
                    prop_assert_eq!(t.top_completions(&prefix, k), model_top(&m, &prefix, k));
                }
            }
            prop_assert_eq!(t.len(), m.len());
        }

        assert_matches_model(&t, &m);
    }

    #[test]
    fn prop_top_one_is_best_with_prefix(entries in entries_strategy(), prefix in "[a-c]{0,3}") {
        let t: ScoredTrie<u32> = entries.iter().map(|(k, s)| (k.as_str(), *s)).collect();
        let m: BTreeMap<String, u32> = entries.into_iter().collect();

        let best = model_top(&m, &prefix, 1);
        prop_assert_eq!(t.top_completions(&prefix, 1), best.clone());
        prop_assert_eq!(t.completions(&prefix).next().map(|(k, _)| k), best.first().copied());
    }

    #[test]
    fn prop_growing_k_extends_result(entries in entries_strategy(), prefix in "[a-c]{0,3}") {
        let t: ScoredTrie<u32> = entries.into_iter().collect();
        let mut previous: Vec<&str> = Vec::new();
        for k in 0..=t.len() + 1 {
            let current = t.top_completions(&prefix, k);
            prop_assert!(current.len() <= k);
            prop_assert_eq!(&current[..previous.len()], &previous[..]);
            previous = current;
        }
    }

    #[test]
    fn prop_repeated_set_is_idempotent(entries in entries_strategy(), pick in any::<prop::sample::Index>()) {
        let mut t: ScoredTrie<u32> = entries.iter().map(|(k, s)| (k.as_str(), *s)).collect();
        let (key, score) = entries[pick.index(entries.len())].clone();

        t.set(&key, score).unwrap();
        let once: Vec<(String, u32)> = t.iter().map(|(k, s)| (k.to_string(), *s)).collect();
        t.set(&key, score).unwrap();
        let twice: Vec<(String, u32)> = t.iter().map(|(k, s)| (k.to_string(), *s)).collect();

        prop_assert!(t.check_invariants().is_ok());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_insertion_order_does_not_matter(entries in entries_strategy()) {
        // Last write wins per key, so dedupe before shuffling.
        let m: BTreeMap<String, u32> = entries.into_iter().collect();
        let forward: ScoredTrie<u32> = m.iter().map(|(k, s)| (k.as_str(), *s)).collect();
        let backward: ScoredTrie<u32> = m.iter().rev().map(|(k, s)| (k.as_str(), *s)).collect();

        for prefix in ["", "a", "b", "ab", "ca"] {
            prop_assert_eq!(
                forward.top_completions(prefix, usize::MAX),
                backward.top_completions(prefix, usize::MAX)
            );
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
fn exhaustive_insert_order_small_set() {
    let entries: Vec<(&str, u32)> = vec![("a", 3), ("b", 5), ("ab", 7), ("aa", 1), ("abc", 4), ("ba", 6)];
    let m: BTreeMap<String, u32> = entries.iter().map(|&(k, s)| (k.to_string(), s)).collect();

    for_each_permutation(&entries, |perm| {
        let mut t: ScoredTrie<u32> = ScoredTrie::new();
        for (k, s) in perm {
            t.set(k, s).unwrap();
        }
        assert_matches_model(&t, &m);
    });
}

#[test]
fn exhaustive_update_order_small_set() {
    // Insert a fixed base, then rescore every key in every order: each rescore
    // flips a key between the top and the bottom of the ranking, driving both
    // the in-place rotation and the displacement paths.
    let base: Vec<(&str, u32)> = vec![("a", 10), ("ab", 8), ("abc", 6), ("b", 4), ("ac", 2), ("abd", 1)];
    let mut base_trie: ScoredTrie<u32> = ScoredTrie::new();
    let mut base_map: BTreeMap<String, u32> = BTreeMap::new();
    for &(k, s) in &base {
        base_trie.set(k, s).unwrap();
        base_map.insert(k.to_string(), s);
    }

    for_each_permutation(&base, |perm| {
        let mut t = base_trie.clone();
        let mut m = base_map.clone();
        for (k, s) in perm {
            let rescored = 11 - s;
            t.set(k, rescored).unwrap();
            m.insert(k.to_string(), rescored);
            assert_matches_model(&t, &m);
        }
    });
}
