//! Proptest generators for property-based testing.

use std::collections::BTreeSet;

use proptest::prelude::*;
use rand::Rng;

use reconcile_core::Element;

/// Generate the text of one element.
pub fn element_text() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,12}".prop_map(String::from)
}

/// Generate one element.
pub fn element() -> impl Strategy<Value = Element> {
    element_text().prop_map(Element::new)
}

/// Generate up to `max_len` distinct element texts, sorted.
pub fn element_set(max_len: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(element_text(), 0..=max_len).prop_map(|s| s.into_iter().collect())
}

/// Two peers' views of a collection.
#[derive(Debug, Clone)]
pub struct SplitSets {
    pub shared: Vec<String>,
    pub only_a: Vec<String>,
    pub only_b: Vec<String>,
}

impl SplitSets {
    /// Everything peer A holds.
    pub fn a(&self) -> Vec<String> {
        self.shared.iter().chain(&self.only_a).cloned().collect()
    }

    /// Everything peer B holds.
    pub fn b(&self) -> Vec<String> {
        self.shared.iter().chain(&self.only_b).cloned().collect()
    }

    /// The sorted union of both views.
    pub fn union(&self) -> Vec<String> {
        let all: BTreeSet<String> = self.a().into_iter().chain(self.b()).collect();
        all.into_iter().collect()
    }
}

/// Generate disjoint shared / A-only / B-only partitions of a set.
pub fn split_sets(max_len: usize) -> impl Strategy<Value = SplitSets> {
    prop::collection::btree_set(element_text(), 0..=max_len)
        .prop_flat_map(|set| {
            let n = set.len();
            (Just(set), prop::collection::vec(0u8..3, n))
        })
        .prop_map(|(set, sides)| {
            let mut split = SplitSets {
                shared: Vec::new(),
                only_a: Vec::new(),
                only_b: Vec::new(),
            };
            for (text, side) in set.into_iter().zip(sides) {
                match side {
                    0 => split.shared.push(text),
                    1 => split.only_a.push(text),
                    _ => split.only_b.push(text),
                }
            }
            split
        })
}

/// `count` random hex elements of `bytes` random bytes each.
///
/// For load-style tests outside proptest.
pub fn random_elements(count: usize, bytes: usize) -> Vec<Element> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let raw: Vec<u8> = (0..bytes).map(|_| rng.gen()).collect();
            Element::new(hex::encode(raw))
        })
        .collect()
}
