//! Dangerous drug-pair rules.

use std::collections::HashSet;

use crate::config::InteractionReporting;
use crate::models::{DrugId, InteractionWarning, Warning};

/// An unordered pair of distinct drugs, stored sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(DrugId, DrugId);

impl PairKey {
    /// `None` for a drug paired with itself.
    pub fn new(a: &DrugId, b: &DrugId) -> Option<Self> {
        match a.cmp(b) {
            std::cmp::Ordering::Less => Some(Self(a.clone(), b.clone())),
            std::cmp::Ordering::Greater => Some(Self(b.clone(), a.clone())),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn first(&self) -> &DrugId {
        &self.0
    }

    pub fn second(&self) -> &DrugId {
        &self.1
    }
}

/// One medication as the pair scan sees it.
#[derive(Debug, Clone)]
pub struct ScanItem<'a> {
    pub display: &'a str,
    /// Rule identities: the resolved drug, then its components
    pub identities: Vec<&'a DrugId>,
}

/// Read-only set of dangerous pairs.
#[derive(Debug, Clone, Default)]
pub struct InteractionRules {
    pairs: HashSet<PairKey>,
}

impl InteractionRules {
    /// Add a pair; self-pairs are ignored. Returns true if the pair is new.
    pub(crate) fn insert(&mut self, a: &DrugId, b: &DrugId) -> bool {
        match PairKey::new(a, b) {
            Some(key) => self.pairs.insert(key),
            None => false,
        }
    }

    /// Symmetric membership test; never true for `a == b`.
    pub fn is_dangerous_pair(&self, a: &DrugId, b: &DrugId) -> bool {
        PairKey::new(a, b).is_some_and(|key| self.pairs.contains(&key))
    }

    /// Check every pair of distinct drugs in a resolved list.
    pub fn evaluate_list(&self, drugs: &[DrugId], reporting: InteractionReporting) -> Vec<Warning> {
        let items: Vec<ScanItem<'_>> = drugs
            .iter()
            .map(|drug| ScanItem {
                display: drug.as_str(),
                identities: vec![drug],
            })
            .collect();
        self.scan(&items, reporting)
    }

    /// Pair scan over medications in list order.
    ///
    /// Identities of one medication are never paired with each other. Each
    /// dangerous pair is reported once; with [`InteractionReporting::FirstMatch`]
    /// the scan stops at the first one.
    pub fn scan(&self, items: &[ScanItem<'_>], reporting: InteractionReporting) -> Vec<Warning> {
        let mut seen: HashSet<PairKey> = HashSet::new();
        let mut warnings = Vec::new();

        for (i, left) in items.iter().enumerate() {
            for right in &items[i + 1..] {
                for a in &left.identities {
                    for b in &right.identities {
                        let Some(key) = PairKey::new(a, b) else {
                            continue;
                        };
                        if !self.pairs.contains(&key) || !seen.insert(key.clone()) {
                            continue;
                        }

                        let (display_a, display_b) = if key.first() == *a {
                            (left.display, right.display)
                        } else {
                            (right.display, left.display)
                        };
                        warnings.push(Warning::Interaction(InteractionWarning {
                            drug_a: key.0,
                            drug_b: key.1,
                            display_a: display_a.to_string(),
                            display_b: display_b.to_string(),
                        }));

                        if reporting == InteractionReporting::FirstMatch {
                            return warnings;
                        }
                    }
                }
            }
        }

        warnings
    }

    /// All pairs in sorted order.
    pub fn pairs(&self) -> Vec<&PairKey> {
        let mut pairs: Vec<&PairKey> = self.pairs.iter().collect();
        pairs.sort();
        pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
