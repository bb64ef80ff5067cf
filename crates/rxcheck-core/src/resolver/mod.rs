//! Drug identity resolver.
//!
//! Maps free text (brand names, generics, abbreviations, dictation fragments,
//! misspellings) to at most one canonical [`DrugId`]. Passes run in a fixed
//! precedence order and the first pass with a hit decides:
//!
//! 1. [`MatchMethod::Alias`]: an alias key occurs in the input
//! 2. [`MatchMethod::AliasFragment`]: the input is a fragment of an alias key
//! 3. [`MatchMethod::Generic`]: a canonical name occurs in the input
//! 4. [`MatchMethod::Partial`]: an input word starts a word of a canonical name
//! 5. [`MatchMethod::Fuzzy`]: edit-distance match against aliases and names
//!
//! Within a pass, ties break on explicit rules (longest key, earliest position,
//! shortest name, lexicographic), never on table iteration order.

mod normalize;
mod trie;

pub use normalize::normalize;
pub(crate) use normalize::tokens;

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineOptions;
use crate::models::DrugId;
use trie::{ContainmentTrie, KeyTrie};

/// Which pass produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Alias,
    AliasFragment,
    Generic,
    Partial,
    Fuzzy,
}

/// A resolved name with provenance, for review screens and debugging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub drug: DrugId,
    pub method: MatchMethod,
    /// The alias key, canonical name or name token that matched
    pub matched: String,
}

/// Resolver tuning, taken from [`EngineOptions`].
#[derive(Debug, Clone)]
struct Thresholds {
    min_fragment_len: usize,
    min_partial_key_len: usize,
    fuzzy_matching: bool,
    fuzzy_threshold: f64,
    fuzzy_min_len: usize,
    filler_words: BTreeSet<String>,
}

/// Immutable lookup index over canonical names and aliases.
#[derive(Debug)]
pub struct DrugResolver {
    drugs: Vec<DrugId>,
    /// Sorted by (length, key), so an alias index is also its fragment rank
    alias_keys: Vec<String>,
    alias_targets: Vec<DrugId>,
    alias_index: KeyTrie,
    alias_fragments: ContainmentTrie,
    generic_index: KeyTrie,
    /// Word of a canonical name → drugs containing it
    name_words: BTreeMap<String, Vec<usize>>,
    thresholds: Thresholds,
}

impl DrugResolver {
    /// Build the index.
    ///
    /// `aliases` keys are normalized here; entries whose key is empty are
    /// ignored. Consistency between aliases and drugs is checked by
    /// [`crate::rules::RuleSet::compile`], not here.
    pub fn new<D, A, K>(drugs: D, aliases: A, options: &EngineOptions) -> Self
    where
        D: IntoIterator<Item = DrugId>,
        A: IntoIterator<Item = (K, DrugId)>,
        K: AsRef<str>,
    {
        let drugs: Vec<DrugId> = drugs.into_iter().collect();
        let filler_words: BTreeSet<String> = options
            .filler_words
            .iter()
            .map(|w| normalize(w))
            .filter(|w| !w.is_empty())
            .collect();

        let mut alias_entries: Vec<(String, DrugId)> = aliases
            .into_iter()
            .map(|(key, target)| (normalize(key.as_ref()), target))
            .filter(|(key, _)| !key.is_empty())
            .collect();
        alias_entries.sort_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| a.0.cmp(&b.0)));
        alias_entries.dedup_by(|a, b| a.0 == b.0);

        let mut alias_index = KeyTrie::new();
        let mut alias_fragments = ContainmentTrie::new();
        let mut alias_keys = Vec::with_capacity(alias_entries.len());
        let mut alias_targets = Vec::with_capacity(alias_entries.len());
        for (rank, (key, target)) in alias_entries.into_iter().enumerate() {
            alias_index.insert(&key, rank);
            alias_fragments.insert(&key, rank);
            alias_keys.push(key);
            alias_targets.push(target);
        }

        let mut generic_index = KeyTrie::new();
        let mut name_words: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, drug) in drugs.iter().enumerate() {
            generic_index.insert(drug.as_str(), idx);
            for (_, word) in tokens(drug.as_str()) {
                if filler_words.contains(word) {
                    continue;
                }
                let entry = name_words.entry(word.to_string()).or_default();
                if !entry.contains(&idx) {
                    entry.push(idx);
                }
            }
        }

        Self {
            drugs,
            alias_keys,
            alias_targets,
            alias_index,
            alias_fragments,
            generic_index,
            name_words,
            thresholds: Thresholds {
                min_fragment_len: options.min_fragment_len.max(1),
                min_partial_key_len: options.min_partial_key_len,
                fuzzy_matching: options.fuzzy_matching,
                fuzzy_threshold: options.fuzzy_threshold,
                fuzzy_min_len: options.fuzzy_min_len.max(1),
                filler_words,
            },
        }
    }

    /// Resolve a raw name to a canonical drug, or `None` if nothing matches.
    pub fn resolve(&self, raw: &str) -> Option<DrugId> {
        self.resolve_detailed(raw).map(|r| r.drug)
    }

    /// Resolve with the pass and key that matched.
    pub fn resolve_detailed(&self, raw: &str) -> Option<Resolution> {
        let input = normalize(raw);
        if input.is_empty() {
            return None;
        }

        let resolution = self
            .match_alias(&input)
            .or_else(|| self.match_alias_fragment(&input))
            .or_else(|| self.match_generic(&input))
            .or_else(|| self.match_partial(&input))
            .or_else(|| self.match_fuzzy(&input));

        match &resolution {
            Some(r) => debug!(method = ?r.method, matched = %r.matched, drug = %r.drug, "resolved drug name"),
            None => debug!(input_len = input.len(), "drug name unresolved"),
        }
        resolution
    }

    /// Number of canonical drugs indexed.
    pub fn drug_count(&self) -> usize {
        self.drugs.len()
    }

    /// Number of alias keys indexed.
    pub fn alias_count(&self) -> usize {
        self.alias_index.len()
    }

    /// The target of an alias key, matched exactly after normalization.
    pub fn alias_target(&self, alias: &str) -> Option<&DrugId> {
        self.alias_index
            .get(&normalize(alias))
            .map(|idx| &self.alias_targets[idx])
    }

    fn match_alias(&self, input: &str) -> Option<Resolution> {
        let idx = self.forward_match(&self.alias_index, input)?;
        Some(Resolution {
            drug: self.alias_targets[idx].clone(),
            method: MatchMethod::Alias,
            matched: self.alias_keys[idx].clone(),
        })
    }

    fn match_alias_fragment(&self, input: &str) -> Option<Resolution> {
        if input.len() < self.thresholds.min_fragment_len || self.is_filler(input) {
            return None;
        }
        let idx = self.alias_fragments.best_containing(input)?;
        Some(Resolution {
            drug: self.alias_targets[idx].clone(),
            method: MatchMethod::AliasFragment,
            matched: self.alias_keys[idx].clone(),
        })
    }

    fn match_generic(&self, input: &str) -> Option<Resolution> {
        let idx = self.forward_match(&self.generic_index, input)?;
        let drug = self.drugs[idx].clone();
        Some(Resolution {
            matched: drug.to_string(),
            drug,
            method: MatchMethod::Generic,
        })
    }

    fn match_partial(&self, input: &str) -> Option<Resolution> {
        for (_, word) in tokens(input) {
            if word.len() < self.thresholds.min_fragment_len || self.is_filler(word) {
                continue;
            }
            let best = self
                .name_words
                .range::<str, _>((Bound::Included(word), Bound::Unbounded))
                .take_while(|(name_word, _)| name_word.starts_with(word))
                .flat_map(|(_, ids)| ids.iter().copied())
                .min_by(|&a, &b| {
                    let (a, b) = (&self.drugs[a], &self.drugs[b]);
                    a.as_str().len().cmp(&b.as_str().len()).then_with(|| a.cmp(b))
                });
            if let Some(idx) = best {
                return Some(Resolution {
                    drug: self.drugs[idx].clone(),
                    method: MatchMethod::Partial,
                    matched: word.to_string(),
                });
            }
        }
        None
    }

    fn match_fuzzy(&self, input: &str) -> Option<Resolution> {
        if !self.thresholds.fuzzy_matching {
            return None;
        }
        let min_len = self.thresholds.fuzzy_min_len;

        let mut probes: Vec<&str> = Vec::new();
        if input.len() >= min_len {
            probes.push(input);
        }
        probes.extend(
            tokens(input)
                .map(|(_, word)| word)
                .filter(|word| word.len() >= min_len && *word != input),
        );
        if probes.is_empty() {
            return None;
        }

        let aliases = self
            .alias_keys
            .iter()
            .zip(self.alias_targets.iter())
            .map(|(key, target)| (key.as_str(), target));
        let names = self.drugs.iter().map(|drug| (drug.as_str(), drug));

        let mut best: Option<(f64, &str, &DrugId)> = None;
        for (key, target) in aliases.chain(names) {
            if key.len() < min_len {
                continue;
            }
            for probe in &probes {
                let score = similarity(probe, key);
                if score < self.thresholds.fuzzy_threshold {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((best_score, best_key, _)) => {
                        score > best_score || (score == best_score && key < best_key)
                    }
                };
                if better {
                    best = Some((score, key, target));
                }
            }
        }

        best.map(|(score, key, target)| {
            debug!(score, matched = %key, "fuzzy drug match");
            Resolution {
                drug: target.clone(),
                method: MatchMethod::Fuzzy,
                matched: key.to_string(),
            }
        })
    }

    fn is_filler(&self, word: &str) -> bool {
        self.thresholds.filler_words.contains(word)
    }

    /// Longest key occurring at a word start of `input`; ties go to the
    /// earliest position. Short keys must cover whole words.
    fn forward_match(&self, trie: &KeyTrie, input: &str) -> Option<usize> {
        let bytes = input.as_bytes();
        let mut best: Option<(usize, usize)> = None;

        for (start, _) in tokens(input) {
            for (len, value) in trie.prefixes_at(input, start) {
                let end = start + len;
                let ends_word = end == bytes.len() || bytes[end] == b' ';
                if len < self.thresholds.min_partial_key_len && !ends_word {
                    continue;
                }
                if best.map_or(true, |(best_len, _)| len > best_len) {
                    best = Some((len, value));
                }
            }
        }

        best.map(|(_, value)| value)
    }
}

/// Blend of Jaro-Winkler (rewards shared prefixes) and normalized
/// Levenshtein (penalizes length differences), in `[0, 1]`.
fn similarity(a: &str, b: &str) -> f64 {
    0.6 * strsim::jaro_winkler(a, b) + 0.4 * strsim::normalized_levenshtein(a, b)
}
