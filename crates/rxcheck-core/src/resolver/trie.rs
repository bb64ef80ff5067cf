//! Byte tries over normalized lookup keys.
//!
//! Both tries live in a flat node arena. Lookups walk at most one path per
//! query position, so their cost depends on the input, not the table size.

use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct Node {
    children: BTreeMap<u8, usize>,
    /// Key ending here (forward trie) or best key passing through (containment trie)
    value: Option<usize>,
}

#[derive(Debug)]
struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    fn child_or_insert(&mut self, node: usize, byte: u8) -> usize {
        if let Some(&child) = self.nodes[node].children.get(&byte) {
            return child;
        }
        let child = self.nodes.len();
        self.nodes.push(Node::default());
        self.nodes[node].children.insert(byte, child);
        child
    }

    fn child(&self, node: usize, byte: u8) -> Option<usize> {
        self.nodes[node].children.get(&byte).copied()
    }
}

/// Finds keys that occur in the input starting at a given offset.
#[derive(Debug)]
pub(crate) struct KeyTrie {
    arena: Arena,
    len: usize,
}

impl KeyTrie {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            len: 0,
        }
    }

    /// Insert `key`, replacing any earlier value for it.
    pub fn insert(&mut self, key: &str, value: usize) {
        let mut node = 0;
        for byte in key.bytes() {
            node = self.arena.child_or_insert(node, byte);
        }
        if self.arena.nodes[node].value.replace(value).is_none() {
            self.len += 1;
        }
    }

    /// Exact lookup.
    pub fn get(&self, key: &str) -> Option<usize> {
        let mut node = 0;
        for byte in key.bytes() {
            node = self.arena.child(node, byte)?;
        }
        self.arena.nodes[node].value
    }

    /// Every key that is a prefix of `input[start..]`, as `(key_len, value)`,
    /// shortest first.
    pub fn prefixes_at(&self, input: &str, start: usize) -> Vec<(usize, usize)> {
        let mut found = Vec::new();
        let mut node = 0;
        for (depth, byte) in input.as_bytes()[start..].iter().enumerate() {
            match self.arena.child(node, *byte) {
                Some(next) => node = next,
                None => break,
            }
            if let Some(value) = self.arena.nodes[node].value {
                found.push((depth + 1, value));
            }
        }
        found
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

/// Finds the preferred key that contains a fragment.
///
/// Every suffix of every key is inserted, so any substring of a key is a path
/// from the root. Each node remembers the smallest value that passed through
/// it; callers number keys in preference order.
#[derive(Debug)]
pub(crate) struct ContainmentTrie {
    arena: Arena,
}

impl ContainmentTrie {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
        }
    }

    pub fn insert(&mut self, key: &str, value: usize) {
        let bytes = key.as_bytes();
        for start in 0..bytes.len() {
            let mut node = 0;
            for &byte in &bytes[start..] {
                node = self.arena.child_or_insert(node, byte);
                let slot = &mut self.arena.nodes[node].value;
                if slot.map_or(true, |best| value < best) {
                    *slot = Some(value);
                }
            }
        }
    }

    /// Preferred key containing `fragment`.
    pub fn best_containing(&self, fragment: &str) -> Option<usize> {
        if fragment.is_empty() {
            return None;
        }
        let mut node = 0;
        for byte in fragment.bytes() {
            node = self.arena.child(node, byte)?;
        }
        self.arena.nodes[node].value
    }
}
