//! Canonical drug catalog.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::DrugId;

/// A canonical drug as compiled from the formulary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrugInfo {
    pub id: DrugId,
    /// Name as declared, for display
    pub name: String,
    /// Constituents or family members the drug's rules also apply through
    pub components: Vec<DrugId>,
    pub source: Option<String>,
}

impl DrugInfo {
    /// The drug itself followed by its components.
    pub fn identities(&self) -> impl Iterator<Item = &DrugId> {
        std::iter::once(&self.id).chain(self.components.iter())
    }
}

/// Every canonical drug, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct DrugCatalog {
    drugs: Vec<DrugInfo>,
    index: HashMap<DrugId, usize>,
}

impl DrugCatalog {
    /// Append a drug; returns false if the id is already present.
    pub(crate) fn insert(&mut self, info: DrugInfo) -> bool {
        if self.index.contains_key(&info.id) {
            return false;
        }
        self.index.insert(info.id.clone(), self.drugs.len());
        self.drugs.push(info);
        true
    }

    pub(crate) fn get_mut(&mut self, id: &DrugId) -> Option<&mut DrugInfo> {
        let idx = *self.index.get(id)?;
        self.drugs.get_mut(idx)
    }

    pub fn get(&self, id: &DrugId) -> Option<&DrugInfo> {
        self.index.get(id).map(|&idx| &self.drugs[idx])
    }

    pub fn contains(&self, id: &DrugId) -> bool {
        self.index.contains_key(id)
    }

    /// Display name for an id; falls back to the id itself.
    pub fn display_name<'a>(&'a self, id: &'a DrugId) -> &'a str {
        self.get(id).map_or(id.as_str(), |info| info.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrugInfo> {
        self.drugs.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &DrugId> {
        self.drugs.iter().map(|info| &info.id)
    }

    pub fn len(&self) -> usize {
        self.drugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }
}
