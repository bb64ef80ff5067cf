//! Canonical drug identity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resolver::normalize;

/// Canonical identifier of a drug in the formulary.
///
/// Always stored in normalized form (see [`normalize`]), so two ids built from
/// "Amoxicillin + Clavulanic acid" and "amoxicillin clavulanic-acid" compare
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DrugId(String);

impl DrugId {
    /// Build an id from any spelling of a canonical name.
    pub fn new(name: &str) -> Self {
        Self(normalize(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DrugId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DrugId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for DrugId {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl From<DrugId> for String {
    fn from(id: DrugId) -> Self {
        id.0
    }
}

impl From<&str> for DrugId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_normalized() {
        let id = DrugId::new("  Amoxicillin + Clavulanic ACID ");
        assert_eq!(id.as_str(), "amoxicillin clavulanic acid");
        assert_eq!(id, DrugId::new("amoxicillin-clavulanic acid"));
    }

    #[test]
    fn test_serde_normalizes_on_read() {
        let id = DrugId::new("Warfarin");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"warfarin\"");

        let parsed: DrugId = serde_json::from_str("\"St. John's Wort\"").unwrap();
        assert_eq!(parsed.as_str(), "st john s wort");
    }
}
