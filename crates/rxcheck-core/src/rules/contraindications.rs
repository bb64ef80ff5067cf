//! Drug × condition contraindication rules.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::models::{Condition, ConditionWarning, DrugId, Severity, Warning};

/// One (drug, condition) advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContraindicationRule {
    pub drug: DrugId,
    pub condition: Condition,
    pub severity: Severity,
    pub message: String,
    pub source: String,
}

impl ContraindicationRule {
    /// Turn the rule into a warning shown under `display_name`.
    pub fn to_warning(&self, display_name: impl Into<String>) -> Warning {
        Warning::Condition(ConditionWarning {
            drug: self.drug.clone(),
            display_name: display_name.into(),
            condition: self.condition,
            severity: self.severity,
            message: self.message.clone(),
            source: self.source.clone(),
        })
    }
}

/// Read-only contraindication table.
///
/// Rules keep the order they were declared in for each drug, and a
/// (drug, condition) pair appears at most once.
#[derive(Debug, Clone, Default)]
pub struct ContraindicationRules {
    by_drug: HashMap<DrugId, Vec<ContraindicationRule>>,
    len: usize,
}

impl ContraindicationRules {
    /// Add a rule; returns false if the drug already has one for the condition.
    pub(crate) fn insert(&mut self, rule: ContraindicationRule) -> bool {
        let rules = self.by_drug.entry(rule.drug.clone()).or_default();
        if rules.iter().any(|r| r.condition == rule.condition) {
            return false;
        }
        rules.push(rule);
        self.len += 1;
        true
    }

    /// All rules for a drug in declared order; empty if none.
    pub fn contraindications_for(&self, drug: &DrugId) -> &[ContraindicationRule] {
        self.by_drug.get(drug).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rule_for(&self, drug: &DrugId, condition: Condition) -> Option<&ContraindicationRule> {
        self.contraindications_for(drug)
            .iter()
            .find(|r| r.condition == condition)
    }

    /// Rules of `drug` whose condition the patient has, in declared order.
    pub fn matching<'a>(
        &'a self,
        drug: &DrugId,
        conditions: &'a BTreeSet<Condition>,
    ) -> impl Iterator<Item = &'a ContraindicationRule> + 'a {
        self.contraindications_for(drug)
            .iter()
            .filter(move |r| conditions.contains(&r.condition))
    }

    /// One warning per matching rule, labelled with the canonical id.
    pub fn evaluate(&self, drug: &DrugId, conditions: &BTreeSet<Condition>) -> Vec<Warning> {
        self.matching(drug, conditions)
            .map(|r| r.to_warning(drug.as_str()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
