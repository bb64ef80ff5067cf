//! Compiled rule tables.
//!
//! [`RuleSet::compile`] turns a [`FormularyConfig`] into immutable lookup
//! structures and rejects anything ambiguous or contradictory up front:
//! duplicate drugs, aliases pointing at unknown or conflicting targets, rules
//! without a citation, self-interactions, and canonical names the resolver
//! would not map back to themselves.

mod catalog;
mod contraindications;
mod interactions;

pub use catalog::*;
pub use contraindications::*;
pub use interactions::*;

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use crate::config::{ConfigError, ConfigResult, EngineOptions, FormularyConfig, MemberSet};
use crate::models::{Condition, DrugId};
use crate::resolver::{normalize, DrugResolver};

/// Everything the evaluator reads, validated and indexed.
#[derive(Debug)]
pub struct RuleSet {
    version: String,
    fingerprint: String,
    catalog: DrugCatalog,
    contraindications: ContraindicationRules,
    interactions: InteractionRules,
    resolver: DrugResolver,
    guidance: BTreeMap<Condition, Vec<String>>,
    options: EngineOptions,
}

impl RuleSet {
    /// Compile with default engine options.
    pub fn compile(config: &FormularyConfig) -> ConfigResult<Self> {
        Self::compile_with(config, EngineOptions::default())
    }

    pub fn compile_with(config: &FormularyConfig, options: EngineOptions) -> ConfigResult<Self> {
        let catalog = build_catalog(config)?;
        let contraindications = build_contraindications(config, &catalog)?;
        let aliases = build_aliases(config, &catalog)?;
        let interactions = build_interactions(config, &catalog)?;

        let resolver = DrugResolver::new(catalog.ids().cloned(), aliases.clone(), &options);
        check_round_trips(&resolver, &catalog, &aliases)?;

        let rule_set = Self {
            version: config.version.clone(),
            fingerprint: config.fingerprint()?,
            catalog,
            contraindications,
            interactions,
            resolver,
            guidance: config.condition_guidance.clone(),
            options,
        };

        info!(
            version = %rule_set.version,
            drugs = rule_set.catalog.len(),
            aliases = rule_set.resolver.alias_count(),
            contraindications = rule_set.contraindications.len(),
            pairs = rule_set.interactions.len(),
            fingerprint = %rule_set.fingerprint,
            "compiled rule set"
        );
        Ok(rule_set)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// SHA-256 of the formulary this set was compiled from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn catalog(&self) -> &DrugCatalog {
        &self.catalog
    }

    pub fn contraindications(&self) -> &ContraindicationRules {
        &self.contraindications
    }

    pub fn interactions(&self) -> &InteractionRules {
        &self.interactions
    }

    pub fn resolver(&self) -> &DrugResolver {
        &self.resolver
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Safer-alternative notes for a condition; empty if none configured.
    pub fn guidance_for(&self, condition: Condition) -> &[String] {
        self.guidance
            .get(&condition)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn build_catalog(config: &FormularyConfig) -> ConfigResult<DrugCatalog> {
    let mut catalog = DrugCatalog::default();

    for entry in &config.drugs {
        let id = DrugId::new(&entry.name);
        if id.is_empty() {
            return Err(ConfigError::EmptyName("drug"));
        }
        let source = entry
            .source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let inserted = catalog.insert(DrugInfo {
            id: id.clone(),
            name: entry.name.trim().to_string(),
            components: Vec::new(),
            source,
        });
        if !inserted {
            return Err(ConfigError::DuplicateDrug(id.to_string()));
        }
    }

    // Components may reference drugs declared later, so resolve them second.
    for entry in &config.drugs {
        let id = DrugId::new(&entry.name);
        let mut components = Vec::new();
        for component in &entry.components {
            let component_id = DrugId::new(component);
            if !catalog.contains(&component_id) {
                return Err(ConfigError::UnknownDrug {
                    context: format!("components of {}", entry.name),
                    name: component.clone(),
                });
            }
            if component_id != id && !components.contains(&component_id) {
                components.push(component_id);
            }
        }
        if let Some(info) = catalog.get_mut(&id) {
            info.components = components;
        }
    }

    Ok(catalog)
}

fn build_contraindications(
    config: &FormularyConfig,
    catalog: &DrugCatalog,
) -> ConfigResult<ContraindicationRules> {
    let mut rules = ContraindicationRules::default();

    for entry in &config.drugs {
        if entry.contraindications.is_empty() {
            continue;
        }
        let id = DrugId::new(&entry.name);
        let source = catalog
            .get(&id)
            .and_then(|info| info.source.clone())
            .ok_or_else(|| ConfigError::MissingSource(entry.name.clone()))?;

        for rule in &entry.contraindications {
            if rule.severity.is_none() {
                debug!(drug = %id, condition = %rule.condition, "severity migrated from message text");
            }
            let inserted = rules.insert(ContraindicationRule {
                drug: id.clone(),
                condition: rule.condition,
                severity: rule.effective_severity(),
                message: rule.message.clone(),
                source: source.clone(),
            });
            if !inserted {
                return Err(ConfigError::DuplicateCondition {
                    drug: entry.name.clone(),
                    condition: rule.condition.to_string(),
                });
            }
        }
    }

    Ok(rules)
}

/// Normalized alias key → target, with redundant self-aliases dropped.
fn build_aliases(
    config: &FormularyConfig,
    catalog: &DrugCatalog,
) -> ConfigResult<Vec<(String, DrugId)>> {
    let mut seen: HashMap<String, DrugId> = HashMap::new();
    let mut aliases = Vec::new();

    for (raw, target) in &config.aliases {
        let key = normalize(raw);
        if key.is_empty() {
            return Err(ConfigError::EmptyName("alias"));
        }
        let target_id = DrugId::new(target);
        if !catalog.contains(&target_id) {
            return Err(ConfigError::UnknownDrug {
                context: format!("alias {raw}"),
                name: target.clone(),
            });
        }

        let key_id = DrugId::new(&key);
        if catalog.contains(&key_id) {
            if key_id != target_id {
                return Err(ConfigError::AliasShadowsDrug {
                    alias: raw.clone(),
                    target: target.clone(),
                });
            }
            continue;
        }

        match seen.get(&key) {
            Some(existing) if *existing != target_id => {
                return Err(ConfigError::ConflictingAlias {
                    alias: key,
                    first: existing.to_string(),
                    second: target_id.to_string(),
                });
            }
            Some(_) => continue,
            None => {
                seen.insert(key.clone(), target_id.clone());
                aliases.push((key, target_id));
            }
        }
    }

    Ok(aliases)
}

fn build_interactions(
    config: &FormularyConfig,
    catalog: &DrugCatalog,
) -> ConfigResult<InteractionRules> {
    let declared = &config.interactions;
    let mut rules = InteractionRules::default();

    let known = |name: &str, context: &str| -> ConfigResult<DrugId> {
        let id = DrugId::new(name);
        if catalog.contains(&id) {
            Ok(id)
        } else {
            Err(ConfigError::UnknownDrug {
                context: context.to_string(),
                name: name.to_string(),
            })
        }
    };

    let mut groups: HashMap<&str, Vec<DrugId>> = HashMap::new();
    for (group, members) in &declared.groups {
        let context = format!("group {group}");
        let ids = members
            .iter()
            .map(|m| known(m, &context))
            .collect::<ConfigResult<Vec<_>>>()?;
        groups.insert(group.as_str(), ids);
    }

    for (a, b) in &declared.pairs {
        let a_id = known(a, "interaction pair")?;
        let b_id = known(b, "interaction pair")?;
        if a_id == b_id {
            return Err(ConfigError::SelfInteraction(a_id.to_string()));
        }
        rules.insert(&a_id, &b_id);
    }

    let members = |set: &MemberSet| -> ConfigResult<Vec<DrugId>> {
        match set {
            MemberSet::Group(name) => groups
                .get(name.as_str())
                .cloned()
                .ok_or_else(|| ConfigError::UnknownGroup(name.clone())),
            MemberSet::Drugs(list) => list.iter().map(|d| known(d, "class rule")).collect(),
        }
    };

    for rule in &declared.class_rules {
        let left = members(&rule.left)?;
        let right = members(&rule.right)?;
        // A drug in both classes yields a self-pair, which insert() drops.
        for a in &left {
            for b in &right {
                rules.insert(a, b);
            }
        }
    }

    Ok(rules)
}

fn check_round_trips(
    resolver: &DrugResolver,
    catalog: &DrugCatalog,
    aliases: &[(String, DrugId)],
) -> ConfigResult<()> {
    let expectations = catalog
        .ids()
        .map(|id| (id.as_str(), id))
        .chain(aliases.iter().map(|(key, target)| (key.as_str(), target)));

    for (name, expected) in expectations {
        let resolved = resolver.resolve(name);
        if resolved.as_ref() != Some(expected) {
            return Err(ConfigError::Unresolvable {
                name: name.to_string(),
                expected: expected.to_string(),
                resolved: resolved.map(|id| id.to_string()),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use crate::test_fixtures::FIXTURE;

    fn fixture() -> FormularyConfig {
        FormularyConfig::from_json(FIXTURE).unwrap()
    }

    #[test]
    fn test_compile_fixture() {
        let rules = RuleSet::compile(&fixture()).unwrap();
        assert_eq!(rules.version(), "fixture.1");
        assert_eq!(rules.catalog().len(), 7);
        assert_eq!(rules.contraindications().len(), 4);
        // warfarin-aspirin is declared twice (pair and class); stored once
        assert_eq!(rules.interactions().len(), 3);
        assert_eq!(rules.guidance_for(Condition::Pregnancy).len(), 1);
        assert!(rules.guidance_for(Condition::Asthma).is_empty());
        assert_eq!(rules.fingerprint().len(), 64);

        let combo = rules
            .catalog()
            .get(&DrugId::new("ibuprofen paracetamol"))
            .unwrap();
        assert_eq!(combo.components.len(), 2);
    }

    #[test]
    fn test_severity_migrated_once() {
        let rules = RuleSet::compile(&fixture()).unwrap();
        let ibuprofen = DrugId::new("ibuprofen");
        let table = rules.contraindications();
        assert_eq!(
            table.rule_for(&ibuprofen, Condition::Pregnancy).unwrap().severity,
            Severity::Contraindicated
        );
        assert_eq!(
            table.rule_for(&ibuprofen, Condition::RenalImpairment).unwrap().severity,
            Severity::Caution
        );
    }

    #[test]
    fn test_duplicate_drug_rejected() {
        let mut config = fixture();
        let mut dup = config.drugs[3].clone();
        dup.name = "WARFARIN".into();
        config.drugs.push(dup);
        assert!(matches!(
            RuleSet::compile(&config),
            Err(ConfigError::DuplicateDrug(name)) if name == "warfarin"
        ));
    }

    #[test]
    fn test_duplicate_condition_rejected() {
        let mut config = fixture();
        let again = config.drugs[0].contraindications[0].clone();
        config.drugs[0].contraindications.push(again);
        assert!(matches!(
            RuleSet::compile(&config),
            Err(ConfigError::DuplicateCondition { .. })
        ));
    }

    #[test]
    fn test_missing_source_rejected() {
        let mut config = fixture();
        config.drugs[1].source = Some("  ".into());
        assert!(matches!(
            RuleSet::compile(&config),
            Err(ConfigError::MissingSource(name)) if name == "Paracetamol"
        ));
    }

    #[test]
    fn test_unknown_alias_target_rejected() {
        let mut config = fixture();
        config.aliases.insert("Nurofen".into(), "nurofenol".into());
        assert!(matches!(
            RuleSet::compile(&config),
            Err(ConfigError::UnknownDrug { .. })
        ));
    }

    #[test]
    fn test_conflicting_alias_rejected() {
        let mut config = fixture();
        config.aliases.insert("brufen!".into(), "paracetamol".into());
        assert!(matches!(
            RuleSet::compile(&config),
            Err(ConfigError::ConflictingAlias { .. })
        ));
    }

    #[test]
    fn test_alias_shadowing_drug_rejected() {
        let mut config = fixture();
        config.aliases.insert("Aspirin".into(), "warfarin".into());
        assert!(matches!(
            RuleSet::compile(&config),
            Err(ConfigError::AliasShadowsDrug { .. })
        ));
    }

    #[test]
    fn test_self_alias_is_ignored() {
        let mut config = fixture();
        config.aliases.insert("Aspirin".into(), "aspirin".into());
        let rules = RuleSet::compile(&config).unwrap();
        assert_eq!(rules.resolver().alias_count(), 3);
    }

    #[test]
    fn test_self_interaction_rejected() {
        let mut config = fixture();
        config
            .interactions
            .pairs
            .push(("warfarin".into(), "Warfarin".into()));
        assert!(matches!(
            RuleSet::compile(&config),
            Err(ConfigError::SelfInteraction(_))
        ));
    }

    #[test]
    fn test_unknown_group_rejected() {
        let mut config = fixture();
        config.interactions.class_rules.push(crate::config::ClassRule {
            left: MemberSet::Group("triptan".into()),
            right: MemberSet::Group("ssri".into()),
        });
        assert!(matches!(
            RuleSet::compile(&config),
            Err(ConfigError::UnknownGroup(name)) if name == "triptan"
        ));
    }

    #[test]
    fn test_unresolvable_canonical_rejected() {
        let mut config = fixture();
        config.drugs.push(crate::config::DrugEntry {
            name: "Calpol Extra".into(),
            source: None,
            components: vec![],
            contraindications: vec![],
        });
        // "calpol extra" contains alias "calpol" → paracetamol
        assert!(matches!(
            RuleSet::compile(&config),
            Err(ConfigError::Unresolvable { name, .. }) if name == "calpol extra"
        ));
    }
}
