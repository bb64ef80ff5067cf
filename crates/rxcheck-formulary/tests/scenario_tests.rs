//! End-to-end checks against the bundled formulary.

use anyhow::Result;
use rxcheck_core::config::{EngineOptions, InteractionReporting};
use rxcheck_core::models::{Condition, ConditionWarning, DrugId, MedicationEntry, PatientContext, Severity, Warning};
use rxcheck_core::report::PrescribingAdvisory;
use rxcheck_core::{Database, PrescriptionSession};

fn meds(names: &[&str]) -> Vec<MedicationEntry> {
    names.iter().map(|n| MedicationEntry::new(*n)).collect()
}

fn patient(conditions: &[Condition]) -> PatientContext {
    PatientContext::new(conditions.iter().copied())
}

fn only_condition(warnings: &[Warning]) -> &ConditionWarning {
    assert_eq!(warnings.len(), 1, "expected exactly one warning: {warnings:?}");
    match &warnings[0] {
        Warning::Condition(w) => w,
        other => panic!("expected a condition warning, got {other:?}"),
    }
}

#[test]
fn test_pregnancy_ibuprofen() -> Result<()> {
    let evaluator = rxcheck_formulary::evaluator()?;
    let warnings = evaluator.evaluate(&patient(&[Condition::Pregnancy]), &meds(&["Ibuprofen"]));

    let w = only_condition(&warnings);
    assert_eq!(w.drug, DrugId::new("ibuprofen"));
    assert_eq!(w.condition, Condition::Pregnancy);
    assert_eq!(w.severity, Severity::Contraindicated);
    assert_eq!(
        w.message,
        "Avoid in third trimester - risk of premature closure of ductus arteriosus."
    );
    Ok(())
}

#[test]
fn test_warfarin_aspirin_without_conditions() -> Result<()> {
    let evaluator = rxcheck_formulary::evaluator()?;
    let warnings = evaluator.evaluate(&PatientContext::default(), &meds(&["Warfarin", "Aspirin"]));

    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].is_interaction());
    assert_eq!(warnings[0].severity(), Severity::Contraindicated);
    assert_eq!(
        warnings[0].to_string(),
        "DANGEROUS DRUG INTERACTION DETECTED: Aspirin + Warfarin"
    );
    Ok(())
}

#[test]
fn test_route_words_raise_no_interaction() -> Result<()> {
    let evaluator = rxcheck_formulary::evaluator()?;
    let none = PatientContext::default();

    let clean = evaluator.evaluate(&none, &meds(&["Rifampicin", "Oral rehydration salts"]));
    assert!(clean.is_empty(), "unexpected warnings: {clean:?}");

    let real = evaluator.evaluate(&none, &meds(&["Rifampicin", "Oral contraceptive pill"]));
    assert_eq!(real.len(), 1);
    assert!(real[0].is_interaction());
    Ok(())
}

#[test]
fn test_paracetamol_hypertension_is_clean() -> Result<()> {
    let evaluator = rxcheck_formulary::evaluator()?;
    let warnings = evaluator.evaluate(
        &patient(&[Condition::Hypertension]),
        &meds(&["Paracetamol"]),
    );
    assert!(warnings.is_empty());
    Ok(())
}

#[test]
fn test_brand_name_matches_generic() -> Result<()> {
    let evaluator = rxcheck_formulary::evaluator()?;
    let conditions = patient(&[Condition::RenalImpairment]);

    let brand = evaluator.evaluate(&conditions, &meds(&["Brufen"]));
    let generic = evaluator.evaluate(&conditions, &meds(&["Ibuprofen"]));
    let (brand, generic) = (only_condition(&brand), only_condition(&generic));

    assert_eq!(brand.drug, generic.drug);
    assert_eq!(brand.condition, generic.condition);
    assert_eq!(brand.severity, generic.severity);
    assert_eq!(brand.message, generic.message);
    assert_eq!(brand.source, generic.source);
    assert_eq!(brand.display_name, "Brufen (ibuprofen)");
    Ok(())
}

#[test]
fn test_compound_product_checks_components() -> Result<()> {
    let evaluator = rxcheck_formulary::evaluator()?;
    let warnings = evaluator.evaluate(
        &patient(&[Condition::Hypertension]),
        &meds(&["Combiflam", "Warfarin"]),
    );

    assert_eq!(warnings.len(), 2);
    match &warnings[0] {
        Warning::Interaction(w) => {
            assert_eq!(w.drug_a, DrugId::new("ibuprofen"));
            assert_eq!(w.drug_b, DrugId::new("warfarin"));
            assert_eq!(w.display_a, "Combiflam (ibuprofen + paracetamol)");
        }
        other => panic!("expected interaction first, got {other:?}"),
    }
    match &warnings[1] {
        Warning::Condition(w) => {
            assert_eq!(w.drug, DrugId::new("ibuprofen"));
            assert_eq!(w.condition, Condition::Hypertension);
            assert_eq!(w.display_name, "Combiflam (ibuprofen + paracetamol)");
        }
        other => panic!("expected condition warning, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_unknown_names_produce_no_warnings() -> Result<()> {
    let evaluator = rxcheck_formulary::evaluator()?;
    let everything = patient(&Condition::ALL);
    let warnings = evaluator.evaluate(&everything, &meds(&["qwertyuiop", "cough syrup", ""]));
    assert!(warnings.is_empty());
    Ok(())
}

#[test]
fn test_all_pairs_reporting() -> Result<()> {
    let names = meds(&["Warfarin", "Aspirin", "Ibuprofen"]);
    let none = PatientContext::default();

    let first = rxcheck_formulary::evaluator()?.evaluate(&none, &names);
    assert_eq!(first.len(), 1);

    let options = EngineOptions {
        interaction_reporting: InteractionReporting::AllPairs,
        ..EngineOptions::default()
    };
    let all = rxcheck_formulary::evaluator_with(options)?.evaluate(&none, &names);
    assert!(all.len() >= 2);
    assert_eq!(all[0], first[0]);
    assert!(all.iter().all(Warning::is_interaction));
    Ok(())
}

#[test]
fn test_condition_order_follows_declaration() -> Result<()> {
    let evaluator = rxcheck_formulary::evaluator()?;
    let warnings = evaluator.evaluate(
        &patient(&[Condition::Pregnancy, Condition::Hypertension, Condition::RenalImpairment]),
        &meds(&["Ibuprofen"]),
    );

    let order: Vec<Condition> = warnings
        .iter()
        .filter_map(|w| match w {
            Warning::Condition(c) => Some(c.condition),
            Warning::Interaction(_) => None,
        })
        .collect();
    assert_eq!(
        order,
        vec![Condition::Hypertension, Condition::RenalImpairment, Condition::Pregnancy]
    );
    Ok(())
}

#[test]
fn test_pregnancy_advisory() -> Result<()> {
    let rules = rxcheck_formulary::rule_set()?;
    let advisory = PrescribingAdvisory::build(&rules, [Condition::Pregnancy]);

    let pregnancy = &advisory.conditions[0];
    assert!(pregnancy
        .contraindicated
        .iter()
        .any(|e| e.drug == DrugId::new("ibuprofen")));
    assert!(pregnancy
        .alternatives
        .iter()
        .any(|a| a == "Methyldopa - Safe antihypertensive"));

    let text = advisory.to_text();
    assert!(text.contains("1. PATIENT CONDITION: Pregnancy"));
    assert!(text.contains(&format!("Formulary version: {}", rules.version())));
    Ok(())
}

#[test]
fn test_session_with_bundled_data_is_audited() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("rxcheck.db");
    let evaluator = rxcheck_formulary::evaluator()?;

    {
        let mut db = Database::open(&path)?;
        let config = rxcheck_formulary::config()?;
        db.store_formulary(&config)?;
        db.activate_formulary(&config.version)?;
    }

    let mut session = PrescriptionSession::new("patient-7", patient(&[Condition::Asthma]));
    session.add_medication(MedicationEntry::new("Warfarin").with_dosage("5mg"))?;
    session.add_medication(MedicationEntry::new("Disprin"))?; // aspirin brand
    assert!(!session.evaluate(&evaluator)?.is_empty());
    session.acknowledge(Some("Cardiology advised".into()))?;
    let saved = session.save()?;

    let db = Database::open(&path)?;
    assert!(db.record_acknowledgement(&saved)?);
    let records = db.acknowledgements_for_patient("patient-7")?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].formulary_version, evaluator.rules().version());
    assert_eq!(
        db.active_formulary()?.map(|c| c.version),
        Some(evaluator.rules().version().to_string())
    );
    Ok(())
}
