//! Golden tests for drug name resolution.
//!
//! These tests verify match precedence against known test cases.

use rxcheck_core::config::{EngineOptions, FormularyConfig};
use rxcheck_core::resolver::{normalize, MatchMethod};
use rxcheck_core::RuleSet;

const FORMULARY: &str = r#"{
    "version": "golden.1",
    "drugs": [
        {"name": "Amoxicillin"},
        {"name": "Amoxicillin + Clavulanic Acid", "components": ["amoxicillin"]},
        {"name": "Paracetamol"},
        {"name": "Metformin"},
        {"name": "Insulin"},
        {"name": "Insulin Glargine", "components": ["insulin"]},
        {"name": "Atenolol"},
        {"name": "Telmisartan"}
    ],
    "aliases": {
        "Augmentin": "amoxicillin + clavulanic acid",
        "Amoxil": "amoxicillin",
        "Dolo": "paracetamol",
        "PCM": "paracetamol",
        "Glucophage": "metformin",
        "Aten": "atenolol",
        "Telma": "telmisartan"
    }
}"#;

/// Test case from golden file.
struct GoldenCase {
    id: &'static str,
    input: &'static str,
    expected_drug: Option<&'static str>,
    expected_method: Option<MatchMethod>,
}

fn get_golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "brand-with-strength",
            input: "Augmentin 625 Duo",
            expected_drug: Some("amoxicillin clavulanic acid"),
            expected_method: Some(MatchMethod::Alias),
        },
        GoldenCase {
            id: "hyphenated-brand",
            input: "Tab. Dolo-650",
            expected_drug: Some("paracetamol"),
            expected_method: Some(MatchMethod::Alias),
        },
        GoldenCase {
            id: "first-of-two-brands",
            input: "Dolo Aten",
            expected_drug: Some("paracetamol"),
            expected_method: Some(MatchMethod::Alias),
        },
        GoldenCase {
            id: "short-alias-whole-word",
            input: "PCM 500",
            expected_drug: Some("paracetamol"),
            expected_method: Some(MatchMethod::Alias),
        },
        GoldenCase {
            id: "short-alias-inside-word",
            input: "pcmx",
            expected_drug: None,
            expected_method: None,
        },
        GoldenCase {
            id: "brand-fragment",
            input: "amox",
            expected_drug: Some("amoxicillin"),
            expected_method: Some(MatchMethod::AliasFragment),
        },
        GoldenCase {
            id: "three-letter-fragment",
            input: "tel",
            expected_drug: Some("telmisartan"),
            expected_method: Some(MatchMethod::AliasFragment),
        },
        GoldenCase {
            id: "generic-with-dose",
            input: "Amoxicillin 500mg",
            expected_drug: Some("amoxicillin"),
            expected_method: Some(MatchMethod::Generic),
        },
        GoldenCase {
            id: "longest-generic-wins",
            input: "insulin glargine 10 units",
            expected_drug: Some("insulin glargine"),
            expected_method: Some(MatchMethod::Generic),
        },
        GoldenCase {
            id: "second-word-of-name",
            input: "glargine",
            expected_drug: Some("insulin glargine"),
            expected_method: Some(MatchMethod::Partial),
        },
        GoldenCase {
            id: "truncated-generic",
            input: "metfor",
            expected_drug: Some("metformin"),
            expected_method: Some(MatchMethod::Partial),
        },
        GoldenCase {
            id: "misspelled-generic",
            input: "paracetmol",
            expected_drug: Some("paracetamol"),
            expected_method: Some(MatchMethod::Fuzzy),
        },
        GoldenCase {
            id: "too-short",
            input: "xy",
            expected_drug: None,
            expected_method: None,
        },
        GoldenCase {
            id: "punctuation-only",
            input: " -- ",
            expected_drug: None,
            expected_method: None,
        },
    ]
}

fn rules(options: EngineOptions) -> RuleSet {
    let config = FormularyConfig::from_json(FORMULARY).expect("golden formulary parses");
    RuleSet::compile_with(&config, options).expect("golden formulary compiles")
}

#[test]
fn test_golden_resolutions() {
    let rules = rules(EngineOptions::default());

    for case in get_golden_cases() {
        let result = rules.resolver().resolve_detailed(case.input);
        assert_eq!(
            result.as_ref().map(|r| r.drug.as_str()),
            case.expected_drug,
            "Case {} failed: {:?} resolved to {:?}",
            case.id,
            case.input,
            result
        );
        assert_eq!(
            result.as_ref().map(|r| r.method),
            case.expected_method,
            "Case {} failed: wrong method",
            case.id
        );
    }
}

#[test]
fn test_resolution_is_case_and_spacing_insensitive() {
    let rules = rules(EngineOptions::default());

    let variants = vec![
        ("augmentin", "AUGMENTIN"),
        ("amoxicillin clavulanic acid", "Amoxicillin+Clavulanic  Acid"),
        ("insulin glargine", "  Insulin-Glargine "),
        ("telma", "Telma."),
    ];

    for (plain, decorated) in variants {
        assert_eq!(
            rules.resolver().resolve(plain),
            rules.resolver().resolve(decorated),
            "{} and {} should resolve alike",
            plain,
            decorated
        );
    }
}

#[test]
fn test_fuzzy_disabled_falls_through_to_none() {
    let rules = rules(EngineOptions::default().without_fuzzy());
    assert_eq!(rules.resolver().resolve("paracetmol"), None);
    assert_eq!(
        rules.resolver().resolve("paracetamol").as_ref().map(|id| id.as_str()),
        Some("paracetamol")
    );
}

#[test]
fn test_normalize_matches_ids() {
    let config = FormularyConfig::from_json(FORMULARY).unwrap();
    let rules = rules(EngineOptions::default());

    for drug in &config.drugs {
        let id = normalize(&drug.name);
        assert!(rules.catalog().contains(&id.as_str().into()), "{} missing", id);
    }
}
