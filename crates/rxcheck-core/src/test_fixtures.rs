//! Small formulary shared by unit tests.

/// Seven drugs, one compound, three aliases and three dangerous pairs.
pub const FIXTURE: &str = r#"{
    "version": "fixture.1",
    "drugs": [
        {"name": "Ibuprofen", "source": "BNF", "contraindications": [
            {"condition": "hypertension", "severity": "caution", "message": "Monitor BP."},
            {"condition": "renal_impairment", "message": "Use with caution."},
            {"condition": "pregnancy", "message": "Avoid in third trimester."}
        ]},
        {"name": "Paracetamol", "source": "BNF", "contraindications": [
            {"condition": "liver_disease", "message": "Reduce dose."}
        ]},
        {"name": "Ibuprofen + Paracetamol", "components": ["ibuprofen", "paracetamol"]},
        {"name": "Warfarin"},
        {"name": "Aspirin"},
        {"name": "Fluoxetine"},
        {"name": "Phenelzine"}
    ],
    "aliases": {"Brufen": "ibuprofen", "Calpol": "paracetamol", "Combiflam": "ibuprofen + paracetamol"},
    "interactions": {
        "groups": {"ssri": ["fluoxetine"], "maoi": ["phenelzine"], "nsaid": ["ibuprofen", "aspirin"]},
        "pairs": [["warfarin", "aspirin"]],
        "class_rules": [
            {"left": "ssri", "right": "maoi"},
            {"left": "nsaid", "right": ["warfarin"]}
        ]
    },
    "condition_guidance": {"pregnancy": ["Paracetamol - safe at usual doses"]}
}"#;
