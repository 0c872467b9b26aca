//! Disease-entity taxonomy: static reference data consulted by enrichment,
//! reconciliation, and projection.
//!
//! The built-in table covers the granulomatous lung diseases of the
//! WHO-2022 thoracic classification the teaching module is scoped to.
//! Entities are open-ended reference data keyed by lowercase name, not a
//! closed enum; an alternate rule set can be loaded from JSON.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::Result;
use crate::models::{CaseType, Difficulty};

/// One histologic keyword pattern attached to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorphologicPattern {
    pub keyword: String,
    pub description: String,
}

/// Reference data for one disease entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyEntity {
    pub category: String,
    /// Ordered keyword patterns, most specific first.
    pub patterns: Vec<MorphologicPattern>,
    /// Cell types expected in the lesion.
    pub cells: Vec<String>,
    /// Default difficulty of a classic presentation.
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    /// Difficulty-independent teaching point.
    pub teaching_point: String,
    /// Narrative used as case context for generated cases.
    pub case_context: String,
}

/// The full taxonomy rule set, loaded once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Taxonomy {
    pub version: String,
    pub schema: String,
    entities: BTreeMap<String, TaxonomyEntity>,
    stain_roles: BTreeMap<String, String>,
    difficulty_levels: BTreeMap<Difficulty, String>,
    case_types: BTreeMap<CaseType, String>,
}

static BUILTIN: Lazy<Taxonomy> = Lazy::new(build_builtin);

impl Taxonomy {
    /// The built-in WHO-2022 thoracic rule set.
    pub fn builtin() -> &'static Taxonomy {
        &BUILTIN
    }

    /// Load an alternate rule set from its JSON representation.
    pub fn from_json(json: &str) -> Result<Taxonomy> {
        Ok(serde_json::from_str(json)?)
    }

    /// Look up an entity by name. Lookup is case-insensitive; taxonomy keys
    /// are stored lowercase.
    pub fn get(&self, entity: &str) -> Option<&TaxonomyEntity> {
        self.entities.get(&entity.to_lowercase())
    }

    /// Whether the entity name exists in this taxonomy.
    pub fn contains(&self, entity: &str) -> bool {
        self.get(entity).is_some()
    }

    /// All entity names, in stable (sorted) order. Fed verbatim into
    /// classifier prompts.
    pub fn entity_names(&self) -> Vec<String> {
        self.entities.keys().cloned().collect()
    }

    /// All difficulty level names, in ascending order of complexity.
    pub fn difficulty_names(&self) -> Vec<String> {
        self.difficulty_levels
            .keys()
            .map(|d| d.to_string())
            .collect()
    }

    /// Role description for a stain label, if known.
    pub fn stain_role(&self, stain: &str) -> Option<&str> {
        self.stain_roles.get(stain).map(String::as_str)
    }

    /// Description of a difficulty level.
    pub fn difficulty_description(&self, level: Difficulty) -> Option<&str> {
        self.difficulty_levels.get(&level).map(String::as_str)
    }

    /// Description of a case type.
    pub fn case_type_description(&self, case_type: CaseType) -> Option<&str> {
        self.case_types.get(&case_type).map(String::as_str)
    }

    /// Number of entities in the rule set.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

fn build_builtin() -> Taxonomy {
    let mut entities = BTreeMap::new();

    entities.insert(
        "tuberculosis".to_string(),
        TaxonomyEntity {
            category: "infectious".to_string(),
            patterns: patterns(&[
                ("caseous", "caseating necrosis"),
                ("langhans", "Langhans giant cells"),
            ]),
            cells: strings(&[
                "epithelioid histiocytes",
                "Langhans giant cells",
                "lymphocytes",
            ]),
            difficulty: Difficulty::Advanced,
            tags: strings(&["mycobacterial", "caseating", "necrosis"]),
            teaching_point: "Caseating granulomas with central necrosis suggest mycobacterial \
                             infection (e.g., TB)."
                .to_string(),
            case_context: "Tuberculosis typically shows caseating granulomas with Langhans giant \
                           cells. AFB staining may reveal acid-fast bacilli."
                .to_string(),
        },
    );

    entities.insert(
        "histoplasmosis".to_string(),
        TaxonomyEntity {
            category: "infectious".to_string(),
            patterns: patterns(&[("yeast", "intracellular yeast forms")]),
            cells: strings(&[
                "epithelioid histiocytes",
                "intracellular yeast",
                "macrophages",
            ]),
            difficulty: Difficulty::Advanced,
            tags: strings(&["fungal", "dimorphic", "yeast"]),
            teaching_point: "Small intracellular yeast forms with narrow-based budding are \
                             characteristic of histoplasmosis."
                .to_string(),
            case_context: "Histoplasmosis granulomas contain small yeast forms within \
                           macrophages. GMS or PAS staining highlights the organisms."
                .to_string(),
        },
    );

    entities.insert(
        "sarcoidosis".to_string(),
        TaxonomyEntity {
            category: "noninfectious".to_string(),
            patterns: patterns(&[("noncaseating", "noncaseating granulomas")]),
            cells: strings(&[
                "epithelioid histiocytes",
                "asteroid bodies (sometimes)",
                "lymphocytes",
            ]),
            difficulty: Difficulty::Intermediate,
            tags: strings(&["noncaseating", "systemic", "asteroid"]),
            teaching_point: "Noncaseating granulomas in the appropriate clinical setting support \
                             sarcoidosis."
                .to_string(),
            case_context: "Sarcoidosis features well-formed noncaseating granulomas. Asteroid \
                           bodies may be seen but are not specific."
                .to_string(),
        },
    );

    entities.insert(
        "hypersensitivity-pneumonitis".to_string(),
        TaxonomyEntity {
            category: "inhalational".to_string(),
            patterns: patterns(&[
                ("poorly-formed", "poorly-formed granulomas"),
                ("bronchiolocentric", "centered on bronchioles"),
            ]),
            cells: strings(&[
                "epithelioid histiocytes",
                "lymphocytes",
                "plasma cells",
                "giant cells",
            ]),
            difficulty: Difficulty::Intermediate,
            tags: strings(&["hp", "inhalational", "peribronchiolar"]),
            teaching_point: "Poorly-formed, bronchiolocentric granulomas with an interstitial \
                             lymphocytic infiltrate are classic for HP."
                .to_string(),
            case_context: "Hypersensitivity Pneumonitis shows a characteristic triad of cellular \
                           bronchiolitis, interstitial lymphoplasmacytic infiltrate, and \
                           poorly-formed granulomas."
                .to_string(),
        },
    );

    entities.insert(
        "rheumatoid".to_string(),
        TaxonomyEntity {
            category: "autoimmune".to_string(),
            patterns: patterns(&[("necrobiotic", "necrobiotic granulomas")]),
            cells: strings(&["histiocytes", "fibroblasts", "lymphocytes"]),
            difficulty: Difficulty::Intermediate,
            tags: strings(&["autoimmune", "necrobiotic", "rheumatoid"]),
            teaching_point: "Rheumatoid nodules show central necrobiotic material surrounded by \
                             palisading histiocytes."
                .to_string(),
            case_context: "Rheumatoid lung nodules demonstrate necrobiotic granulomas with a \
                           fibrinoid center and palisading histiocytes."
                .to_string(),
        },
    );

    let mut stain_roles = BTreeMap::new();
    for (stain, role) in [
        ("H&E", "general morphology"),
        ("GMS", "highlight fungal cell walls"),
        ("PAS", "highlight fungal cell walls and mucin"),
        ("AFB", "highlight mycobacterial organisms"),
        ("Polarized", "reveal polarizable foreign material"),
    ] {
        stain_roles.insert(stain.to_string(), role.to_string());
    }

    let mut difficulty_levels = BTreeMap::new();
    for (level, desc) in [
        (
            Difficulty::Beginner,
            "Classic presentations with obvious diagnostic features",
        ),
        (
            Difficulty::Intermediate,
            "Moderate diagnostic complexity, requires pattern recognition",
        ),
        (
            Difficulty::Advanced,
            "Subtle findings, mimics, or rare presentations",
        ),
    ] {
        difficulty_levels.insert(level, desc.to_string());
    }

    let mut case_types = BTreeMap::new();
    for (case_type, desc) in [
        (
            CaseType::Classic,
            "Classic textbook presentation of the disease",
        ),
        (CaseType::Atypical, "Unusual or variant presentation"),
        (CaseType::Mimic, "Presentation that mimics other conditions"),
        (
            CaseType::Complicated,
            "Case with additional complications or comorbidities",
        ),
    ] {
        case_types.insert(case_type, desc.to_string());
    }

    Taxonomy {
        version: defaults::TAXONOMY_VERSION.to_string(),
        schema: defaults::TAXONOMY_SCHEMA.to_string(),
        entities,
        stain_roles,
        difficulty_levels,
        case_types,
    }
}

fn patterns(pairs: &[(&str, &str)]) -> Vec<MorphologicPattern> {
    pairs
        .iter()
        .map(|(keyword, description)| MorphologicPattern {
            keyword: keyword.to_string(),
            description: description.to_string(),
        })
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
