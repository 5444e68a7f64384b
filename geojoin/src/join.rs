//! Jointure feature -> enregistrement de métriques
//!
//! L'identifiant d'une feature est lu par une liste ordonnée de sources,
//! évaluées jusqu'à la première qui répond. La recherche dans l'index se fait
//! par égalité exacte, sans normalisation.

use std::borrow::Cow;
use std::collections::HashSet;

use serde::Serialize;

use crate::types::{GeoCollection, GeoFeature, MetricRecord, RecordIndex};

/// Source candidate d'identifiant pour une feature
pub type IdentifierSource = fn(&GeoFeature) -> Option<Cow<'_, str>>;

/// Sources d'identifiant, par ordre de priorité
pub const IDENTIFIER_SOURCES: &[IdentifierSource] = &[
    canonical_id,
    property_id_lower,
    property_id_upper,
    property_id_capitalized,
];

fn canonical_id(feature: &GeoFeature) -> Option<Cow<'_, str>> {
    feature
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .map(Cow::Borrowed)
}

fn property_id_lower(feature: &GeoFeature) -> Option<Cow<'_, str>> {
    feature.property_text("id")
}

fn property_id_upper(feature: &GeoFeature) -> Option<Cow<'_, str>> {
    feature.property_text("ID")
}

fn property_id_capitalized(feature: &GeoFeature) -> Option<Cow<'_, str>> {
    feature.property_text("Id")
}

/// Identifiant de jointure d'une feature (première source définie)
pub fn resolve_identifier(feature: &GeoFeature) -> Option<Cow<'_, str>> {
    IDENTIFIER_SOURCES.iter().find_map(|source| source(feature))
}

/// Enregistrement associé à une feature, s'il existe
pub fn resolve<'a>(feature: &GeoFeature, index: &'a RecordIndex) -> Option<&'a MetricRecord> {
    let id = resolve_identifier(feature)?;
    index.get(&id)
}

/// Résultat de jointure d'une feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinOutcome {
    /// Position de la feature dans la collection
    pub position: usize,
    pub name: Option<String>,
    pub resolved_id: Option<String>,
    pub matched: bool,
}

/// Bilan de jointure d'une collection contre un index
#[derive(Debug, Clone, Default, Serialize)]
pub struct JoinSummary {
    pub outcomes: Vec<JoinOutcome>,

    /// Identifiants de la table jamais référencés par une feature
    pub unused_ids: Vec<String>,
}

impl JoinSummary {
    pub fn matched_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.matched).count()
    }

    pub fn unmatched(&self) -> impl Iterator<Item = &JoinOutcome> {
        self.outcomes.iter().filter(|o| !o.matched)
    }
}

/// Calcule la jointure de toutes les features
pub fn summarize(collection: &GeoCollection, index: &RecordIndex) -> JoinSummary {
    let mut used = HashSet::new();

    let outcomes = collection
        .iter()
        .enumerate()
        .map(|(position, feature)| {
            let resolved_id = resolve_identifier(feature).map(Cow::into_owned);
            let matched = resolved_id.as_deref().is_some_and(|id| index.contains(id));
            if matched {
                if let Some(ref id) = resolved_id {
                    used.insert(id.clone());
                }
            }
            JoinOutcome {
                position,
                name: feature.name().map(str::to_string),
                resolved_id,
                matched,
            }
        })
        .collect();

    let unused_ids = index
        .ids()
        .filter(|id| !used.contains(*id))
        .map(str::to_string)
        .collect();

    JoinSummary {
        outcomes,
        unused_ids,
    }
}
