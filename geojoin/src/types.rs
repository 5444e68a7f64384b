//! Types de données pour le crate geojoin

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use geo::Geometry;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::GeojoinError;

/// Clés de propriété portant le nom affiché d'une feature, par ordre de priorité
pub const NAME_KEYS: &[&str] = &["name", "Name"];

/// Clés de propriété pouvant porter un identifiant, par ordre de priorité
pub const ID_KEYS: &[&str] = &["id", "ID", "Id"];

/// Valeur primitive d'une propriété
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Primitive {
    Bool(bool),
    Number(f64),
    String(String),
}

impl Primitive {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Valeur numérique finie (les chaînes numériques sont acceptées)
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::String(s) => fast_float::parse(s.trim()).ok()?,
            Self::Bool(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Représentation texte utilisable comme identifiant.
    ///
    /// Les nombres entiers sont rendus sans partie décimale (`42`, pas `42.0`).
    /// Les booléens ne sont jamais des identifiants.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::String(s) => Some(Cow::Borrowed(s.as_str())),
            Self::Number(n) if n.is_finite() => Some(Cow::Owned(n.to_string())),
            _ => None,
        }
    }
}

impl From<&str> for Primitive {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Primitive {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for Primitive {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for Primitive {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Sac de propriétés d'une feature (ordonné pour un export déterministe)
pub type Properties = BTreeMap<String, Primitive>;

/// Une feature géographique issue d'un placemark
#[derive(Debug, Clone, Default)]
pub struct GeoFeature {
    /// Identifiant stable résolu (unique emplacement canonique)
    pub id: Option<String>,

    /// Géométrie en (longitude, latitude); absente si le placemark n'en a pas
    pub geometry: Option<Geometry>,

    /// Attributs de la feature
    pub properties: Properties,
}

impl GeoFeature {
    /// Nom affiché (`name`, puis `Name`)
    pub fn name(&self) -> Option<&str> {
        NAME_KEYS
            .iter()
            .find_map(|key| self.properties.get(*key).and_then(Primitive::as_str))
    }

    /// Valeur texte non vide d'une propriété
    pub fn property_text(&self, key: &str) -> Option<Cow<'_, str>> {
        self.properties
            .get(key)
            .and_then(Primitive::as_text)
            .filter(|text| !text.is_empty())
    }

    /// Identifiant déjà présent dans le sac de propriétés (`id`, `ID`, `Id`)
    pub fn property_id(&self) -> Option<Cow<'_, str>> {
        ID_KEYS.iter().find_map(|key| self.property_text(key))
    }
}

/// Collection ordonnée de features, une par placemark, dans l'ordre du document
#[derive(Debug, Clone, Default)]
pub struct GeoCollection {
    pub features: Vec<GeoFeature>,
}

impl GeoCollection {
    pub fn new(features: Vec<GeoFeature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GeoFeature> {
        self.features.iter()
    }

    /// Nombre de features portant un identifiant
    pub fn identified_count(&self) -> usize {
        self.features.iter().filter(|f| f.id.is_some()).count()
    }
}

impl<'a> IntoIterator for &'a GeoCollection {
    type Item = &'a GeoFeature;
    type IntoIter = std::slice::Iter<'a, GeoFeature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

/// Descripteur intermédiaire d'un placemark (extraction des identifiants)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacemarkDescriptor {
    /// Attribut `id` de l'élément
    pub id: Option<String>,

    /// Texte du fils `name`, trimé
    pub name: Option<String>,
}

/// Métrique numérique pilotant la coloration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Métrique principale
    #[default]
    Revenue,
    Cost,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Revenue, Metric::Cost];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::Cost => "cost",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = GeojoinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|metric| metric.as_str() == s)
            .ok_or_else(|| GeojoinError::UnknownMetric(s.to_string()))
    }
}

/// Ligne de la table de métriques
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    pub id: String,

    /// NaN si la cellule n'était pas numérique
    pub revenue: f64,

    /// NaN si la cellule n'était pas numérique
    pub cost: f64,
}

impl MetricRecord {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Revenue => self.revenue,
            Metric::Cost => self.cost,
        }
    }
}

/// Index identifiant -> enregistrement (la dernière ligne gagne)
#[derive(Debug, Clone, Default)]
pub struct RecordIndex {
    records: HashMap<String, MetricRecord>,

    /// Identifiants dans l'ordre de première apparition
    order: Vec<String>,

    /// Identifiants vus plusieurs fois
    duplicates: Vec<String>,
}

impl RecordIndex {
    /// Construit l'index; un identifiant dupliqué écrase la ligne précédente
    pub fn from_records(records: impl IntoIterator<Item = MetricRecord>) -> Self {
        let mut index = Self::default();
        let mut seen_twice = HashSet::new();

        for record in records {
            let id = record.id.clone();
            if index.records.insert(id.clone(), record).is_some() {
                if seen_twice.insert(id.clone()) {
                    warn!(id = %id, "Duplicate identifier in table, keeping the last row");
                    index.duplicates.push(id);
                }
            } else {
                index.order.push(id);
            }
        }

        index
    }

    pub fn get(&self, id: &str) -> Option<&MetricRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Identifiants connus, dans l'ordre de première apparition (sans l'id vide)
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order
            .iter()
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }

    /// Enregistrements retenus, dans l'ordre de première apparition
    pub fn records(&self) -> impl Iterator<Item = &MetricRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, revenue: f64, cost: f64) -> MetricRecord {
        MetricRecord {
            id: id.to_string(),
            revenue,
            cost,
        }
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("revenue".parse::<Metric>().unwrap(), Metric::Revenue);
        assert_eq!("cost".parse::<Metric>().unwrap(), Metric::Cost);
        assert!(matches!(
            "profit".parse::<Metric>(),
            Err(GeojoinError::UnknownMetric(name)) if name == "profit"
        ));
        assert!("Revenue".parse::<Metric>().is_err());
    }

    #[test]
    fn test_ids_skip_empty_id() {
        let index = RecordIndex::from_records(vec![
            record("", 1.0, 1.0),
            record("A", 2.0, 2.0),
        ]);
        assert_eq!(index.ids().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(index.records().count(), 2);
    }

    #[test]
    fn test_record_index_last_write_wins() {
        let index = RecordIndex::from_records(vec![
            record("A", 1.0, 2.0),
            record("B", 3.0, 4.0),
            record("A", 5.0, 6.0),
        ]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.get("A").unwrap().revenue, 5.0);
        assert_eq!(index.ids().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(index.duplicates(), &["A".to_string()]);
    }

    #[test]
    fn test_feature_name_variants() {
        let mut feature = GeoFeature::default();
        feature.properties.insert("Name".into(), "Upper".into());
        assert_eq!(feature.name(), Some("Upper"));

        feature.properties.insert("name".into(), "lower".into());
        assert_eq!(feature.name(), Some("lower"));
    }

    #[test]
    fn test_property_id_order_and_numbers() {
        let mut feature = GeoFeature::default();
        feature.properties.insert("Id".into(), "title".into());
        feature.properties.insert("ID".into(), Primitive::Number(42.0));
        assert_eq!(feature.property_id().as_deref(), Some("42"));

        feature.properties.insert("id".into(), "".into());
        // Une chaîne vide n'est pas un identifiant
        assert_eq!(feature.property_id().as_deref(), Some("42"));
    }

    #[test]
    fn test_primitive_as_f64() {
        assert_eq!(Primitive::Number(2.5).as_f64(), Some(2.5));
        assert_eq!(Primitive::from(" 4 ").as_f64(), Some(4.0));
        assert_eq!(Primitive::from("abc").as_f64(), None);
        assert_eq!(Primitive::Number(f64::NAN).as_f64(), None);
        assert_eq!(Primitive::Bool(true).as_f64(), None);
    }
}
