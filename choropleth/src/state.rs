//! État de l'application : jeux de données actifs et métrique sélectionnée
//!
//! Chaque upload est parsé entièrement avant de remplacer le jeu actif. En cas
//! d'erreur, le jeu précédent (et son empreinte) reste en place. Les lecteurs
//! travaillent sur un `Snapshot` cohérent.

use std::sync::Arc;

use geojoin::{
    GeoCollection, GeojoinError, Metric, ParseError, ParsedTable, Presenter, RecordIndex,
    StyleDefaults,
};
use tracing::{info, warn};

/// Table chargée : lignes brutes + index dédupliqué
#[derive(Debug, Default)]
pub struct LoadedTable {
    pub table: ParsedTable,
    pub index: RecordIndex,
}

impl LoadedTable {
    pub fn new(table: ParsedTable) -> Self {
        let index = RecordIndex::from_records(table.records.iter().cloned());
        Self { table, index }
    }
}

/// Jeu de données actif et empreinte blake3 des octets sources
#[derive(Debug)]
pub struct Dataset<T> {
    pub data: Arc<T>,
    pub fingerprint: String,
}

impl<T> Clone for Dataset<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            fingerprint: self.fingerprint.clone(),
        }
    }
}

/// Vue cohérente de l'état pour un rendu
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub geo: Option<Dataset<GeoCollection>>,
    pub table: Option<Dataset<LoadedTable>>,
    pub metric: Metric,
}

impl Snapshot {
    /// Presenter sur la table active (table vide si aucune)
    pub fn presenter<'s>(
        &'s self,
        empty: &'s RecordIndex,
        defaults: StyleDefaults,
    ) -> Presenter<'s> {
        let index = self.table.as_ref().map_or(empty, |t| &t.data.index);
        Presenter::new(index, self.metric, defaults)
    }
}

/// État mutable à écrivain unique
#[derive(Debug, Default)]
pub struct AppState {
    geo: Option<Dataset<GeoCollection>>,
    table: Option<Dataset<LoadedTable>>,
    metric: Metric,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Charge un document KML; l'ancien reste actif en cas d'erreur
    pub fn load_geo(&mut self, bytes: &[u8]) -> Result<Arc<GeoCollection>, ParseError> {
        let fingerprint = fingerprint(bytes);
        let collection = geojoin::parse_document(bytes).inspect_err(|e| {
            warn!(error = %e, "KML upload rejected, keeping previous dataset");
        })?;

        info!(
            features = collection.len(),
            identified = collection.identified_count(),
            fingerprint = %short(&fingerprint),
            "KML dataset loaded"
        );

        let data = Arc::new(collection);
        self.geo = Some(Dataset {
            data: Arc::clone(&data),
            fingerprint,
        });
        Ok(data)
    }

    /// Charge une table CSV; réinitialise la métrique à `revenue`
    pub fn load_table(&mut self, bytes: &[u8]) -> Result<Arc<LoadedTable>, ParseError> {
        let fingerprint = fingerprint(bytes);
        let table = geojoin::parse_table(bytes).inspect_err(|e| {
            warn!(error = %e, "CSV upload rejected, keeping previous dataset");
        })?;

        let loaded = LoadedTable::new(table);
        info!(
            rows = loaded.table.records.len(),
            ids = loaded.index.len(),
            duplicates = loaded.index.duplicates().len(),
            coercion_failures = loaded.table.warnings.len(),
            fingerprint = %short(&fingerprint),
            "CSV dataset loaded"
        );

        let data = Arc::new(loaded);
        self.table = Some(Dataset {
            data: Arc::clone(&data),
            fingerprint,
        });
        self.metric = Metric::default();
        Ok(data)
    }

    pub fn select_metric(&mut self, metric: Metric) {
        self.metric = metric;
    }

    /// Sélection par nom (`revenue`, `cost`)
    pub fn select_metric_name(&mut self, name: &str) -> Result<Metric, GeojoinError> {
        let metric = name.parse()?;
        self.metric = metric;
        Ok(metric)
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn geo(&self) -> Option<&Dataset<GeoCollection>> {
        self.geo.as_ref()
    }

    pub fn table(&self) -> Option<&Dataset<LoadedTable>> {
        self.table.as_ref()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            geo: self.geo.clone(),
            table: self.table.clone(),
            metric: self.metric,
        }
    }
}

/// Empreinte blake3 (hex) des octets d'un upload
pub fn fingerprint(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}
