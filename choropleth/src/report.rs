//! Rapport de jointure
//!
//! Ce module collecte le bilan d'une jointure document / table : features
//! sans ligne, identifiants inutilisés, doublons et cellules non numériques.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use geojoin::classify::MetricRange;
use geojoin::{CoercionWarning, GeoCollection, JoinSummary, Metric, RecordIndex};

use crate::state::LoadedTable;

/// Statut global de la jointure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JoinStatus {
    /// Toutes les features ont une ligne
    Complete,
    /// Une partie des features seulement a une ligne
    Partial,
    /// Aucune feature jointe
    NoMatch,
}

/// Feature sans ligne dans la table
#[derive(Debug, Clone, Serialize)]
pub struct UnmatchedFeature {
    /// Position dans le document
    pub position: usize,
    pub name: Option<String>,
    /// Identifiant résolu (absent de la table)
    pub resolved_id: Option<String>,
}

/// Rapport complet de jointure
#[derive(Debug, Clone, Serialize)]
pub struct JoinReport {
    pub metric: Metric,
    pub status: JoinStatus,

    /// Empreintes blake3 des fichiers sources
    pub document_fingerprint: Option<String>,
    pub table_fingerprint: Option<String>,

    // Compteurs globaux
    pub features: usize,
    pub identified: usize,
    pub matched: usize,
    pub rows: usize,
    pub distinct_ids: usize,

    /// Plage de la métrique sélectionnée
    pub range: Option<MetricRange>,

    pub unmatched: Vec<UnmatchedFeature>,
    /// Identifiants de la table jamais référencés
    pub unused_ids: Vec<String>,
    /// Identifiants présents plusieurs fois (la dernière ligne gagne)
    pub duplicates: Vec<String>,
    pub coercion_warnings: Vec<CoercionWarning>,
}

impl JoinReport {
    /// Construit le rapport pour une collection et une table chargée
    pub fn new(collection: &GeoCollection, table: &LoadedTable, metric: Metric) -> Self {
        let summary = geojoin::join::summarize(collection, &table.index);
        let mut report = Self::from_summary(&summary, &table.index, metric);
        report.features = collection.len();
        report.identified = collection.identified_count();
        report.rows = table.table.records.len();
        report.coercion_warnings = table.table.warnings.clone();
        report.finalize();
        report
    }

    fn from_summary(summary: &JoinSummary, index: &RecordIndex, metric: Metric) -> Self {
        Self {
            metric,
            status: JoinStatus::NoMatch,
            document_fingerprint: None,
            table_fingerprint: None,
            features: summary.outcomes.len(),
            identified: 0,
            matched: summary.matched_count(),
            rows: 0,
            distinct_ids: index.len(),
            range: geojoin::classify::compute_range(index.records(), metric),
            unmatched: summary
                .unmatched()
                .map(|outcome| UnmatchedFeature {
                    position: outcome.position,
                    name: outcome.name.clone(),
                    resolved_id: outcome.resolved_id.clone(),
                })
                .collect(),
            unused_ids: summary.unused_ids.clone(),
            duplicates: index.duplicates().to_vec(),
            coercion_warnings: Vec::new(),
        }
    }

    /// Ajoute les empreintes des fichiers sources
    pub fn with_fingerprints(mut self, document: &str, table: &str) -> Self {
        self.document_fingerprint = Some(document.to_string());
        self.table_fingerprint = Some(table.to_string());
        self
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        self.status = if self.matched == 0 {
            JoinStatus::NoMatch
        } else if self.matched < self.features {
            JoinStatus::Partial
        } else {
            JoinStatus::Complete
        };
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("JOIN REPORT - Metric {}", self.metric);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);

        println!("\n--- SUMMARY ---");
        println!(
            "Features: {} total, {} identified, {} matched",
            self.features, self.identified, self.matched
        );
        println!("Rows: {} read, {} distinct ids", self.rows, self.distinct_ids);
        match self.range {
            Some(range) => println!("Range: {} .. {}", range.min, range.max),
            None => println!("Range: none (no finite {} value)", self.metric),
        }

        if !self.unmatched.is_empty() {
            println!("\n--- UNMATCHED FEATURES ({}) ---", self.unmatched.len());
            for f in self.unmatched.iter().take(20) {
                println!(
                    "  #{} {} (id: {})",
                    f.position,
                    f.name.as_deref().unwrap_or("Unnamed"),
                    f.resolved_id.as_deref().unwrap_or("none")
                );
            }
            if self.unmatched.len() > 20 {
                println!("  ... and {} more", self.unmatched.len() - 20);
            }
        }

        if !self.unused_ids.is_empty() {
            println!("\n--- UNUSED IDS ({}) ---", self.unused_ids.len());
            println!("  {}", self.unused_ids.join(", "));
        }

        if !self.duplicates.is_empty() {
            println!("\n--- DUPLICATE IDS ({}) ---", self.duplicates.len());
            println!("  {}", self.duplicates.join(", "));
        }

        if !self.coercion_warnings.is_empty() {
            println!(
                "\n--- NON-NUMERIC CELLS ({}) ---",
                self.coercion_warnings.len()
            );
            for w in self.coercion_warnings.iter().take(10) {
                println!("  line {}: {} = {:?}", w.line, w.column, w.raw);
            }
            if self.coercion_warnings.len() > 10 {
                println!("  ... and {} more", self.coercion_warnings.len() - 10);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{}: {}/{} features matched, {} unused ids, {} duplicates",
            self.metric,
            self.matched,
            self.features,
            self.unused_ids.len(),
            self.duplicates.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(kml: &[u8], csv: &[u8]) -> (GeoCollection, LoadedTable) {
        (
            geojoin::parse_document(kml).unwrap(),
            LoadedTable::new(geojoin::parse_table(csv).unwrap()),
        )
    }

    const KML: &[u8] = br#"<kml><Document>
        <Placemark id="A"><name>Alpha</name></Placemark>
        <Placemark id="B"><name>Beta</name></Placemark>
        <Placemark><name>Gamma</name></Placemark>
    </Document></kml>"#;

    #[test]
    fn test_partial_report() {
        let (collection, table) = load(KML, b"id,revenue,cost\nA,1,2\nC,3,x\nA,5,6\n");
        let report = JoinReport::new(&collection, &table, Metric::Revenue);

        assert_eq!(report.status, JoinStatus::Partial);
        assert_eq!(report.features, 3);
        assert_eq!(report.identified, 2);
        assert_eq!(report.matched, 1);
        assert_eq!(report.rows, 3);
        assert_eq!(report.distinct_ids, 2);
        assert_eq!(report.duplicates, vec!["A".to_string()]);
        assert_eq!(report.unused_ids, vec!["C".to_string()]);
        assert_eq!(report.coercion_warnings.len(), 1);

        let names: Vec<_> = report
            .unmatched
            .iter()
            .map(|f| f.name.as_deref().unwrap())
            .collect();
        assert_eq!(names, vec!["Beta", "Gamma"]);

        // Plage sur l'index dédupliqué : A = 5, C = 3
        let range = report.range.unwrap();
        assert_eq!((range.min, range.max), (3.0, 5.0));
    }

    #[test]
    fn test_complete_and_no_match() {
        let (collection, table) = load(KML, b"id,revenue,cost\nA,1,1\nB,2,2\nGamma,3,3\n");
        let report = JoinReport::new(&collection, &table, Metric::Cost);
        // "Gamma" n'est pas un identifiant : seul le nom le porte
        assert_eq!(report.status, JoinStatus::Partial);

        let (collection, table) = load(
            br#"<kml><Placemark id="A"/><Placemark id="B"/></kml>"#,
            b"id,revenue,cost\nA,1,1\nB,2,2\n",
        );
        let report = JoinReport::new(&collection, &table, Metric::Cost);
        assert_eq!(report.status, JoinStatus::Complete);

        let (collection, table) = load(KML, b"id,revenue,cost\nZ,1,1\n");
        let report = JoinReport::new(&collection, &table, Metric::Cost);
        assert_eq!(report.status, JoinStatus::NoMatch);
    }

    #[test]
    fn test_summary_and_save() {
        let (collection, table) = load(KML, b"id,revenue,cost\nA,1,2\n");
        let report = JoinReport::new(&collection, &table, Metric::Revenue)
            .with_fingerprints("abc", "def");

        let summary = report.summary();
        assert!(summary.contains("revenue"));
        assert!(summary.contains("1/3 features matched"));

        let path = std::env::temp_dir().join("test_choropleth_report.json");
        report.save_to_file(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"status\": \"Partial\""));
        assert!(content.contains("\"document_fingerprint\": \"abc\""));
        std::fs::remove_file(path).ok();
    }
}
