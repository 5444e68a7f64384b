//! Types d'erreurs pour le crate geojoin

use thiserror::Error;

/// Erreurs de parsing d'un upload (KML ou CSV)
///
/// Toutes ces erreurs sont terminales pour l'upload concerné : le jeu de
/// données précédemment chargé reste actif.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Document KML valide mais sans aucun placemark
    #[error("Document contains no placemark")]
    EmptyDocument,

    /// Document KML structurellement invalide
    #[error("Malformed document: {0}")]
    Malformed(String),

    /// Table sans ligne de données (en-tête seul ou texte vide)
    #[error("Table needs a header line and at least one data line")]
    EmptyTable,

    /// Colonnes obligatoires absentes de l'en-tête
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

impl ParseError {
    /// Crée une erreur de document mal formé
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed(reason.into())
    }
}

/// Erreurs du moteur de jointure
#[derive(Debug, Error)]
pub enum GeojoinError {
    /// Erreur de parsing d'un upload
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Métrique non supportée (erreur de configuration)
    #[error("Unknown metric: {0} (expected revenue or cost)")]
    UnknownMetric(String),
}
