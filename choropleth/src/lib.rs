//! # choropleth
//!
//! Carte choroplèthe à partir d'un document KML et d'une table de métriques CSV.
//!
//! ## Features
//!
//! - État applicatif avec remplacement atomique des jeux de données
//! - Export GeoJSON stylé (simplestyle, popup)
//! - Rapport de jointure (features sans ligne, doublons, cellules invalides)
//! - Presets de style embarqués
//!
//! ## Usage CLI
//!
//! ```bash
//! # Carte GeoJSON colorée par le chiffre d'affaires
//! choropleth render --kml regions.kml --csv metrics.csv --output map.geojson
//!
//! # Bilan de jointure
//! choropleth report --kml regions.kml --csv metrics.csv --metric cost
//!
//! # Plage et légende d'une métrique
//! choropleth range --csv metrics.csv --steps 5
//! ```

pub mod config;
pub mod export;
pub mod report;
pub mod state;

pub use config::Config;
pub use report::{JoinReport, JoinStatus};
pub use state::{AppState, LoadedTable, Snapshot};
