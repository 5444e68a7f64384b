//! # geojoin
//!
//! Jointure de placemarks KML avec une table de métriques CSV, et
//! classification des features sur une échelle de couleurs linéaire.
//!
//! ## Features
//!
//! - Décodage tolérant (BOM, UTF-8 validé avec `simdutf8`, encodage déclaré, windows-1252)
//! - Parsing KML avec `roxmltree` : géométries `geo`, styles, ExtendedData
//! - Identifiant canonique par placemark (attribut `id`, puis nom, puis propriété)
//! - Parsing CSV avec `csv`, conversion numérique tolérante (`fast-float`)
//! - Échelle de couleurs linéaire par métrique, avec légende
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geojoin::{parse_document, parse_table, Metric, Presenter, RecordIndex, StyleDefaults};
//!
//! let collection = parse_document(&std::fs::read("regions.kml")?)?;
//! let table = parse_table(&std::fs::read("metrics.csv")?)?;
//! let index = RecordIndex::from_records(table.records);
//!
//! let presenter = Presenter::new(&index, Metric::Revenue, StyleDefaults::default());
//! for feature in &collection {
//!     let presentation = presenter.present(feature);
//!     println!("{:?} -> {}", feature.id, presentation.style.fill_color);
//! }
//! ```

pub mod classify;
pub mod decode;
pub mod error;
pub mod join;
pub mod parser;
pub mod present;
pub mod types;

pub use classify::{Color, ColorScale, LegendStop, MetricRange};
pub use error::{GeojoinError, ParseError};
pub use join::{JoinOutcome, JoinSummary};
pub use parser::table::{CoercionWarning, ParsedTable};
pub use present::{Presentation, Presenter, PopupContent, StyleDefaults, StyleRecord};
pub use types::{
    GeoCollection, GeoFeature, Metric, MetricRecord, Primitive, Properties, RecordIndex,
};

/// Parse un document KML brut (octets d'un fichier ou d'un upload).
///
/// # Errors
///
/// Retourne `ParseError::Malformed` si le XML est invalide, `ParseError::EmptyDocument`
/// s'il ne contient aucun placemark.
pub fn parse_document(data: &[u8]) -> Result<GeoCollection, ParseError> {
    let content = decode::decode_text(data);
    parser::kml::parse(&content)
}

/// Parse une table de métriques CSV brute.
///
/// # Errors
///
/// Retourne `ParseError::EmptyTable` ou `ParseError::MissingColumns`.
pub fn parse_table(data: &[u8]) -> Result<ParsedTable, ParseError> {
    let content = decode::decode_text(data);
    parser::table::parse(&content)
}
