//! Modules d'export

pub mod geojson;

pub use self::geojson::{export_to_geojson, to_feature_collection};
